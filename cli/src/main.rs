//! `loader-cli`: drives [`loader_core::Loader`] against a real project
//! on disk, the way `boa`'s own CLI drives the engine against a real
//! script file.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use colored::Colorize;
use loader_core::{Environment, Loader, LoaderConfig, MockSynthesizer, PassthroughTransformer, ResourceMap, Transformer};
use loader_cli::{FsResourceMap, ScriptEnvironment, ShapeCopyingMockSynthesizer};

/// Requires a single entry module through a fresh Loader and prints its
/// exports.
#[derive(Debug, Parser)]
#[command(author, version, about, name = "loader-cli")]
struct Opt {
    /// Root of the project to scan for resources.
    #[arg(value_hint = clap::ValueHint::DirPath)]
    project_root: PathBuf,

    /// Entry module to require, relative to `project_root` (e.g.
    /// `./index.js`).
    entry: String,

    /// Turn the global auto-mock default on before requiring the entry.
    #[arg(long)]
    automock: bool,

    /// Collect coverage while requiring the entry.
    #[arg(long)]
    coverage: bool,

    /// Platform built-ins to recognize by name (spec §4.1 step 1),
    /// e.g. `--core-module fs --core-module path`.
    #[arg(long = "core-module")]
    core_modules: Vec<String>,
}

fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .wrap_err("failed to install the logger")?;
    color_eyre::install()?;

    let opt = Opt::parse();

    let resource_map = FsResourceMap::scan(&opt.project_root)
        .wrap_err_with(|| format!("failed to scan '{}'", opt.project_root.display()))?;

    // A synthetic importer "file" inside the project root, so the
    // Resolver's importer-relative lookup (spec §4.1) lands back on
    // `project_root` itself for the entry module's own require.
    let importer = opt.project_root.join("__loader_cli_entry__");

    let config = LoaderConfig::builder().automock(opt.automock).collect_coverage(opt.coverage).build();
    let environment = ScriptEnvironment::new(importer.clone());
    let transformer: Rc<dyn Transformer> = Rc::new(PassthroughTransformer);
    let synthesizer = Rc::new(ShapeCopyingMockSynthesizer);

    let loader = Loader::new(
        config,
        Rc::new(resource_map) as Rc<dyn ResourceMap>,
        environment as Rc<dyn Environment>,
        transformer,
        synthesizer as Rc<dyn MockSynthesizer>,
        None,
        opt.core_modules,
    );

    let exports = loader
        .require_module_or_mock(&importer, &opt.entry)
        .wrap_err_with(|| format!("failed to require '{}'", opt.entry))?;

    println!("{} {:?}", "exports:".green().bold(), exports);
    Ok(())
}
