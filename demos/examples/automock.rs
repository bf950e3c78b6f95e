//! Demonstrates automocking (spec §4.5, §8 scenario 6): with the
//! global automock default on, requiring a real module synthesizes a
//! stub from its shape instead of evaluating it, via the Mock
//! Synthesizer collaborator.

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use loader_core::{Environment, Loader, LoaderConfig, MockSynthesizer, PassthroughTransformer, ResourceMap, Transformer};
use loader_cli::{FsResourceMap, ScriptEnvironment, ShapeCopyingMockSynthesizer};

fn main() {
    simple_logger::SimpleLogger::new().init().expect("logger installs once");

    let root = scratch_dir("automock");
    fs::write(root.join("base.js"), r#"exports.two = 2; exports.six = 6;"#).unwrap();
    fs::write(
        root.join("math.js"),
        r#"
        const base = require("./base");
        exports.name = "math";
        exports.add = () => base.two;
        exports.multiply = () => base.six;
        "#,
    )
    .unwrap();

    let importer = root.join("__demo_entry__");
    let resource_map = FsResourceMap::scan(&root).expect("scan succeeds");
    let environment = ScriptEnvironment::new(importer.clone());
    let transformer: Rc<dyn Transformer> = Rc::new(PassthroughTransformer);
    let synthesizer = Rc::new(ShapeCopyingMockSynthesizer);

    let loader: Rc<Loader> = Loader::new(
        LoaderConfig::builder().automock(true).build(),
        Rc::new(resource_map) as Rc<dyn ResourceMap>,
        environment as Rc<dyn Environment>,
        transformer,
        synthesizer as Rc<dyn MockSynthesizer>,
        None,
        Vec::new(),
    );

    let mocked = loader.require_module_or_mock(&importer, "./math").expect("automock synthesizes a stub");
    let mocked = mocked.as_object().expect("the stub is an object");

    // The real module's string property survives the copy; its
    // function-shaped properties were replaced with no-op mocks.
    println!("mocked.name -> {:?}", mocked.get("name"));
    println!(
        "mocked.add() -> {:?}",
        mocked.get("add").as_function().expect("add stays callable").call(&[]).unwrap()
    );

    fs::remove_dir_all(&root).ok();
}

fn scratch_dir(label: &str) -> PathBuf {
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is after the epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("loader-demo-{label}-{}-{nonce}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}
