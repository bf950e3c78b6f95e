//! Demonstrates manual-mock delivery (spec §4.1 step 3, §4.2, §8
//! scenario 2): a real module with a `__mocks__`-sibling hand-authored
//! mock, delivered differently depending on the automock default and
//! an explicit `jest.mock`/`jest.dontMock`-style override.

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use loader_core::{Environment, Loader, LoaderConfig, MockSynthesizer, PassthroughTransformer, ResourceMap, Transformer};
use loader_cli::{FsResourceMap, ScriptEnvironment, ShapeCopyingMockSynthesizer};

fn main() {
    simple_logger::SimpleLogger::new().init().expect("logger installs once");

    let root = scratch_dir("manual-mock");
    fs::write(root.join("greeter.js"), r#"exports.greeting = "hello from the real module";"#).unwrap();
    fs::create_dir_all(root.join("__mocks__")).unwrap();
    fs::write(
        root.join("__mocks__").join("greeter.js"),
        r#"exports.greeting = "hello from the manual mock";"#,
    )
    .unwrap();

    let importer = root.join("__demo_entry__");

    // Automock is off and no override is installed: the real module wins.
    let loader = build_loader(&root, &importer, false);
    let real = loader.require_module_or_mock(&importer, "./greeter").expect("real delivers");
    println!("automock off: {:?}", real.as_object().unwrap().get("greeting"));

    // `jest.mock("./greeter")`: force the manual mock even with automock off.
    let loader = build_loader(&root, &importer, false);
    loader.force_mock(&importer, "./greeter").expect("override installs");
    let mocked = loader.require_module_or_mock(&importer, "./greeter").expect("mock delivers");
    println!("forced mock: {:?}", mocked.as_object().unwrap().get("greeting"));

    // `jest.requireActual("./greeter")`: bypass whatever policy says.
    let actual = loader.require_module(&importer, "./greeter").expect("requireActual bypasses the override");
    println!("requireActual: {:?}", actual.as_object().unwrap().get("greeting"));

    fs::remove_dir_all(&root).ok();
}

fn build_loader(root: &std::path::Path, importer: &std::path::Path, automock: bool) -> Rc<Loader> {
    let resource_map = FsResourceMap::scan(root).expect("scan succeeds");
    let environment = ScriptEnvironment::new(importer.to_path_buf());
    let transformer: Rc<dyn Transformer> = Rc::new(PassthroughTransformer);
    let synthesizer = Rc::new(ShapeCopyingMockSynthesizer);

    Loader::new(
        LoaderConfig::builder().automock(automock).build(),
        Rc::new(resource_map) as Rc<dyn ResourceMap>,
        environment as Rc<dyn Environment>,
        transformer,
        synthesizer as Rc<dyn MockSynthesizer>,
        None,
        Vec::new(),
    )
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
