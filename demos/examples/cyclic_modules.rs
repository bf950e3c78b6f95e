//! Demonstrates the cycle-tolerance invariant (spec §3, §8 scenario 4):
//! two modules that `require` each other at module-top-level both see
//! a live, eventually-consistent reference to the other's exports
//! object rather than deadlocking or seeing a stale snapshot.

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use loader_core::{Environment, Loader, LoaderConfig, MockSynthesizer, PassthroughTransformer, ResourceMap, Transformer};
use loader_cli::{FsResourceMap, ScriptEnvironment, ShapeCopyingMockSynthesizer};

fn main() {
    simple_logger::SimpleLogger::new().init().expect("logger installs once");

    let root = scratch_dir("cyclic-modules");
    fs::write(
        root.join("a.js"),
        r#"
        const b = require("./b");
        exports.fromA = true;
        exports.viaB = () => b.fromB;
        "#,
    )
    .unwrap();
    fs::write(
        root.join("b.js"),
        r#"
        const a = require("./a");
        exports.fromB = true;
        exports.sawA = () => a.fromA ? "complete" : "partial";
        "#,
    )
    .unwrap();

    let importer = root.join("__demo_entry__");
    let resource_map = FsResourceMap::scan(&root).expect("scan succeeds");
    let environment = ScriptEnvironment::new(importer.clone());
    let transformer: Rc<dyn Transformer> = Rc::new(PassthroughTransformer);
    let synthesizer = Rc::new(ShapeCopyingMockSynthesizer);

    let loader = Loader::new(
        LoaderConfig::builder().build(),
        Rc::new(resource_map) as Rc<dyn ResourceMap>,
        environment as Rc<dyn Environment>,
        transformer,
        synthesizer as Rc<dyn MockSynthesizer>,
        None,
        Vec::new(),
    );

    let a = loader.require_module_or_mock(&importer, "./a").expect("a evaluates");
    let a = a.as_object().expect("a's exports are an object");

    // `b`, mid-evaluation, required `a` back and captured its exports
    // object before `a` finished running — but it's the same live
    // object, so by the time we call through it, `fromA` is set.
    let via_b = a
        .get("viaB")
        .as_function()
        .expect("viaB is callable")
        .call(&[])
        .expect("viaB runs");
    println!("a.viaB() -> {via_b:?}");

    let b = loader.require_module_or_mock(&importer, "./b").expect("b is already cached");
    let b = b.as_object().expect("b's exports are an object");
    let saw_a = b
        .get("sawA")
        .as_function()
        .expect("sawA is callable")
        .call(&[])
        .expect("sawA runs");
    println!("b.sawA() -> {saw_a:?}");

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
