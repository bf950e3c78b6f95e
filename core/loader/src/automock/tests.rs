use std::path::PathBuf;

use super::*;
use crate::config::LoaderConfig;
use crate::testutil::{build_loader, module_factory, source_resource};

#[test]
fn synthesize_extracts_a_shape_from_the_real_module_and_caches_it() {
    let path = PathBuf::from("/project/src/thing.js");
    let (loader, environment) = build_loader(
        vec![source_resource("thing", &path, &[])],
        LoaderConfig::builder().automock(false).build(),
    );
    environment.register_module(
        path,
        module_factory(|args| {
            args.exports.set("greet", JsValue::string("hello"));
            Ok(())
        }),
    );

    let importer = PathBuf::from("/project/src/root.js");
    let mock = loader.gen_mock_from_module(&importer, "thing").unwrap();
    assert_eq!(mock.as_object().unwrap().get("greet"), JsValue::string("hello"));
}

#[test]
fn synthesize_does_not_leave_the_real_module_cached_in_the_caller_registry() {
    let path = PathBuf::from("/project/src/thing.js");
    let (loader, environment) = build_loader(
        vec![source_resource("thing", &path, &[])],
        LoaderConfig::builder().automock(false).build(),
    );
    environment.register_module(
        path.clone(),
        module_factory(|args| {
            args.exports.set("greet", JsValue::string("hello"));
            Ok(())
        }),
    );

    let importer = PathBuf::from("/project/src/root.js");
    loader.gen_mock_from_module(&importer, "thing").unwrap();

    // The real evaluation that happened to extract the shape ran under
    // an isolated registry, so the caller's own real registry never
    // saw it cached.
    assert!(loader.registry().get_real(&path).is_none());
}

#[test]
fn synthesize_reuses_the_cached_shape_on_a_second_call_without_reevaluating() {
    let path = PathBuf::from("/project/src/thing.js");
    let (loader, environment) = build_loader(
        vec![source_resource("thing", &path, &[])],
        LoaderConfig::builder().automock(false).build(),
    );
    let calls = std::rc::Rc::new(std::cell::Cell::new(0u32));
    let calls_clone = std::rc::Rc::clone(&calls);
    environment.register_module(
        path,
        module_factory(move |args| {
            calls_clone.set(calls_clone.get() + 1);
            args.exports.set("greet", JsValue::string("hello"));
            Ok(())
        }),
    );

    let importer = PathBuf::from("/project/src/root.js");
    loader.gen_mock_from_module(&importer, "thing").unwrap();
    loader.gen_mock_from_module(&importer, "thing").unwrap();

    assert_eq!(calls.get(), 1);
}

#[test]
fn synthesize_fails_when_the_real_module_exports_nothing_extractable() {
    let path = PathBuf::from("/project/src/empty.js");
    let (loader, environment) = build_loader(
        vec![source_resource("empty", &path, &[])],
        LoaderConfig::builder().automock(false).build(),
    );
    environment.register_module(path, module_factory(|_args| Ok(())));

    let importer = PathBuf::from("/project/src/root.js");
    let result = loader.gen_mock_from_module(&importer, "empty");
    assert!(matches!(result, Err(LoaderError::MockExtractionFailed { .. })));
}

#[test]
fn synthesizing_a_module_that_mutates_a_dependency_leaves_that_dependency_uncached() {
    // M's top level requires and mutates N's exports; synthesizing a
    // mock for M must not leave N's real-registry entry visible to the
    // caller once the isolated evaluation finishes.
    let m = PathBuf::from("/project/src/m.js");
    let n = PathBuf::from("/project/src/n.js");
    let (loader, environment) = build_loader(
        vec![source_resource("m", &m, &["n"]), source_resource("n", &n, &[])],
        LoaderConfig::builder().automock(false).build(),
    );
    environment.register_module(
        n,
        module_factory(|args| {
            args.exports.set("untouched", JsValue::Boolean(true));
            Ok(())
        }),
    );
    environment.register_module(
        m,
        module_factory(|args| {
            let n = args.require.call("n")?;
            n.as_object().unwrap().set("mutated_by_m", JsValue::Boolean(true));
            args.exports.set("greet", JsValue::string("hello"));
            Ok(())
        }),
    );

    let importer = PathBuf::from("/project/src/root.js");
    let mock = loader.gen_mock_from_module(&importer, "m").unwrap();
    assert_eq!(mock.as_object().unwrap().get("greet"), JsValue::string("hello"));

    assert!(loader.registry().get_real(&PathBuf::from("/project/src/n.js")).is_none());
}

#[test]
fn gen_mock_function_does_not_go_through_shape_extraction() {
    let (loader, _environment) = build_loader(vec![], LoaderConfig::builder().build());
    let mock_fn = loader.gen_mock_function();
    assert!(mock_fn.as_function().is_some());
}

#[test]
fn isolate_and_restore_preserve_an_unrelated_already_cached_module() {
    let other = PathBuf::from("/project/src/other.js");
    let thing = PathBuf::from("/project/src/thing.js");
    let (loader, environment) = build_loader(
        vec![
            source_resource("other", &other, &[]),
            source_resource("thing", &thing, &[]),
        ],
        LoaderConfig::builder().automock(false).build(),
    );
    environment.register_module(
        other.clone(),
        module_factory(|args| {
            args.exports.set("already", JsValue::Boolean(true));
            Ok(())
        }),
    );
    environment.register_module(
        thing,
        module_factory(|args| {
            args.exports.set("greet", JsValue::string("hello"));
            Ok(())
        }),
    );

    let importer = PathBuf::from("/project/src/root.js");
    loader.require_module(&importer, "other").unwrap();
    assert!(loader.registry().get_real(&other).is_some());

    loader.gen_mock_from_module(&importer, "thing").unwrap();

    // The caller's registry is restored to exactly what it held before
    // the isolated synthesis ran.
    assert!(loader.registry().get_real(&other).is_some());
}
