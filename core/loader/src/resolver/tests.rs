use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

use super::*;

/// A bare in-memory [`ResourceMap`] keyed by logical id and by path,
/// enough to exercise the Resolver without a real indexer.
#[derive(Default)]
struct FakeResourceMap {
    by_id: RefCell<HashMap<(ResourceKind, String), Resource>>,
    by_path: RefCell<HashMap<PathBuf, Resource>>,
}

impl FakeResourceMap {
    fn insert(&self, resource: Resource) {
        self.by_id
            .borrow_mut()
            .insert((resource.kind, resource.id.clone()), resource.clone());
        self.by_path
            .borrow_mut()
            .insert(resource.path.clone(), resource);
    }
}

impl ResourceMap for FakeResourceMap {
    fn get_resource(&self, kind: ResourceKind, name: &str) -> Option<Resource> {
        self.by_id.borrow().get(&(kind, name.to_owned())).cloned()
    }

    fn get_resource_by_path(&self, path: &Path) -> Option<Resource> {
        self.by_path.borrow().get(path).cloned()
    }

    fn get_all_resources(&self) -> Vec<Resource> {
        self.by_path.borrow().values().cloned().collect()
    }

    fn get_all_resources_by_type(&self, kind: ResourceKind) -> Vec<Resource> {
        self.by_path
            .borrow()
            .values()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }
}

fn source(id: &str, path: PathBuf) -> Resource {
    Resource {
        id: id.to_owned(),
        kind: ResourceKind::Source,
        path,
        data: ResourceData::default(),
        required_modules: Vec::new(),
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("loader_core_resolver_{name}"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn resolver_over(map: FakeResourceMap) -> (Resolver, PathBuf) {
    let resolver = Resolver::new(LoaderConfig::builder().build(), Rc::new(map), []);
    (resolver, PathBuf::from("/unused"))
}

#[test]
fn path_form_request_resolves_relative_to_importer() {
    let dir = temp_dir("relative");
    std::fs::write(dir.join("helper.js"), "module.exports = 1;").unwrap();
    let importer = dir.join("main.js");

    let (resolver, _) = resolver_over(FakeResourceMap::default());
    let id = resolver.resolve(&importer, "./helper.js").unwrap();
    assert_eq!(id.real_path, Some(dir.join("helper.js")));
    assert_eq!(id.kind, ResolutionKind::User);
}

#[test]
fn extension_is_tried_when_missing() {
    let dir = temp_dir("extension");
    std::fs::write(dir.join("helper.js"), "module.exports = 1;").unwrap();
    let importer = dir.join("main.js");

    let (resolver, _) = resolver_over(FakeResourceMap::default());
    let id = resolver.resolve(&importer, "./helper").unwrap();
    assert_eq!(id.real_path, Some(dir.join("helper.js")));
}

#[test]
fn directory_index_is_tried_last() {
    let dir = temp_dir("directory_index");
    let sub = dir.join("pkg");
    std::fs::create_dir_all(&sub).unwrap();
    std::fs::write(sub.join("index.js"), "module.exports = 1;").unwrap();
    let importer = dir.join("main.js");

    let (resolver, _) = resolver_over(FakeResourceMap::default());
    let id = resolver.resolve(&importer, "./pkg").unwrap();
    assert_eq!(id.real_path, Some(sub.join("index.js")));
}

#[test]
fn manual_mock_sibling_is_attached_to_a_real_resolution() {
    let dir = temp_dir("sibling_mock");
    std::fs::write(dir.join("helper.js"), "module.exports = 1;").unwrap();
    std::fs::create_dir_all(dir.join("__mocks__")).unwrap();
    let mock_path = dir.join("__mocks__").join("helper.js");
    std::fs::write(&mock_path, "module.exports = 2;").unwrap();
    let importer = dir.join("main.js");

    let map = FakeResourceMap::default();
    map.insert(Resource {
        kind: ResourceKind::ManualMock,
        ..source("helper", mock_path.clone())
    });
    let (resolver, _) = resolver_over(map);

    let id = resolver.resolve(&importer, "./helper.js").unwrap();
    assert_eq!(id.real_path, Some(dir.join("helper.js")));
    assert_eq!(id.mock_path, Some(mock_path));
}

#[test]
fn logical_name_known_to_the_resource_map_bypasses_the_filesystem() {
    let map = FakeResourceMap::default();
    map.insert(source("left-pad", PathBuf::from("/vendor/left-pad/index.js")));
    let (resolver, importer) = resolver_over(map);

    let id = resolver.resolve(&importer, "left-pad").unwrap();
    assert_eq!(id.real_path, Some(PathBuf::from("/vendor/left-pad/index.js")));
}

#[test]
fn name_mapper_rewrite_is_applied_before_resolution() {
    let dir = temp_dir("name_mapper");
    std::fs::write(dir.join("shim.js"), "module.exports = 1;").unwrap();
    let importer = dir.join("main.js");

    let config = LoaderConfig::builder()
        .name_mapping("^css$", format!("{}", dir.join("shim.js").display()))
        .unwrap()
        .build();
    let resolver = Resolver::new(config, Rc::new(FakeResourceMap::default()), []);

    let id = resolver.resolve(&importer, "css").unwrap();
    assert_eq!(id.real_path, Some(dir.join("shim.js")));
}

#[test]
fn name_mapper_uses_the_canonical_name_verbatim_with_no_capture_substitution() {
    // Scenario 6: a capture-group pattern is declared, but this
    // resolver's mapper installs the configured replacement literally
    // rather than substituting `$1` into it, so `alias/foo` resolves
    // to the literal `literal-target`, not `literal-foo`.
    let map = FakeResourceMap::default();
    map.insert(source("literal-target", PathBuf::from("/scope/real/literal-target.js")));
    let importer = PathBuf::from("/proj/__tests__/suite.test.js");

    let config = LoaderConfig::builder()
        .name_mapping("^alias/(.*)$", "literal-target")
        .unwrap()
        .build();
    let resolver = Resolver::new(config, Rc::new(map), []);

    let id = resolver.resolve(&importer, "alias/foo").unwrap();
    assert_eq!(id.real_path, Some(PathBuf::from("/scope/real/literal-target.js")));
}

#[test]
fn name_mapper_tries_patterns_in_declared_order_and_first_match_wins() {
    let map = FakeResourceMap::default();
    map.insert(source("first", PathBuf::from("/scope/first.js")));
    map.insert(source("second", PathBuf::from("/scope/second.js")));
    let importer = PathBuf::from("/unused");

    let config = LoaderConfig::builder()
        .name_mapping("^thing$", "first")
        .unwrap()
        .name_mapping("^thing$", "second")
        .unwrap()
        .build();
    let resolver = Resolver::new(config, Rc::new(map), []);

    let id = resolver.resolve(&importer, "thing").unwrap();
    assert_eq!(id.real_path, Some(PathBuf::from("/scope/first.js")));
}

#[test]
fn core_module_names_short_circuit_with_no_real_path_lookup() {
    let resolver = Resolver::new(
        LoaderConfig::builder().build(),
        Rc::new(FakeResourceMap::default()),
        ["fs".to_owned()],
    );
    let id = resolver.resolve(Path::new("/unused"), "fs").unwrap();
    assert_eq!(id.kind, ResolutionKind::Core);
    assert_eq!(id.real_path, Some(PathBuf::from("fs")));
}

#[test]
fn core_module_check_runs_against_the_raw_request_before_name_mapping() {
    // A name-mapping rule happens to target the same name as a
    // configured core module. Step 1 (core-module check) runs against
    // the raw requested name, before step 7's mapping is even applied,
    // so the mapping must not get a chance to steer "fs" away from the
    // core-module branch.
    let map = FakeResourceMap::default();
    map.insert(source("fs-shim", PathBuf::from("/vendor/fs-shim.js")));
    let config = LoaderConfig::builder()
        .name_mapping("^fs$", "fs-shim")
        .unwrap()
        .build();
    let resolver = Resolver::new(config, Rc::new(map), ["fs".to_owned()]);

    let id = resolver.resolve(Path::new("/unused"), "fs").unwrap();
    assert_eq!(id.kind, ResolutionKind::Core);
    assert_eq!(id.real_path, Some(PathBuf::from("fs")));
}

#[test]
fn unresolvable_name_is_module_not_found() {
    let (resolver, importer) = resolver_over(FakeResourceMap::default());
    let err = resolver.resolve(&importer, "nonexistent-package").unwrap_err();
    assert!(matches!(err, LoaderError::ModuleNotFound { .. }));
}

#[test]
fn package_shadow_fallback_uses_the_manifest_directory_not_the_importer() {
    let root = temp_dir("package_shadow");
    let project = root.join("project");
    let package = root.join("node_modules").join("widgets");
    std::fs::create_dir_all(&project).unwrap();
    std::fs::create_dir_all(&package).unwrap();
    std::fs::write(package.join("main.js"), "module.exports = 1;").unwrap();
    std::fs::write(package.join("package.json"), "{}").unwrap();

    let map = FakeResourceMap::default();
    map.insert(Resource {
        kind: ResourceKind::ProjectConfig,
        data: ResourceData {
            name: Some("widgets".to_owned()),
            main: Some("main".to_owned()),
        },
        ..source("widgets-manifest", package.join("package.json"))
    });
    let resolver = Resolver::new(LoaderConfig::builder().build(), Rc::new(map), []);

    let importer = project.join("index.js");
    let id = resolver.resolve(&importer, "widgets").unwrap();
    assert_eq!(id.real_path, Some(package.join("main.js")));
}

#[test]
fn package_shadow_fallback_is_skipped_when_manifest_is_under_the_importer() {
    let root = temp_dir("package_shadow_skip");
    let nested = root.join("nested");
    std::fs::create_dir_all(&nested).unwrap();

    let map = FakeResourceMap::default();
    map.insert(Resource {
        kind: ResourceKind::ProjectConfig,
        data: ResourceData {
            name: Some("widgets".to_owned()),
            main: Some("main".to_owned()),
        },
        ..source("widgets-manifest", nested.join("package.json"))
    });
    let resolver = Resolver::new(LoaderConfig::builder().build(), Rc::new(map), []);

    // The importer's own directory *is* `root`, an ancestor of `nested`,
    // so `nested` is a descendant of it and the fallback must not fire.
    let importer = root.join("index.js");
    let err = resolver.resolve(&importer, "widgets").unwrap_err();
    assert!(matches!(err, LoaderError::ModuleNotFound { .. }));
}
