//! In-memory test doubles for every out-of-scope collaborator (spec
//! §6), letting unit tests build a real [`Loader`] instead of faking
//! its behavior at a distance.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::LoaderConfig;
use crate::coverage::{CoverageCollector, CoverageCollectorFactory, CoverageStore};
use crate::environment::{Environment, FakeTimers, GlobalHandle, GlobalObject, ModuleArgs, ModuleFactory};
use crate::error::{JsResult, LoaderError};
use crate::loader::Loader;
use crate::mock_synth::{MockShape, MockSynthesizer};
use crate::resource_map::{Resource, ResourceData, ResourceKind, ResourceMap};
use crate::runtime_api::AssertionLibrary;
use crate::transformer::Transformer;
use crate::value::{JsFunction, JsObject, JsValue};

/// An in-memory [`ResourceMap`] over a fixed list of resources.
#[derive(Default)]
pub struct FakeResourceMap {
    resources: Vec<Resource>,
}

impl FakeResourceMap {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self { resources }
    }
}

impl ResourceMap for FakeResourceMap {
    fn get_resource(&self, kind: ResourceKind, name: &str) -> Option<Resource> {
        self.resources
            .iter()
            .find(|r| r.kind == kind && r.id == name)
            .cloned()
    }

    fn get_resource_by_path(&self, path: &Path) -> Option<Resource> {
        self.resources.iter().find(|r| r.path == path).cloned()
    }

    fn get_all_resources(&self) -> Vec<Resource> {
        self.resources.clone()
    }

    fn get_all_resources_by_type(&self, kind: ResourceKind) -> Vec<Resource> {
        self.resources
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }
}

/// Builds a `Source` resource addressable by `id` (a logical,
/// non-path-form name), requiring the given specifiers.
///
/// Tests use logical ids rather than `./relative` specifiers so
/// resolution goes through the [`FakeResourceMap`] instead of the
/// Resolver's real-filesystem path-form branch, which has no fixture
/// files to find (spec §4.1 steps 2 vs. 3).
pub fn source_resource(id: &str, path: impl Into<PathBuf>, required_modules: &[&str]) -> Resource {
    Resource {
        id: id.to_owned(),
        kind: ResourceKind::Source,
        path: path.into(),
        data: ResourceData::default(),
        required_modules: required_modules.iter().map(|s| (*s).to_owned()).collect(),
    }
}

/// Builds a `ManualMock` resource addressable by `id`.
pub fn manual_mock_resource(id: &str, path: impl Into<PathBuf>) -> Resource {
    Resource {
        id: id.to_owned(),
        kind: ResourceKind::ManualMock,
        path: path.into(),
        data: ResourceData::default(),
        required_modules: Vec::new(),
    }
}

/// Builds a `ProjectConfig` resource (a `package.json` stand-in).
pub fn manifest_resource(path: impl Into<PathBuf>, name: &str, main: &str) -> Resource {
    let path = path.into();
    Resource {
        id: path.display().to_string(),
        kind: ResourceKind::ProjectConfig,
        path,
        data: ResourceData {
            name: Some(name.to_owned()),
            main: Some(main.to_owned()),
        },
        required_modules: Vec::new(),
    }
}

/// A [`GlobalObject`] recording whether its reset hooks fired.
#[derive(Default)]
pub struct FakeGlobal {
    pub mock_functions_cleared: Cell<bool>,
    pub timers_cleared: Cell<bool>,
}

impl GlobalObject for FakeGlobal {
    fn clear_mock_functions(&self) {
        self.mock_functions_cleared.set(true);
    }

    fn invoke_mock_clear_timers(&self) {
        self.timers_cleared.set(true);
    }
}

/// A [`FakeTimers`] recording which control was last invoked, rather
/// than actually scheduling anything.
#[derive(Default)]
pub struct FakeFakeTimers {
    pub last_call: RefCell<Option<&'static str>>,
}

impl FakeTimers for FakeFakeTimers {
    fn use_fake_timers(&self) {
        *self.last_call.borrow_mut() = Some("useFakeTimers");
    }
    fn use_real_timers(&self) {
        *self.last_call.borrow_mut() = Some("useRealTimers");
    }
    fn run_all_ticks(&self) {
        *self.last_call.borrow_mut() = Some("runAllTicks");
    }
    fn run_all_immediates(&self) {
        *self.last_call.borrow_mut() = Some("runAllImmediates");
    }
    fn run_all_timers(&self) {
        *self.last_call.borrow_mut() = Some("runAllTimers");
    }
    fn run_only_pending_timers(&self) {
        *self.last_call.borrow_mut() = Some("runOnlyPendingTimers");
    }
    fn clear_all_timers(&self) {
        *self.last_call.borrow_mut() = Some("clearAllTimers");
    }
}

/// An [`AssertionLibrary`] that just records installed matchers.
#[derive(Default)]
pub struct FakeAssertionLibrary {
    pub installed: RefCell<Vec<JsValue>>,
}

impl AssertionLibrary for FakeAssertionLibrary {
    fn add_matchers(&self, matchers: JsValue) {
        self.installed.borrow_mut().push(matchers);
    }
}

/// The in-memory sandbox: modules are "evaluated" by looking up a
/// pre-registered [`ModuleFactory`] by path rather than by actually
/// running source text, since this crate never embeds a real engine.
pub struct FakeEnvironment {
    global: GlobalHandle,
    timers: Rc<dyn FakeTimers>,
    assertions: Rc<dyn AssertionLibrary>,
    test_file_path: PathBuf,
    factories: RefCell<HashMap<PathBuf, ModuleFactory>>,
    core_modules: RefCell<HashMap<String, JsValue>>,
    torn_down: Cell<bool>,
}

impl FakeEnvironment {
    #[must_use]
    pub fn new(test_file_path: PathBuf) -> Rc<Self> {
        Rc::new(Self {
            global: Rc::new(FakeGlobal::default()),
            timers: Rc::new(FakeFakeTimers::default()),
            assertions: Rc::new(FakeAssertionLibrary::default()),
            test_file_path,
            factories: RefCell::new(HashMap::new()),
            core_modules: RefCell::new(HashMap::new()),
            torn_down: Cell::new(false),
        })
    }

    /// Registers the factory a module at `path` evaluates to, standing
    /// in for what a real Environment would produce by actually
    /// running the module's (transformed) source text.
    pub fn register_module(&self, path: impl Into<PathBuf>, factory: ModuleFactory) {
        self.factories.borrow_mut().insert(path.into(), factory);
    }

    /// Registers a value delivered for a platform built-in's name.
    pub fn register_core_module(&self, name: &str, value: JsValue) {
        self.core_modules
            .borrow_mut()
            .insert(name.to_owned(), value);
    }

    /// Simulates the Environment tearing down mid-run (spec §5
    /// "Cancellation").
    pub fn tear_down(&self) {
        self.torn_down.set(true);
    }
}

impl Environment for FakeEnvironment {
    fn global(&self) -> Option<GlobalHandle> {
        if self.torn_down.get() {
            None
        } else {
            Some(Rc::clone(&self.global))
        }
    }

    fn run_source_text(&self, _source: &str, filename: &Path) -> JsResult<ModuleFactory> {
        self.factories
            .borrow()
            .get(filename)
            .cloned()
            .ok_or_else(|| LoaderError::ModuleNotFound {
                name: filename.display().to_string(),
                importer: filename.to_path_buf(),
            })
    }

    fn fake_timers(&self) -> Rc<dyn FakeTimers> {
        Rc::clone(&self.timers)
    }

    fn test_file_path(&self) -> &Path {
        &self.test_file_path
    }

    fn parse_json(&self, source: &str) -> JsResult<JsValue> {
        Ok(JsValue::string(source))
    }

    fn assertion_library(&self) -> Rc<dyn AssertionLibrary> {
        Rc::clone(&self.assertions)
    }

    fn import_core_module(&self, name: &str) -> JsResult<JsValue> {
        self.core_modules
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| LoaderError::ModuleNotFound {
                name: name.to_owned(),
                importer: PathBuf::new(),
            })
    }
}

/// A no-op [`Transformer`] returning the filename itself as "source",
/// since [`FakeEnvironment`] never actually parses it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeTransformer;

impl Transformer for FakeTransformer {
    fn transform(&self, filename: &Path, _config: &LoaderConfig) -> JsResult<String> {
        Ok(filename.display().to_string())
    }
}

/// A [`MockSynthesizer`] that treats any non-`undefined` exports value
/// as its own shape and hands it straight back.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeMockSynthesizer;

impl MockSynthesizer for FakeMockSynthesizer {
    fn get_metadata(&self, value: &JsValue) -> Option<MockShape> {
        match value {
            JsValue::Undefined => None,
            other => Some(MockShape(other.clone())),
        }
    }

    fn generate_from_metadata(&self, shape: &MockShape) -> JsValue {
        shape.0.clone()
    }

    fn get_mock_function(&self) -> JsValue {
        JsValue::Function(JsFunction::new(|_args| Ok(JsValue::Undefined)))
    }
}

/// A [`CoverageCollector`] backed by a plain [`JsObject`] sink.
pub struct FakeCoverageCollector {
    store: JsObject,
}

impl CoverageCollector for FakeCoverageCollector {
    fn coverage_data_store(&self) -> CoverageStore {
        CoverageStore(JsValue::Object(self.store.clone()))
    }

    fn instrumented_source(&self, sink_name: &str) -> String {
        format!("/* instrumented, sink: {sink_name} */")
    }

    fn extract_runtime_coverage_info(&self) -> JsValue {
        JsValue::Object(self.store.clone())
    }
}

/// A [`CoverageCollectorFactory`] that hands out one collector per path
/// and remembers every path it has ever seen.
#[derive(Default)]
pub struct FakeCoverageCollectorFactory {
    collectors: RefCell<HashMap<PathBuf, Rc<FakeCoverageCollector>>>,
}

impl CoverageCollectorFactory for FakeCoverageCollectorFactory {
    fn collector_for(&self, _source: &str, filename: &Path) -> Rc<dyn CoverageCollector> {
        let mut collectors = self.collectors.borrow_mut();
        let collector = collectors.entry(filename.to_path_buf()).or_insert_with(|| {
            Rc::new(FakeCoverageCollector {
                store: JsObject::new(),
            })
        });
        Rc::clone(collector) as Rc<dyn CoverageCollector>
    }

    fn all_collected_paths(&self) -> Vec<PathBuf> {
        self.collectors.borrow().keys().cloned().collect()
    }
}

/// Wraps a plain closure as a [`ModuleFactory`], for tests that register
/// a module body inline rather than simulating real evaluation.
pub fn module_factory(f: impl Fn(ModuleArgs) -> JsResult<()> + 'static) -> ModuleFactory {
    Rc::new(f)
}

/// Builds a fully wired [`Loader`] over [`FakeResourceMap`] and
/// [`FakeEnvironment`], returning both the Loader and the concrete
/// Environment handle so tests can register modules and inspect its
/// recorded state.
pub fn build_loader(resources: Vec<Resource>, config: LoaderConfig) -> (Rc<Loader>, Rc<FakeEnvironment>) {
    build_loader_with_coverage(resources, config, None)
}

/// As [`build_loader`], but also wires a coverage collector factory.
pub fn build_loader_with_coverage(
    resources: Vec<Resource>,
    config: LoaderConfig,
    coverage_factory: Option<Rc<dyn CoverageCollectorFactory>>,
) -> (Rc<Loader>, Rc<FakeEnvironment>) {
    build_loader_full(resources, config, coverage_factory, Vec::new())
}

/// As [`build_loader`], naming the specifiers the Resolver should treat
/// as platform built-ins (spec §4.1 step 1).
pub fn build_loader_full(
    resources: Vec<Resource>,
    config: LoaderConfig,
    coverage_factory: Option<Rc<dyn CoverageCollectorFactory>>,
    core_modules: Vec<String>,
) -> (Rc<Loader>, Rc<FakeEnvironment>) {
    let resource_map: Rc<dyn ResourceMap> = Rc::new(FakeResourceMap::new(resources));
    let environment = FakeEnvironment::new(PathBuf::from("/project/__tests__/suite.test.js"));
    let transformer: Rc<dyn Transformer> = Rc::new(FakeTransformer);
    let synthesizer: Rc<dyn MockSynthesizer> = Rc::new(FakeMockSynthesizer);

    let loader = Loader::new(
        config,
        resource_map,
        Rc::clone(&environment) as Rc<dyn Environment>,
        transformer,
        synthesizer,
        coverage_factory,
        core_modules,
    );

    (loader, environment)
}
