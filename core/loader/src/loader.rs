//! The Loader (spec §2): the single stateful object instantiated per
//! test file, wiring every component together.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use crate::automock::Automocker;
use crate::coverage::CoverageCollectorFactory;
use crate::environment::{Environment, FakeTimers};
use crate::error::{JsResult, LoaderError};
use crate::executor::{CurrentModuleCell, Executor};
use crate::mock_synth::MockSynthesizer;
use crate::module_id::{ModuleId, ResolutionKind};
use crate::policy::{MockPolicyEngine, ShouldMockDecision};
use crate::registry::Registry;
use crate::resolver::Resolver;
use crate::resource_map::{ResourceKind, ResourceMap};
use crate::runtime_api::AssertionLibrary;
use crate::config::LoaderConfig;
use crate::transformer::Transformer;
use crate::value::JsValue;

/// The single stateful object instantiated per test file (spec §2).
///
/// Every method that needs to hand a sibling component (the Executor,
/// the Automocker) a fresh owning reference back to the Loader itself
/// — so that, in turn, they can hand out a [`Weak`] for a
/// [`BoundRequire`](crate::executor::BoundRequire) to close over —
/// reconstructs one from `self_ref`, a weak back-reference the Loader
/// keeps to its own allocation. Stable Rust has no `self: &Rc<Self>`
/// receiver, so this is the usual way around that: the Loader is always
/// reached through an `Rc`, so upgrading `self_ref` can never fail.
pub struct Loader {
    config: LoaderConfig,
    resource_map: Rc<dyn ResourceMap>,
    environment: Rc<dyn Environment>,
    resolver: Rc<Resolver>,
    policy: Rc<MockPolicyEngine>,
    registry: Registry,
    executor: Executor,
    automocker: Automocker,
    coverage_factory: Option<Rc<dyn CoverageCollectorFactory>>,
    current_module: CurrentModuleCell,
    /// `_explicitlySetMocks` (spec §3's `ExplicitMockSlot` row):
    /// survives registry reset by construction, since `reset` never
    /// touches this map.
    explicit_mocks: RefCell<HashMap<ModuleId, JsValue>>,
    /// Lazily computed, then cached for the Loader's lifetime (spec
    /// §4.7).
    dependents_cache: RefCell<Option<HashMap<PathBuf, Vec<PathBuf>>>>,
    self_ref: RefCell<Weak<Loader>>,
}

impl Loader {
    /// Builds a Loader over its collaborators (spec §6): a resource
    /// map, an evaluation Environment, a source Transformer, a Mock
    /// Synthesizer, an optional coverage collector factory, and the set
    /// of names treated as platform built-ins.
    #[must_use]
    pub fn new(
        config: LoaderConfig,
        resource_map: Rc<dyn ResourceMap>,
        environment: Rc<dyn Environment>,
        transformer: Rc<dyn Transformer>,
        synthesizer: Rc<dyn MockSynthesizer>,
        coverage_factory: Option<Rc<dyn CoverageCollectorFactory>>,
        core_modules: impl IntoIterator<Item = String>,
    ) -> Rc<Self> {
        let resolver = Rc::new(Resolver::new(
            config.clone(),
            Rc::clone(&resource_map),
            core_modules,
        ));
        let policy = Rc::new(MockPolicyEngine::new(Rc::clone(&resolver)));
        let executor = Executor::new(
            Rc::clone(&environment),
            transformer,
            coverage_factory.clone(),
        );
        let automocker = Automocker::new(synthesizer);

        let loader = Rc::new(Self {
            config,
            resource_map,
            environment,
            resolver,
            policy,
            registry: Registry::new(),
            executor,
            automocker,
            coverage_factory,
            current_module: RefCell::new(None),
            explicit_mocks: RefCell::new(HashMap::new()),
            dependents_cache: RefCell::new(None),
            self_ref: RefCell::new(Weak::new()),
        });
        *loader.self_ref.borrow_mut() = Rc::downgrade(&loader);
        loader
    }

    /// An owning reference to this same Loader, for handing to
    /// collaborators that need to keep a [`Weak`] of their own.
    fn self_rc(&self) -> Rc<Self> {
        self.self_ref
            .borrow()
            .upgrade()
            .expect("Loader always lives behind the Rc returned by Loader::new")
    }

    /// This Loader's immutable configuration.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// This Loader's Resolver.
    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// This Loader's Registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// `requireModuleOrMock`: the Mock Policy Engine decides, then
    /// delivers.
    ///
    /// # Errors
    /// Propagates resolution, evaluation, or synthesis failures.
    pub fn require_module_or_mock(&self, importer: &Path, requested: &str) -> JsResult<JsValue> {
        let (id, should_mock) = self.policy.should_mock(importer, requested)?;
        if should_mock {
            self.deliver_mock(importer, requested, &id)
        } else {
            self.deliver_real(importer, requested, &id)
        }
    }

    /// `requireModule` / `require.requireActual`: force the real
    /// branch regardless of policy.
    ///
    /// # Errors
    /// Propagates resolution or evaluation failures.
    pub fn require_module(&self, importer: &Path, requested: &str) -> JsResult<JsValue> {
        let id = self.resolver.resolve(importer, requested)?;
        self.deliver_real(importer, requested, &id)
    }

    /// `requireMock` / `require.requireMock`: force the mock branch
    /// regardless of policy.
    ///
    /// # Errors
    /// Propagates resolution, evaluation, or synthesis failures.
    pub fn require_mock(&self, importer: &Path, requested: &str) -> JsResult<JsValue> {
        let id = self.resolver.resolve(importer, requested)?;
        self.deliver_mock(importer, requested, &id)
    }

    fn deliver_real(&self, importer: &Path, requested: &str, id: &ModuleId) -> JsResult<JsValue> {
        if id.kind == ResolutionKind::Core {
            let name = id.real_path.clone().unwrap_or_default();
            return self.environment.import_core_module(&name.to_string_lossy());
        }

        let Some(real_path) = &id.real_path else {
            return Err(LoaderError::ModuleNotFound {
                name: requested.to_owned(),
                importer: importer.to_path_buf(),
            });
        };

        self.evaluate_and_cache_real(real_path, false)
    }

    fn deliver_mock(&self, importer: &Path, requested: &str, id: &ModuleId) -> JsResult<JsValue> {
        if id.kind == ResolutionKind::Core {
            // Mocking a platform built-in is not meaningful; the policy
            // engine already never routes core modules here, but
            // `requireMock` can ask for it directly.
            return self.deliver_real(importer, requested, id);
        }

        if let Some(exports) = self.explicit_mocks.borrow().get(id).cloned() {
            return Ok(exports);
        }

        let key = id
            .mock_path
            .clone()
            .or_else(|| id.real_path.clone())
            .ok_or_else(|| LoaderError::ModuleNotFound {
                name: requested.to_owned(),
                importer: importer.to_path_buf(),
            })?;

        if let Some(exports) = self.registry.get_mock(&key) {
            return Ok(exports);
        }

        let exports = if let Some(mock_path) = &id.mock_path {
            self.evaluate_and_cache_real(mock_path, true)?
        } else {
            self.automocker.synthesize(&self.self_rc(), importer, requested)?
        };

        self.registry.insert_mock(key, exports.clone());
        Ok(exports)
    }

    fn evaluate_and_cache_real(&self, path: &Path, is_manual_mock: bool) -> JsResult<JsValue> {
        let is_new = self.registry.get_real(path).is_none();
        let record = self.registry.get_or_preallocate_real(path);
        if is_new {
            self.executor
                .execute(&self.self_rc(), &record, is_manual_mock, &self.current_module)?;
        }
        Ok(JsValue::Object(record.exports.clone()))
    }

    /// `jest.mock(name)`: installs an explicit force-mock override.
    ///
    /// # Errors
    /// Propagates a resolution failure.
    pub fn force_mock(&self, importer: &Path, name: &str) -> JsResult<()> {
        let id = self.resolver.resolve(importer, name)?;
        self.policy.set_override(id, ShouldMockDecision::ForceMock);
        Ok(())
    }

    /// `jest.dontMock(name)`: installs an explicit force-real override.
    /// Whichever of `force_mock`/`force_real` ran most recently for the
    /// same identity wins.
    ///
    /// # Errors
    /// Propagates a resolution failure.
    pub fn force_real(&self, importer: &Path, name: &str) -> JsResult<()> {
        let id = self.resolver.resolve(importer, name)?;
        self.policy.set_override(id, ShouldMockDecision::ForceReal);
        Ok(())
    }

    /// `jest.setMock(name, exports)`: force-mock plus an explicit mock
    /// slot, surviving registry reset.
    ///
    /// # Errors
    /// Propagates a resolution failure.
    pub fn set_mock(&self, importer: &Path, name: &str, exports: JsValue) -> JsResult<()> {
        let id = self.resolver.resolve(importer, name)?;
        self.policy
            .set_override(id.clone(), ShouldMockDecision::ForceMock);
        self.explicit_mocks.borrow_mut().insert(id, exports);
        Ok(())
    }

    /// `jest.genMockFromModule(name)`.
    ///
    /// # Errors
    /// Propagates resolution or synthesis failures.
    pub fn gen_mock_from_module(&self, importer: &Path, name: &str) -> JsResult<JsValue> {
        self.automocker.synthesize(&self.self_rc(), importer, name)
    }

    /// `jest.genMockFunction` / `jest.genMockFn`.
    #[must_use]
    pub fn gen_mock_function(&self) -> JsValue {
        self.automocker.gen_mock_function()
    }

    /// `jest.resetModuleRegistry` (spec §4.3).
    pub fn reset_module_registry(&self) {
        self.registry.reset(self.environment.global());
    }

    /// `jest.autoMockOn` / `jest.autoMockOff`.
    pub fn set_automock(&self, enabled: bool) {
        self.policy.set_automock(enabled);
    }

    /// The Environment's timer facility.
    #[must_use]
    pub fn fake_timers(&self) -> Rc<dyn FakeTimers> {
        self.environment.fake_timers()
    }

    /// `jest.currentTestPath`.
    #[must_use]
    pub fn test_file_path(&self) -> PathBuf {
        self.environment.test_file_path().to_path_buf()
    }

    /// The out-of-scope assertion library.
    #[must_use]
    pub fn assertion_library(&self) -> Rc<dyn AssertionLibrary> {
        self.environment.assertion_library()
    }

    /// `getDependenciesFromPath(path)` (spec §4.7).
    ///
    /// # Errors
    /// Returns [`LoaderError::UnknownModulePath`] if no resource is
    /// registered for `path`, or [`LoaderError::InvalidResourceKind`]
    /// if it names a `ProjectConfig` or `Other` resource.
    pub fn get_dependencies_from_path(&self, path: &Path) -> JsResult<Vec<PathBuf>> {
        let resource = self
            .resource_map
            .get_resource_by_path(path)
            .ok_or_else(|| LoaderError::UnknownModulePath {
                path: path.to_path_buf(),
            })?;

        match resource.kind {
            ResourceKind::ProjectConfig | ResourceKind::Other => Err(LoaderError::InvalidResourceKind),
            ResourceKind::Source | ResourceKind::ManualMock => resource
                .required_modules
                .iter()
                .map(|name| {
                    let id = self.resolver.resolve(path, name)?;
                    Ok(id.real_path.or(id.mock_path).unwrap_or_else(|| PathBuf::from(name)))
                })
                .collect(),
        }
    }

    /// `getDependentsFromPath(path)`: the inverse of
    /// [`Self::get_dependencies_from_path`], computed lazily on first
    /// call and cached thereafter (spec §4.7).
    ///
    /// # Errors
    /// Returns [`LoaderError::UnknownModulePath`] if no resource is
    /// registered for `path`.
    pub fn get_dependents_from_path(&self, path: &Path) -> JsResult<Vec<PathBuf>> {
        if self.resource_map.get_resource_by_path(path).is_none() {
            return Err(LoaderError::UnknownModulePath {
                path: path.to_path_buf(),
            });
        }
        self.ensure_dependents_cache()?;
        Ok(self
            .dependents_cache
            .borrow()
            .as_ref()
            .expect("cache was just populated")
            .get(path)
            .cloned()
            .unwrap_or_default())
    }

    fn ensure_dependents_cache(&self) -> JsResult<()> {
        if self.dependents_cache.borrow().is_some() {
            return Ok(());
        }
        let mut inverted: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
        for kind in [ResourceKind::Source, ResourceKind::ManualMock] {
            for resource in self.resource_map.get_all_resources_by_type(kind) {
                for dependency in self.get_dependencies_from_path(&resource.path)? {
                    inverted.entry(dependency).or_default().push(resource.path.clone());
                }
            }
        }
        *self.dependents_cache.borrow_mut() = Some(inverted);
        Ok(())
    }

    /// `getAllCoverageInfo()` (spec §4.7).
    ///
    /// # Errors
    /// Returns [`LoaderError::CoverageDisabled`] if coverage was never
    /// enabled for this run.
    pub fn get_all_coverage_info(&self) -> JsResult<crate::value::JsObject> {
        let factory = self.require_coverage_factory()?;
        let obj = crate::value::JsObject::new();
        for path in factory.all_collected_paths() {
            let collector = factory.collector_for("", &path);
            obj.set(
                path.to_string_lossy().to_string(),
                collector.extract_runtime_coverage_info(),
            );
        }
        Ok(obj)
    }

    /// `getCoverageForFilePath(path)` (spec §4.7).
    ///
    /// # Errors
    /// Returns [`LoaderError::CoverageDisabled`] if coverage was never
    /// enabled, or if `path` was never selected for collection.
    pub fn get_coverage_for_file_path(&self, path: &Path) -> JsResult<JsValue> {
        let factory = self.require_coverage_factory()?;
        if !factory.all_collected_paths().iter().any(|p| p == path) {
            return Err(LoaderError::CoverageDisabled);
        }
        let collector = factory.collector_for("", path);
        Ok(collector.extract_runtime_coverage_info())
    }

    fn require_coverage_factory(&self) -> JsResult<&Rc<dyn CoverageCollectorFactory>> {
        if !self.config.collect_coverage {
            return Err(LoaderError::CoverageDisabled);
        }
        self.coverage_factory.as_ref().ok_or(LoaderError::CoverageDisabled)
    }
}
