//! The per-module Runtime API (spec §4.6): the fluent `jest`-style
//! control object exposed to every evaluated module.

use std::path::PathBuf;
use std::rc::Rc;

use crate::error::JsResult;
use crate::loader::Loader;
use crate::value::{JsObject, JsValue};

/// The out-of-scope assertion-library collaborator (spec §1's "the
/// test assertion runtime"), reached only through `addMatchers`.
pub trait AssertionLibrary {
    /// Installs additional matcher definitions.
    fn add_matchers(&self, matchers: JsValue);
}

/// The per-module `jest` control object (spec §4.6).
///
/// Most methods consume and return `Self` so calls chain the way the
/// spec describes ("a fluent object whose methods return itself");
/// this is cosmetic; the state that actually changes lives on the
/// [`Loader`] this handle points at, shared via `Rc` with every other
/// handle and with the module's `BoundRequire`.
#[derive(Clone)]
pub struct RuntimeApi {
    loader: Rc<Loader>,
    /// The path of the module this handle was constructed for — used
    /// as the importer for `genMockFromModule` and name-resolving
    /// calls (spec §4.6: "using the currently executing module's path
    /// as the importer").
    current_path: PathBuf,
}

impl RuntimeApi {
    pub(crate) fn new(loader: Rc<Loader>, current_path: PathBuf) -> Self {
        Self {
            loader,
            current_path,
        }
    }

    /// Turns the global auto-mock default on.
    #[must_use]
    pub fn auto_mock_on(self) -> Self {
        self.loader.set_automock(true);
        self
    }

    /// Turns the global auto-mock default off.
    #[must_use]
    pub fn auto_mock_off(self) -> Self {
        self.loader.set_automock(false);
        self
    }

    /// `jest.mock(name)`: force the mock branch for this identity.
    ///
    /// # Errors
    /// Propagates a resolution failure.
    pub fn mock(self, name: &str) -> JsResult<Self> {
        self.loader.force_mock(&self.current_path, name)?;
        Ok(self)
    }

    /// `jest.dontMock(name)`: force the real branch for this identity.
    /// Called after `mock`, it wins — overrides are last-write.
    ///
    /// # Errors
    /// Propagates a resolution failure.
    pub fn dont_mock(self, name: &str) -> JsResult<Self> {
        self.loader.force_real(&self.current_path, name)?;
        Ok(self)
    }

    /// `jest.setMock(name, exports)`: force-mock plus install `exports`
    /// as the explicit mock slot.
    ///
    /// # Errors
    /// Propagates a resolution failure.
    pub fn set_mock(self, name: &str, exports: JsValue) -> JsResult<Self> {
        self.loader.set_mock(&self.current_path, name, exports)?;
        Ok(self)
    }

    /// `jest.genMockFromModule(name)`: a freshly synthesized mock for
    /// `name`, importing from the currently executing module.
    ///
    /// # Errors
    /// Propagates resolution or synthesis failures.
    pub fn gen_mock_from_module(&self, name: &str) -> JsResult<JsValue> {
        self.loader.gen_mock_from_module(&self.current_path, name)
    }

    /// `jest.genMockFunction` / `jest.genMockFn`: a bare mock function.
    #[must_use]
    pub fn gen_mock_function(&self) -> JsValue {
        self.loader.gen_mock_function()
    }

    /// `resetModuleRegistry`: clears both registries (spec §4.3).
    #[must_use]
    pub fn reset_module_registry(self) -> Self {
        self.loader.reset_module_registry();
        self
    }

    /// `useFakeTimers`.
    #[must_use]
    pub fn use_fake_timers(self) -> Self {
        self.loader.fake_timers().use_fake_timers();
        self
    }

    /// `useRealTimers`.
    #[must_use]
    pub fn use_real_timers(self) -> Self {
        self.loader.fake_timers().use_real_timers();
        self
    }

    /// `runAllTicks`.
    #[must_use]
    pub fn run_all_ticks(self) -> Self {
        self.loader.fake_timers().run_all_ticks();
        self
    }

    /// `runAllImmediates`.
    #[must_use]
    pub fn run_all_immediates(self) -> Self {
        self.loader.fake_timers().run_all_immediates();
        self
    }

    /// `runAllTimers`.
    #[must_use]
    pub fn run_all_timers(self) -> Self {
        self.loader.fake_timers().run_all_timers();
        self
    }

    /// `runOnlyPendingTimers`.
    #[must_use]
    pub fn run_only_pending_timers(self) -> Self {
        self.loader.fake_timers().run_only_pending_timers();
        self
    }

    /// `clearAllTimers`.
    #[must_use]
    pub fn clear_all_timers(self) -> Self {
        self.loader.fake_timers().clear_all_timers();
        self
    }

    /// `currentTestPath`: the Environment's test file path.
    #[must_use]
    pub fn current_test_path(&self) -> PathBuf {
        self.loader.test_file_path()
    }

    /// `addMatchers`: delegated to the assertion library.
    #[must_use]
    pub fn add_matchers(self, matchers: JsValue) -> Self {
        self.loader.assertion_library().add_matchers(matchers);
        self
    }

    /// `getTestEnvData`: a frozen shallow copy of the configured bag.
    #[must_use]
    pub fn get_test_env_data(&self) -> JsObject {
        let obj = JsObject::new();
        for (key, value) in &self.loader.config().test_env_data {
            obj.set(key.as_str(), JsValue::string(value.as_str()));
        }
        obj
    }
}
