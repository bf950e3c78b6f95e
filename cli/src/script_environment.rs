//! The production [`Environment`]: wires the micro interpreter in
//! [`crate::interpreter`] in as the "engine" behind `run_source_text`.
//!
//! Modeled on `loader_core`'s own `testutil::FakeEnvironment`, but
//! where that double looks factories up by path from a table tests
//! populate ahead of time, this one actually evaluates the source text
//! the Executor hands it, the way a real embedding would.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use loader_core::{
    AssertionLibrary, Environment, FakeTimers, GlobalHandle, GlobalObject, JsResult, JsValue,
    ModuleArgs, ModuleFactory,
};

use crate::interpreter;

/// The global object every test file shares: just enough to satisfy
/// the Registry's reset hook (spec §4.3).
#[derive(Default)]
struct ScriptGlobal {
    cleared_mock_functions: Cell<bool>,
    cleared_timers: Cell<bool>,
}

impl GlobalObject for ScriptGlobal {
    fn clear_mock_functions(&self) {
        self.cleared_mock_functions.set(true);
        log::debug!("cleared all recorded mock-function calls");
    }

    fn invoke_mock_clear_timers(&self) {
        self.cleared_timers.set(true);
        log::debug!("invoked the registered mockClearTimers hook");
    }
}

/// Timer control logged rather than actually scheduled, since this
/// harness never runs an event loop of its own.
#[derive(Default)]
struct ScriptTimers;

impl FakeTimers for ScriptTimers {
    fn use_fake_timers(&self) {
        log::debug!("switched to fake timers");
    }
    fn use_real_timers(&self) {
        log::debug!("switched to real timers");
    }
    fn run_all_ticks(&self) {
        log::debug!("ran all pending ticks");
    }
    fn run_all_immediates(&self) {
        log::debug!("ran all pending immediates");
    }
    fn run_all_timers(&self) {
        log::debug!("ran all pending timers");
    }
    fn run_only_pending_timers(&self) {
        log::debug!("ran only the timers already pending");
    }
    fn clear_all_timers(&self) {
        log::debug!("cleared all pending timers");
    }
}

/// The out-of-scope assertion library, standing in just well enough to
/// log what `jest.addMatchers` was handed.
#[derive(Default)]
struct ScriptAssertionLibrary;

impl AssertionLibrary for ScriptAssertionLibrary {
    fn add_matchers(&self, _matchers: JsValue) {
        log::debug!("installed additional matcher definitions");
    }
}

/// The real [`Environment`] behind `loader-cli`: evaluates module
/// source text with the tiny statement interpreter in
/// [`crate::interpreter`] rather than a real engine.
pub struct ScriptEnvironment {
    global: GlobalHandle,
    timers: Rc<dyn FakeTimers>,
    assertions: Rc<dyn AssertionLibrary>,
    test_file_path: PathBuf,
    torn_down: Cell<bool>,
}

impl ScriptEnvironment {
    #[must_use]
    pub fn new(test_file_path: PathBuf) -> Rc<Self> {
        Rc::new(Self {
            global: Rc::new(ScriptGlobal::default()),
            timers: Rc::new(ScriptTimers),
            assertions: Rc::new(ScriptAssertionLibrary),
            test_file_path,
            torn_down: Cell::new(false),
        })
    }

    /// Tears the Environment down, the way a real engine's context
    /// would be disposed of once a test file finishes (spec §5
    /// "Cancellation").
    pub fn tear_down(&self) {
        self.torn_down.set(true);
    }
}

impl Environment for ScriptEnvironment {
    fn global(&self) -> Option<GlobalHandle> {
        if self.torn_down.get() {
            None
        } else {
            Some(Rc::clone(&self.global))
        }
    }

    fn run_source_text(&self, source: &str, _filename: &Path) -> JsResult<ModuleFactory> {
        let source = source.to_owned();
        let factory: ModuleFactory = Rc::new(move |args: ModuleArgs| interpreter::interpret(&source, &args));
        Ok(factory)
    }

    fn fake_timers(&self) -> Rc<dyn FakeTimers> {
        Rc::clone(&self.timers)
    }

    fn test_file_path(&self) -> &Path {
        &self.test_file_path
    }

    fn parse_json(&self, source: &str) -> JsResult<JsValue> {
        interpreter::parse_json(source)
    }

    fn assertion_library(&self) -> Rc<dyn AssertionLibrary> {
        Rc::clone(&self.assertions)
    }

    fn import_core_module(&self, name: &str) -> JsResult<JsValue> {
        log::warn!("no platform built-in registered for '{name}'; returning undefined");
        Ok(JsValue::Undefined)
    }
}
