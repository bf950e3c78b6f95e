//! The `Environment` collaborator contract (spec §6).
//!
//! The evaluation sandbox itself — a fresh global object, a source-text
//! evaluator, fake timers — is explicitly out of scope (spec §1); this
//! module only defines the boundary the Executor talks through.

use std::path::Path;
use std::rc::Rc;

use crate::error::JsResult;
use crate::executor::BoundRequire;
use crate::runtime_api::RuntimeApi;
use crate::value::JsObject;

/// A value the Executor hands to a freshly evaluated module's wrapper
/// function (spec §4.4 steps 7-8): the result of running the wrapper's
/// source text through the Environment, extracted down to the single
/// callable the wrapper evaluates to.
pub type ModuleFactory = Rc<dyn Fn(ModuleArgs) -> JsResult<()>>;

/// A handle to the Environment's global object, used by
/// [`crate::registry::Registry::reset`] (spec §4.3).
pub type GlobalHandle = Rc<dyn GlobalObject>;

/// The subset of the Environment's global object the Registry's reset
/// hook needs to touch.
pub trait GlobalObject {
    /// Clears every mock function's recorded calls and results. Spec
    /// §4.3: "every mock-function present as a property of the
    /// Environment's global object is cleared".
    fn clear_mock_functions(&self);

    /// Invokes the registered `mockClearTimers` hook, if any.
    fn invoke_mock_clear_timers(&self);
}

/// Timer control surface delegated to from the `jest` runtime API
/// (spec §4.6).
pub trait FakeTimers {
    /// Switches the Environment to fake timers.
    fn use_fake_timers(&self);
    /// Switches the Environment to real timers.
    fn use_real_timers(&self);
    /// Flushes all pending `process.nextTick`-style callbacks.
    fn run_all_ticks(&self);
    /// Flushes all pending immediates.
    fn run_all_immediates(&self);
    /// Flushes all pending timers, including ones they schedule.
    fn run_all_timers(&self);
    /// Flushes only the timers already pending, not ones they schedule.
    fn run_only_pending_timers(&self);
    /// Cancels every pending timer without running it.
    fn clear_all_timers(&self);
}

/// The evaluation sandbox hosting one test file.
pub trait Environment {
    /// The fresh global object, or `None` once the Environment has been
    /// torn down (spec §4.4 step 1, §5 "Cancellation").
    fn global(&self) -> Option<GlobalHandle>;

    /// Evaluates arbitrary source text under `filename`, returning the
    /// single callable it evaluates to (spec §4.4 step 8).
    ///
    /// # Errors
    /// Propagates a syntax or evaluation error from the underlying
    /// engine.
    fn run_source_text(&self, source: &str, filename: &Path) -> JsResult<ModuleFactory>;

    /// The Environment's timer facility.
    fn fake_timers(&self) -> Rc<dyn FakeTimers>;

    /// The test file's own path.
    fn test_file_path(&self) -> &Path;

    /// Parses `source` using the sandbox's own JSON facility (spec
    /// §4.4: a `.json` file's exports are "the result of parsing its
    /// UTF-8 contents with the Environment's JSON facility"). Not part
    /// of spec §6's collaborator-contract bullet list, but named
    /// explicitly enough in §4.4 to model as a real method rather than
    /// fold into `run_source_text`, whose contract is wrapper-shaped
    /// and returns a callable, not a bare value.
    ///
    /// # Errors
    /// Propagates a parse error from the underlying engine.
    fn parse_json(&self, source: &str) -> JsResult<crate::value::JsValue>;

    /// The out-of-scope assertion library `jest.addMatchers` delegates
    /// to (spec §1, §4.6).
    fn assertion_library(&self) -> Rc<dyn crate::runtime_api::AssertionLibrary>;

    /// Hands a platform built-in's name to the host import mechanism
    /// (spec §4.1 step 1, §8 scenario 1). Built-ins are never cached in
    /// either registry (invariant 5 in spec §3), so every call reaches
    /// this method directly.
    ///
    /// # Errors
    /// Propagates a failure from the host import mechanism.
    fn import_core_module(&self, name: &str) -> JsResult<crate::value::JsValue>;
}

/// Everything a freshly evaluated module's wrapper function is invoked
/// with (spec §4.4 step 8).
///
/// `this` is not modeled separately: per this crate's reading of the
/// spec (recorded in `DESIGN.md`), it is always `exports`, so exposing
/// both would just be redundant plumbing specific to how a real JS
/// engine binds `this`.
pub struct ModuleArgs {
    /// The `module` object, exposing `module.exports`.
    pub module: JsObject,
    /// `module.exports`, provided again on its own the way Node/Jest's
    /// wrapper signature does.
    pub exports: JsObject,
    /// The file's bound `require`.
    pub require: BoundRequire,
    /// The directory containing `filename`.
    pub dirname: std::path::PathBuf,
    /// The module's own absolute path.
    pub filename: std::path::PathBuf,
    /// The Environment's global object, if still alive.
    pub global: Option<GlobalHandle>,
    /// The per-module `jest` runtime API.
    pub jest: RuntimeApi,
    /// The coverage data sink, if coverage is active for this file.
    pub coverage_sink: Option<JsObject>,
}
