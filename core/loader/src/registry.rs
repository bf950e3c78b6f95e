//! The Registry (spec §4.3): real/mock module caches, two-phase
//! pre-allocation for cycle safety, and reset semantics.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::environment::GlobalHandle;
use crate::executor::BoundRequire;
use crate::value::{JsObject, JsValue};

/// One evaluation result of a real module (spec §3's `ModuleRecord`
/// row).
///
/// `exports` is pre-allocated empty and mutated in place by the
/// Executor as the module's top level runs — this is the "mutable
/// exports slot" spec §9 asks implementers to model with a reference
/// cell rather than an immutable value, which is exactly what
/// [`JsObject`] already is.
pub struct ModuleRecord {
    /// The module's own absolute path (`__filename`).
    pub path: PathBuf,
    /// The module's exports container, empty until evaluation runs.
    pub exports: JsObject,
    /// The fixed sentinel parent every module sees (spec §4.4 step 5).
    /// Assigned once at pre-allocation, not mutated afterward, since it
    /// is the same object for every module in a Loader's lifetime.
    pub parent: JsObject,
    require: RefCell<Option<BoundRequire>>,
}

impl ModuleRecord {
    fn new(path: PathBuf, parent: JsObject) -> Rc<Self> {
        Rc::new(Self {
            path,
            exports: JsObject::new(),
            parent,
            require: RefCell::new(None),
        })
    }

    /// The file's bound `require`, once the Executor has attached one
    /// (spec §4.4 step 6).
    #[must_use]
    pub fn require(&self) -> Option<BoundRequire> {
        self.require.borrow().clone()
    }

    /// Attaches this record's bound `require`.
    pub fn set_require(&self, require: BoundRequire) {
        *self.require.borrow_mut() = Some(require);
    }
}

/// The per-Loader real/mock module caches.
pub struct Registry {
    real: RefCell<FxHashMap<PathBuf, Rc<ModuleRecord>>>,
    mock: RefCell<FxHashMap<PathBuf, JsValue>>,
    /// The single sentinel parent object shared by every pre-allocated
    /// [`ModuleRecord`] (spec §4.4 step 5).
    parent_sentinel: JsObject,
}

impl Registry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            real: RefCell::new(FxHashMap::default()),
            mock: RefCell::new(FxHashMap::default()),
            parent_sentinel: JsObject::new(),
        }
    }

    /// Returns the already-evaluated (or mid-evaluation) record for
    /// `path`, if one exists.
    #[must_use]
    pub fn get_real(&self, path: &std::path::Path) -> Option<Rc<ModuleRecord>> {
        self.real.borrow().get(path).cloned()
    }

    /// Returns `path`'s record, pre-allocating an empty one first if
    /// this is the first request for it (spec §4.3's pre-allocation
    /// rule, invariant 1 in spec §3).
    ///
    /// Recursive requires for the same path during evaluation observe
    /// the same, partially-populated, record — this is what makes
    /// circular `require` graphs resolve instead of recursing forever.
    pub fn get_or_preallocate_real(&self, path: &std::path::Path) -> Rc<ModuleRecord> {
        if let Some(existing) = self.real.borrow().get(path) {
            return Rc::clone(existing);
        }
        let record = ModuleRecord::new(path.to_path_buf(), self.parent_sentinel.clone());
        self.real
            .borrow_mut()
            .insert(path.to_path_buf(), Rc::clone(&record));
        record
    }

    /// Returns `path`'s cached mock exports, if any.
    #[must_use]
    pub fn get_mock(&self, path: &std::path::Path) -> Option<JsValue> {
        self.mock.borrow().get(path).cloned()
    }

    /// Caches `exports` as `path`'s mock.
    pub fn insert_mock(&self, path: PathBuf, exports: JsValue) {
        self.mock.borrow_mut().insert(path, exports);
    }

    /// Swaps both maps out for fresh, empty ones, returning the
    /// displaced contents. Used by the Automocker to isolate a real
    /// module's evaluation from the caller's module graph (spec §4.5
    /// step 3).
    pub fn isolate(&self) -> (FxHashMap<PathBuf, Rc<ModuleRecord>>, FxHashMap<PathBuf, JsValue>) {
        (
            std::mem::take(&mut *self.real.borrow_mut()),
            std::mem::take(&mut *self.mock.borrow_mut()),
        )
    }

    /// Restores maps previously displaced by [`Self::isolate`] (spec
    /// §4.5 step 5).
    pub fn restore(&self, real: FxHashMap<PathBuf, Rc<ModuleRecord>>, mock: FxHashMap<PathBuf, JsValue>) {
        *self.real.borrow_mut() = real;
        *self.mock.borrow_mut() = mock;
    }

    /// Clears both registries and the Environment's mock-function state
    /// (spec §4.3 reset semantics, `jest.resetModuleRegistry`).
    ///
    /// Explicit overrides and explicitly set mock slots live in the
    /// Mock Policy Engine and the Runtime API, not here, so they are
    /// untouched by construction — this method has nothing that would
    /// clear them even by accident.
    pub fn reset(&self, global: Option<GlobalHandle>) {
        log::debug!(
            "resetting module registry: {} real, {} mock",
            self.real.borrow().len(),
            self.mock.borrow().len()
        );
        self.real.borrow_mut().clear();
        self.mock.borrow_mut().clear();
        if let Some(global) = global {
            global.clear_mock_functions();
            global.invoke_mock_clear_timers();
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
