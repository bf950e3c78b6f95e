//! The Executor (spec §4.4): reads a module's source, transforms it,
//! and invokes it inside the Environment with a bound `require`.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use crate::coverage::CoverageCollectorFactory;
use crate::environment::{Environment, ModuleArgs};
use crate::error::JsResult;
use crate::loader::Loader;
use crate::registry::ModuleRecord;
use crate::runtime_api::RuntimeApi;
use crate::transformer::Transformer;
use crate::value::{JsObject, JsValue};

/// The property name instrumented sources write coverage hits into,
/// matching the conventional Istanbul-style global sink name.
const COVERAGE_SINK_NAME: &str = "__coverage__";

/// The currently-executing module's identity, saved and restored around
/// one [`Executor::execute`] call (spec §4.4 steps 4 and 9).
pub type CurrentModuleCell = RefCell<Option<(PathBuf, bool)>>;

/// RAII guard that restores the previously-executing module path (and
/// manual-mock flag) when dropped, on both normal and exceptional
/// completion — spec §4.4 step 9's "always restore... on both normal
/// and exceptional completion", implemented as an exception-safety
/// pattern rather than a manual try/finally.
pub struct ExecutionGuard<'a> {
    cell: &'a CurrentModuleCell,
    previous: Option<(PathBuf, bool)>,
}

impl<'a> ExecutionGuard<'a> {
    /// Pushes `(path, is_manual_mock)` as current, remembering whatever
    /// was current before.
    pub fn enter(cell: &'a CurrentModuleCell, path: PathBuf, is_manual_mock: bool) -> Self {
        let previous = cell.replace(Some((path, is_manual_mock)));
        Self { cell, previous }
    }
}

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        *self.cell.borrow_mut() = self.previous.take();
    }
}

/// The bound `require` handed to every evaluated module (spec §4.6).
///
/// Holds a [`Weak`] reference back to the owning [`Loader`]: a
/// [`ModuleRecord`] stores its own `BoundRequire`, and the Loader owns
/// the registry that owns the record, so a strong back-reference here
/// would form an `Rc` cycle that never drops.
#[derive(Clone)]
pub struct BoundRequire {
    loader: Weak<Loader>,
    importer: PathBuf,
}

impl BoundRequire {
    pub(crate) fn new(loader: Weak<Loader>, importer: PathBuf) -> Self {
        Self { loader, importer }
    }

    fn loader(&self) -> Rc<Loader> {
        self.loader
            .upgrade()
            .expect("BoundRequire outlived its Loader")
    }

    /// `require(name)`: policy-mediated real-or-mock delivery.
    ///
    /// # Errors
    /// Propagates resolution, policy, or evaluation failures.
    pub fn call(&self, name: &str) -> JsResult<JsValue> {
        self.loader().require_module_or_mock(&self.importer, name)
    }

    /// `require.resolve(name)`: the absolute path the Resolver would
    /// deliver, preferring the real path and falling back to the mock
    /// path when no real file exists.
    ///
    /// # Errors
    /// Propagates a resolution failure.
    pub fn resolve(&self, name: &str) -> JsResult<PathBuf> {
        let id = self.loader().resolver().resolve(&self.importer, name)?;
        Ok(id.real_path.or(id.mock_path).unwrap_or_else(|| PathBuf::from(name)))
    }

    /// `require.requireMock(name)`: force the mock branch.
    ///
    /// # Errors
    /// Propagates resolution or evaluation failures.
    pub fn require_mock(&self, name: &str) -> JsResult<JsValue> {
        self.loader().require_mock(&self.importer, name)
    }

    /// `require.requireActual(name)`: force the real branch.
    ///
    /// # Errors
    /// Propagates resolution or evaluation failures.
    pub fn require_actual(&self, name: &str) -> JsResult<JsValue> {
        self.loader().require_module(&self.importer, name)
    }

    /// `require.cache`: an empty container, present only so code that
    /// enumerates it doesn't crash (spec §4.6).
    #[must_use]
    pub fn cache(&self) -> JsObject {
        JsObject::new()
    }

    /// `require.extensions`: likewise empty.
    #[must_use]
    pub fn extensions(&self) -> JsObject {
        JsObject::new()
    }
}

/// Reads, transforms, and evaluates one real module (spec §4.4).
pub struct Executor {
    environment: Rc<dyn Environment>,
    transformer: Rc<dyn Transformer>,
    coverage: Option<Rc<dyn CoverageCollectorFactory>>,
}

impl Executor {
    /// Builds an executor over its three out-of-scope collaborators
    /// (spec §1): the Environment, the Transformer, and (optionally) a
    /// coverage collector factory.
    #[must_use]
    pub fn new(
        environment: Rc<dyn Environment>,
        transformer: Rc<dyn Transformer>,
        coverage: Option<Rc<dyn CoverageCollectorFactory>>,
    ) -> Self {
        Self {
            environment,
            transformer,
            coverage,
        }
    }

    /// Executes `record`'s module, populating `record.exports` in
    /// place.
    ///
    /// `current_module` is the Loader's shared "currently executing"
    /// cell, pushed and popped via [`ExecutionGuard`].
    ///
    /// # Errors
    /// Propagates a Transformer failure, an Environment evaluation
    /// failure, or a module-level exception
    /// ([`LoaderError::Thrown`](crate::error::LoaderError::Thrown)).
    pub fn execute(
        &self,
        loader: &Rc<Loader>,
        record: &Rc<ModuleRecord>,
        is_manual_mock: bool,
        current_module: &CurrentModuleCell,
    ) -> JsResult<()> {
        // Step 1: a torn-down Environment makes this a silent no-op —
        // there is no observer left for the result (spec §5
        // "Cancellation").
        let Some(global) = self.environment.global() else {
            return Ok(());
        };

        // Step 2.
        let mut source = self.transformer.transform(&record.path, loader.config())?;

        // Step 3.
        let coverage_sink = self.instrument_if_selected(loader, record, &mut source);

        // Step 4 (and step 9 via Drop).
        let _guard = ExecutionGuard::enter(current_module, record.path.clone(), is_manual_mock);

        // Step 5 is handled at pre-allocation time (see
        // `Registry::get_or_preallocate_real`): the sentinel parent is
        // fixed for the Loader's whole lifetime, so there is nothing
        // left to assign here.

        // Step 6.
        let bound_require = BoundRequire::new(Rc::downgrade(loader), record.path.clone());
        record.set_require(bound_require.clone());

        // Steps 7-8: wrapper construction and extraction are the
        // Environment's concern (`run_source_text` already returns the
        // extracted callable); the Executor only has to invoke it with
        // the eight bound values.
        let factory = self.environment.run_source_text(&source, &record.path)?;

        let module_obj = JsObject::new();
        module_obj.set("exports", JsValue::Object(record.exports.clone()));

        let args = ModuleArgs {
            module: module_obj.clone(),
            exports: record.exports.clone(),
            require: bound_require,
            dirname: record
                .path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
            filename: record.path.clone(),
            global: Some(global),
            jest: RuntimeApi::new(Rc::clone(loader), record.path.clone()),
            coverage_sink,
        };

        factory(args)?;

        reconcile_reassigned_exports(&module_obj, &record.exports);

        Ok(())
    }

    fn instrument_if_selected(
        &self,
        loader: &Rc<Loader>,
        record: &Rc<ModuleRecord>,
        source: &mut String,
    ) -> Option<JsObject> {
        let config = loader.config();
        let selected = config.collect_coverage
            && (config.collect_coverage_only_from.is_empty()
                || config
                    .collect_coverage_only_from
                    .iter()
                    .any(|p| p == &record.path));
        if !selected {
            return None;
        }
        let factory = self.coverage.as_ref()?;
        let collector = factory.collector_for(source, &record.path);
        *source = collector.instrumented_source(COVERAGE_SINK_NAME);
        collector.coverage_data_store().0.as_object().cloned()
    }
}

/// Reconciles a `module.exports = <newObject>` reassignment back onto
/// the registry's stable exports slot, so later holders of
/// `record.exports` still observe the final state even though they
/// never had a reference to the new object.
fn reconcile_reassigned_exports(module_obj: &JsObject, canonical: &JsObject) {
    let JsValue::Object(current) = module_obj.get("exports") else {
        return;
    };
    if current.is_same(canonical) {
        return;
    }
    for key in current.keys() {
        canonical.set(key.clone(), current.get(&key));
    }
}
