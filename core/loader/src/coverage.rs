//! The `Coverage Collector` collaborator contract (spec §6).
//!
//! Instrumentation itself is explicitly out of scope (spec §1); the
//! Executor only ever talks to it through this trait, and only when
//! coverage is enabled for the file being executed.

use std::path::Path;

use crate::value::JsValue;

/// Opaque per-file instrumented execution data (spec §3's
/// `CoverageStore` row). Never inspected by the core.
#[derive(Debug, Clone)]
pub struct CoverageStore(pub JsValue);

/// One file's instrumentation state.
pub trait CoverageCollector {
    /// Returns the data sink instrumented code should write hit counts
    /// into.
    fn coverage_data_store(&self) -> CoverageStore;

    /// Returns `source` rewritten to report into a sink named
    /// `sink_name` (spec §4.4 step 3).
    fn instrumented_source(&self, sink_name: &str) -> String;

    /// Extracts this file's coverage info after evaluation, for
    /// [`Loader::get_coverage_for_file_path`](crate::loader::Loader::get_coverage_for_file_path).
    fn extract_runtime_coverage_info(&self) -> JsValue;
}

/// Constructs (or retrieves an already-constructed) [`CoverageCollector`]
/// for a file, mirroring the collaborator's constructor contract
/// `new(source, filename)` (spec §6).
pub trait CoverageCollectorFactory {
    /// Returns the collector for `filename`, constructing it from
    /// `source` the first time this path is seen.
    fn collector_for(&self, source: &str, filename: &Path) -> std::rc::Rc<dyn CoverageCollector>;

    /// Returns every collector created so far, keyed by path, for
    /// [`Loader::get_all_coverage_info`](crate::loader::Loader::get_all_coverage_info).
    fn all_collected_paths(&self) -> Vec<std::path::PathBuf>;
}
