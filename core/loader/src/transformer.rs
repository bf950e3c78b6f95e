//! The `Transformer` collaborator contract (spec §6).
//!
//! The source rewriter itself (syntax transpilation, JSX, etc.) is
//! explicitly out of scope (spec §1).

use std::path::Path;

use crate::config::LoaderConfig;
use crate::error::JsResult;

/// Rewrites a module's source text before evaluation.
pub trait Transformer {
    /// Produces the source to evaluate for `filename`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the transform
    /// itself fails.
    fn transform(&self, filename: &Path, config: &LoaderConfig) -> JsResult<String>;
}

/// A transformer that reads a file's contents unmodified.
///
/// Useful as the default for projects (or tests) with no source
/// rewriting step, the same role `Source::from_filepath` plays for the
/// teacher's module loader when no build step is involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTransformer;

impl Transformer for PassthroughTransformer {
    fn transform(&self, filename: &Path, _config: &LoaderConfig) -> JsResult<String> {
        Ok(std::fs::read_to_string(filename)?)
    }
}
