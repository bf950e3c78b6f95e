//! The Automocker (spec §4.5): synthesizes a mock by recursively
//! evaluating the real module under isolated registries.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{JsResult, LoaderError};
use crate::loader::Loader;
use crate::mock_synth::{MockShape, MockSynthesizer};
use crate::value::JsValue;

/// Synthesizes automocks, caching shape descriptors per real path.
pub struct Automocker {
    synthesizer: Rc<dyn MockSynthesizer>,
    shapes: RefCell<HashMap<PathBuf, MockShape>>,
}

impl Automocker {
    /// Builds an automocker over its one out-of-scope collaborator, the
    /// Mock Synthesizer.
    #[must_use]
    pub fn new(synthesizer: Rc<dyn MockSynthesizer>) -> Self {
        Self {
            synthesizer,
            shapes: RefCell::new(HashMap::new()),
        }
    }

    /// `jest.genMockFunction` / `jest.genMockFn`: a bare mock function,
    /// with no shape extraction involved.
    #[must_use]
    pub fn gen_mock_function(&self) -> JsValue {
        self.synthesizer.get_mock_function()
    }

    /// Synthesizes a mock for `requested`, as imported from `importer`
    /// (spec §4.5).
    ///
    /// # Errors
    /// Propagates a resolution failure, or
    /// [`LoaderError::MockExtractionFailed`] if the Mock Synthesizer
    /// extracts nothing from the real module's exports.
    pub fn synthesize(
        &self,
        loader: &Rc<Loader>,
        importer: &Path,
        requested: &str,
    ) -> JsResult<JsValue> {
        // Step 1.
        let id = loader.resolver().resolve(importer, requested)?;
        let real_path = id
            .real_path
            .clone()
            .ok_or_else(|| LoaderError::MockExtractionFailed {
                path: id.mock_path.clone().unwrap_or_default(),
            })?;

        // Step 2: cache hit skips straight to generation.
        if let Some(shape) = self.shapes.borrow().get(&real_path) {
            return Ok(self.synthesizer.generate_from_metadata(shape));
        }
        // Sentinel shape, inserted before recursing, makes nested
        // automock requests for the same path during extraction
        // reentrant-safe (spec §5 ordering guarantee 3) instead of
        // infinitely recursive.
        self.shapes
            .borrow_mut()
            .insert(real_path.clone(), MockShape(JsValue::Undefined));

        // Step 3.
        log::trace!("isolating registries to synthesize a mock for {}", real_path.display());
        let (saved_real, saved_mock) = loader.registry().isolate();

        // Step 4: evaluate under the isolated registries so side
        // effects never reach the caller's module graph.
        let result = loader.require_module(importer, requested);

        // Step 5: restore unconditionally, whether step 4 succeeded or
        // not, before propagating any error.
        loader.registry().restore(saved_real, saved_mock);
        log::trace!("registries restored after automock synthesis for {}", real_path.display());
        let exports = result?;

        let shape = self
            .synthesizer
            .get_metadata(&exports)
            .ok_or_else(|| LoaderError::MockExtractionFailed {
                path: real_path.clone(),
            })?;
        self.shapes.borrow_mut().insert(real_path.clone(), shape.clone());

        // Step 6.
        Ok(self.synthesizer.generate_from_metadata(&shape))
    }
}

#[cfg(test)]
mod tests;
