//! The `Mock Synthesizer` collaborator contract (spec §6).
//!
//! Introspecting an arbitrary exports value and reconstructing a stub
//! from it is explicitly out of scope (spec §1); the Automocker only
//! ever talks to it through this trait.

use crate::value::JsValue;

/// An opaque descriptor of a real module's exported shape, cached per
/// absolute path for the Loader's lifetime (spec §3's `MockShape` row).
#[derive(Debug, Clone)]
pub struct MockShape(pub JsValue);

/// Extracts shape descriptors from real values and reconstructs stubs
/// from them.
pub trait MockSynthesizer {
    /// Extracts a shape descriptor from `value`, or `None` if nothing
    /// useful could be extracted (spec §4.5 step 5,
    /// [`MockExtractionFailed`](crate::error::LoaderError::MockExtractionFailed)).
    fn get_metadata(&self, value: &JsValue) -> Option<MockShape>;

    /// Reconstructs a fresh stub from a cached shape (spec §4.5 step 6).
    fn generate_from_metadata(&self, shape: &MockShape) -> JsValue;

    /// Produces a bare mock function, for `jest.genMockFunction` /
    /// `jest.genMockFn` (spec §4.6).
    fn get_mock_function(&self) -> JsValue;
}
