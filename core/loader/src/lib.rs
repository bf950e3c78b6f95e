//! Module Loader core: resolves module identifiers, maintains real and
//! mock module registries, and evaluates modules in an isolated
//! Environment for a single test file, the way `jest-runtime` does for
//! a Jest worker.
//!
//! The parser, transpiler, JS engine, mock-shape introspection, and
//! on-disk resource indexing are all out of scope for this crate; it
//! only defines the seams (the [`resolver::Resolver`],
//! [`environment::Environment`], [`transformer::Transformer`],
//! [`mock_synth::MockSynthesizer`], [`resource_map::ResourceMap`], and
//! [`coverage::CoverageCollector`] traits) that a real embedding wires
//! up, and owns the stateful orchestration on top of them: the
//! [`loader::Loader`] itself.

mod automock;
mod config;
mod coverage;
mod environment;
mod error;
mod executor;
mod loader;
mod mock_synth;
mod module_id;
mod policy;
mod registry;
mod resolver;
mod resource_map;
mod runtime_api;
mod transformer;
mod value;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{LoaderConfig, LoaderConfigBuilder, NameMapperRule};
pub use coverage::{CoverageCollector, CoverageCollectorFactory, CoverageStore};
pub use environment::{Environment, FakeTimers, GlobalHandle, GlobalObject, ModuleArgs, ModuleFactory};
pub use error::{JsResult, LoaderError};
pub use executor::BoundRequire;
pub use loader::Loader;
pub use mock_synth::{MockShape, MockSynthesizer};
pub use module_id::{ModuleId, ResolutionKind};
pub use resource_map::{Resource, ResourceData, ResourceKind, ResourceMap};
pub use runtime_api::{AssertionLibrary, RuntimeApi};
pub use transformer::{PassthroughTransformer, Transformer};
pub use value::{JsFunction, JsObject, JsValue};
