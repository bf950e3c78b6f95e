//! Support library behind the `loader-cli` binary.
//!
//! Everything here is a concrete stand-in for one of
//! [`loader_core`]'s out-of-scope collaborator traits (a real
//! `ResourceMap`, a real `Environment`, a real `MockSynthesizer`), kept
//! in its own library target so the `demos` examples can reuse it
//! instead of re-deriving their own fixtures the way the core crate's
//! own `#[cfg(test)]`-only `testutil` module does for unit tests.

mod fs_resource_map;
mod interpreter;
mod mock_synth;
mod script_environment;

pub use fs_resource_map::FsResourceMap;
pub use mock_synth::ShapeCopyingMockSynthesizer;
pub use script_environment::ScriptEnvironment;
