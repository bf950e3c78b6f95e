//! Error kinds for the Loader core (spec §7).

use std::path::PathBuf;

use crate::value::JsValue;

/// The result type used throughout this crate, mirroring the teacher's
/// `JsResult<T>`.
pub type JsResult<T> = Result<T, LoaderError>;

/// Everything that can go wrong inside the Loader core.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// Resolution exhausted every strategy in §4.1 and no manual mock
    /// stood in for the name either.
    #[error("cannot find module '{name}' from '{}'", importer.display())]
    ModuleNotFound {
        /// The requested specifier.
        name: String,
        /// The importing file.
        importer: PathBuf,
    },

    /// The Mock Synthesizer returned no shape for a real module's
    /// exports during automock synthesis (§4.5 step 5).
    #[error("could not synthesize a mock for '{}': no shape could be extracted", path.display())]
    MockExtractionFailed {
        /// The real module's absolute path.
        path: PathBuf,
    },

    /// A coverage accessor was called but coverage was never enabled.
    #[error("coverage was not collected for this run")]
    CoverageDisabled,

    /// A dependency-graph query named a path with no matching resource.
    #[error("no resource is registered for path '{}'", path.display())]
    UnknownModulePath {
        /// The path that was queried.
        path: PathBuf,
    },

    /// A dependency-graph query targeted a resource of kind
    /// `ProjectConfig` or `Other`, which have no dependency edges.
    #[error("resource is not a Source or ManualMock, and has no dependencies")]
    InvalidResourceKind,

    /// Reading a module's source from disk (or wherever the
    /// `ResourceMap` points) failed.
    #[error("could not read module source: {0}")]
    Io(#[from] std::io::Error),

    /// A `LoaderConfig` failed to build: an invalid regular expression
    /// or an unparseable TOML document. Not named in spec §7 because the
    /// spec doesn't describe config loading at all (see `SPEC_FULL.md`
    /// A.4); added for this ambient concern the same way the teacher's
    /// own config surfaces report parse errors.
    #[error("invalid loader configuration: {0}")]
    Config(String),

    /// Evaluating a module, a transform, or a call through the bound
    /// `require` raised an arbitrary value, the way a JS `throw`
    /// statement can throw anything, not just an `Error`.
    #[error("module evaluation threw: {0:?}")]
    Thrown(JsValue),

    /// A native-extension module (spec §4.4: "delegated to the host
    /// import mechanism") was requested but no host importer is wired
    /// up for this Environment.
    #[error("no host import mechanism is configured for native module '{}'", path.display())]
    UnsupportedExtension {
        /// The native module's resolved path.
        path: PathBuf,
    },
}
