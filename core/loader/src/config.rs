//! `LoaderConfig` (spec §3, §6): immutable per-test configuration.

use std::path::PathBuf;

use regex::Regex;

use crate::error::{JsResult, LoaderError};

/// One `moduleNameMapper` rewrite rule.
///
/// Per spec §9's first Open Question, the source this spec was
/// distilled from installs `canonical_name` literally, with no
/// capture-group substitution — this crate follows that behavior
/// rather than guessing at a richer one (see `DESIGN.md`).
#[derive(Debug, Clone)]
pub struct NameMapperRule {
    /// Compiled pattern tested against the requested specifier.
    pub pattern: Regex,
    /// The literal replacement name installed on a match.
    pub canonical_name: String,
}

/// Immutable, per-test-file configuration (spec §3's `LoaderConfig`
/// row). Supplied once at [`Loader`](crate::loader::Loader)
/// construction and never mutated afterward.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Ordered candidate extensions tried during filesystem resolution
    /// (spec §4.1 step 3).
    pub module_file_extensions: Vec<String>,
    /// Ordered `(pattern, canonicalName)` rewrites, applied before
    /// resolution (spec §4.1 step 7).
    pub name_mapper: Vec<NameMapperRule>,
    /// Paths the Resource Indexer should skip. Carried for config-surface
    /// completeness (spec §6); the core itself never scans the
    /// filesystem for resources.
    pub module_path_ignore_patterns: Vec<Regex>,
    /// Paths that resolve to real even when auto-mock is on (spec §4.2
    /// step 8).
    pub unmocked_module_path_patterns: Vec<Regex>,
    /// Default state of the global auto-mock flag.
    pub automock: bool,
    /// The framework's own assertion library path; always delivered as
    /// real regardless of auto-mock or unmock patterns (spec §4.2 step
    /// 7).
    pub vendor_path: Option<PathBuf>,
    /// Additional, ordered search roots consulted during filesystem
    /// resolution (spec §4.1 step 3), sourced from `testPathDirs` plus
    /// whatever the environment-variable surface (spec §6) contributed.
    pub search_roots: Vec<PathBuf>,
    /// Whether coverage collection is enabled at all.
    pub collect_coverage: bool,
    /// If non-empty, coverage is collected only for files whose path is
    /// listed here (spec §4.4 step 3). Empty means "every selected
    /// file", subject to `collect_coverage`.
    pub collect_coverage_only_from: Vec<PathBuf>,
    /// Cache directory used to derive the resource-map cache file path
    /// (spec §5, §6). Opaque to the core.
    pub cache_directory: Option<PathBuf>,
    /// Name used alongside `cache_directory` to derive the resource-map
    /// cache file path.
    pub name: Option<String>,
    /// Frozen bag surfaced to tests via `jest.getTestEnvData()`.
    pub test_env_data: std::collections::BTreeMap<String, String>,
}

impl LoaderConfig {
    /// Starts a builder with the spec's defaults: auto-mock on,
    /// `.js`/`.json` extensions, no name mapping, no unmock patterns.
    #[must_use]
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::default()
    }

    /// Parses a config from TOML, the format this lineage's tooling
    /// (`boa_tester`, `tools/test262`) uses for run configuration rather
    /// than hand-writing `LoaderConfig` values in Rust.
    ///
    /// # Errors
    /// Returns [`LoaderError::Config`] wrapping the underlying parse error
    /// (TOML and regex-compilation failures are both reported this way,
    /// since neither maps onto a spec-defined error kind).
    pub fn from_toml(source: &str) -> JsResult<Self> {
        let raw: RawLoaderConfig = toml::from_str(source)
            .map_err(|e| LoaderError::Config(e.to_string()))?;
        raw.compile()
    }
}

/// The serde-deserializable, uncompiled mirror of [`LoaderConfig`].
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLoaderConfig {
    #[serde(default)]
    module_file_extensions: Vec<String>,
    #[serde(default)]
    module_name_mapper: Vec<(String, String)>,
    #[serde(default)]
    module_path_ignore_patterns: Vec<String>,
    #[serde(default)]
    unmocked_module_path_patterns: Vec<String>,
    #[serde(default)]
    automock: Option<bool>,
    #[serde(default)]
    vendor_path: Option<PathBuf>,
    #[serde(default)]
    test_path_dirs: Vec<PathBuf>,
    #[serde(default)]
    collect_coverage: bool,
    #[serde(default)]
    collect_coverage_only_from: Vec<PathBuf>,
    #[serde(default)]
    cache_directory: Option<PathBuf>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    test_env_data: std::collections::BTreeMap<String, String>,
}

impl RawLoaderConfig {
    fn compile(self) -> JsResult<LoaderConfig> {
        let mut builder = LoaderConfig::builder();
        if !self.module_file_extensions.is_empty() {
            builder = builder.extensions(self.module_file_extensions);
        }
        for (pattern, canonical_name) in self.module_name_mapper {
            builder = builder.name_mapping(&pattern, canonical_name)?;
        }
        for pattern in self.module_path_ignore_patterns {
            builder = builder.ignore_pattern(&pattern)?;
        }
        for pattern in self.unmocked_module_path_patterns {
            builder = builder.unmock_pattern(&pattern)?;
        }
        if let Some(automock) = self.automock {
            builder = builder.automock(automock);
        }
        if let Some(vendor_path) = self.vendor_path {
            builder = builder.vendor_path(vendor_path);
        }
        for root in self.test_path_dirs {
            builder = builder.search_root(root);
        }
        builder = builder.collect_coverage(self.collect_coverage);
        for path in self.collect_coverage_only_from {
            builder = builder.collect_coverage_only_from(path);
        }
        if let Some(dir) = self.cache_directory {
            builder = builder.cache_directory(dir);
        }
        if let Some(name) = self.name {
            builder = builder.name(name);
        }
        for (k, v) in self.test_env_data {
            builder = builder.test_env_data(k, v);
        }
        Ok(builder.build())
    }
}

/// Fluent builder for [`LoaderConfig`], following this lineage's
/// `Context::builder()` convention.
#[derive(Debug, Default)]
pub struct LoaderConfigBuilder {
    module_file_extensions: Vec<String>,
    name_mapper: Vec<NameMapperRule>,
    module_path_ignore_patterns: Vec<Regex>,
    unmocked_module_path_patterns: Vec<Regex>,
    automock: Option<bool>,
    vendor_path: Option<PathBuf>,
    search_roots: Vec<PathBuf>,
    collect_coverage: bool,
    collect_coverage_only_from: Vec<PathBuf>,
    cache_directory: Option<PathBuf>,
    name: Option<String>,
    test_env_data: std::collections::BTreeMap<String, String>,
}

impl LoaderConfigBuilder {
    /// Overrides the default `["js", "json"]` extension list.
    #[must_use]
    pub fn extensions(mut self, extensions: Vec<String>) -> Self {
        self.module_file_extensions = extensions;
        self
    }

    /// Appends a `moduleNameMapper` rule. Rules are tried in the order
    /// added; the first match wins (spec §4.1 step 7, §8
    /// "Name-map precedence").
    ///
    /// # Errors
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn name_mapping(
        mut self,
        pattern: &str,
        canonical_name: impl Into<String>,
    ) -> JsResult<Self> {
        let pattern = Regex::new(pattern).map_err(|e| LoaderError::Config(e.to_string()))?;
        self.name_mapper.push(NameMapperRule {
            pattern,
            canonical_name: canonical_name.into(),
        });
        Ok(self)
    }

    /// Appends a `modulePathIgnorePatterns` entry.
    ///
    /// # Errors
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn ignore_pattern(mut self, pattern: &str) -> JsResult<Self> {
        self.module_path_ignore_patterns
            .push(Regex::new(pattern).map_err(|e| LoaderError::Config(e.to_string()))?);
        Ok(self)
    }

    /// Appends an `unmockedModulePathPatterns` entry.
    ///
    /// # Errors
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn unmock_pattern(mut self, pattern: &str) -> JsResult<Self> {
        self.unmocked_module_path_patterns
            .push(Regex::new(pattern).map_err(|e| LoaderError::Config(e.to_string()))?);
        Ok(self)
    }

    /// Sets the auto-mock default. Defaults to `true`.
    #[must_use]
    pub fn automock(mut self, automock: bool) -> Self {
        self.automock = Some(automock);
        self
    }

    /// Sets the vendor path exempted from mocking (spec §4.2 step 7).
    #[must_use]
    pub fn vendor_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.vendor_path = Some(path.into());
        self
    }

    /// Appends a search root.
    #[must_use]
    pub fn search_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.search_roots.push(root.into());
        self
    }

    /// Parses `env_value` as a colon- (or, on Windows, semicolon-)
    /// delimited list of additional search roots, the way spec §6's
    /// "Environment variables" surface describes, and appends each one.
    #[must_use]
    pub fn search_roots_from_env(mut self, env_value: &str) -> Self {
        let sep = if cfg!(windows) { ';' } else { ':' };
        for root in env_value.split(sep).filter(|s| !s.is_empty()) {
            self.search_roots.push(PathBuf::from(root));
        }
        self
    }

    /// Enables or disables coverage collection.
    #[must_use]
    pub fn collect_coverage(mut self, enabled: bool) -> Self {
        self.collect_coverage = enabled;
        self
    }

    /// Restricts coverage collection to this path (may be called
    /// repeatedly).
    #[must_use]
    pub fn collect_coverage_only_from(mut self, path: impl Into<PathBuf>) -> Self {
        self.collect_coverage_only_from.push(path.into());
        self
    }

    /// Sets the cache directory.
    #[must_use]
    pub fn cache_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_directory = Some(dir.into());
        self
    }

    /// Sets the configuration name used to derive the resource-map
    /// cache file path.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds an entry to the frozen `testEnvData` bag.
    #[must_use]
    pub fn test_env_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.test_env_data.insert(key.into(), value.into());
        self
    }

    /// Finishes the builder.
    #[must_use]
    pub fn build(self) -> LoaderConfig {
        LoaderConfig {
            module_file_extensions: if self.module_file_extensions.is_empty() {
                vec!["js".to_owned(), "json".to_owned()]
            } else {
                self.module_file_extensions
            },
            name_mapper: self.name_mapper,
            module_path_ignore_patterns: self.module_path_ignore_patterns,
            unmocked_module_path_patterns: self.unmocked_module_path_patterns,
            automock: self.automock.unwrap_or(true),
            vendor_path: self.vendor_path,
            search_roots: self.search_roots,
            collect_coverage: self.collect_coverage,
            collect_coverage_only_from: self.collect_coverage_only_from,
            cache_directory: self.cache_directory,
            name: self.name,
            test_env_data: self.test_env_data,
        }
    }
}
