//! The `ResourceMap` collaborator contract (spec §6).
//!
//! The on-disk scanner that builds this index (the "Resource Indexer")
//! is explicitly out of scope (spec §1); the core only ever reads it
//! through this trait.

use std::path::{Path, PathBuf};

/// What kind of file a [`Resource`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "PascalCase")]
pub enum ResourceKind {
    /// A real, evaluable module.
    Source,
    /// A user-authored manual mock.
    ManualMock,
    /// A `package.json`-like project manifest.
    ProjectConfig,
    /// Anything else the indexer tracks but the Loader never evaluates.
    Other,
}

/// Kind-specific data carried by a [`Resource`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceData {
    /// The declared package name, for `ProjectConfig` resources.
    pub name: Option<String>,
    /// The manifest's `main` entry point, for `ProjectConfig` resources.
    pub main: Option<String>,
}

/// One entry in the external resource index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// The canonical id under which this resource is addressable by
    /// logical name.
    pub id: String,
    /// Which kind of file this is.
    pub kind: ResourceKind,
    /// Its absolute path on disk.
    pub path: PathBuf,
    /// Kind-specific payload.
    pub data: ResourceData,
    /// The identifiers this resource's top level is declared to
    /// `require`, used by [`crate::loader::Loader::get_dependencies_from_path`].
    pub required_modules: Vec<String>,
}

/// Read-only external index of source files, by logical id and by path.
pub trait ResourceMap {
    /// Looks up a resource of a given kind by its canonical logical id.
    fn get_resource(&self, kind: ResourceKind, name: &str) -> Option<Resource>;

    /// Looks up a resource by its absolute path.
    fn get_resource_by_path(&self, path: &Path) -> Option<Resource>;

    /// Returns every resource in the map.
    fn get_all_resources(&self) -> Vec<Resource>;

    /// Returns every resource of a given kind.
    fn get_all_resources_by_type(&self, kind: ResourceKind) -> Vec<Resource>;
}
