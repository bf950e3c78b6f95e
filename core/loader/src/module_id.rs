//! Canonical module identity (spec §3, §4.1).

use std::fmt;
use std::path::{Path, PathBuf};

/// Which family a resolved import belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionKind {
    /// A platform built-in, passed through to the host import mechanism
    /// and never cached (invariant 5 in spec §3).
    Core,
    /// Anything resolved through the filesystem or the `ResourceMap`.
    User,
}

/// The path list separator used to encode a [`ModuleId`] as a single
/// string. Chosen, as the spec requires, because it cannot appear
/// inside a path component on the host platform.
#[cfg(windows)]
const SEP: char = ';';
#[cfg(not(windows))]
const SEP: char = ':';

/// The canonical identity of a resolved import: a real path, a mock
/// path, or both, plus whether it's a core module.
///
/// At most one of `real_path`/`mock_path` is ever *returned* from a
/// single lookup (invariant 2 in spec §3), but a `ModuleId` can still
/// name both at once, e.g. a module with both a real file and a
/// `__mocks__` sibling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleId {
    /// Core vs. user module.
    pub kind: ResolutionKind,
    /// The real (non-mock) absolute path, if resolution found one.
    pub real_path: Option<PathBuf>,
    /// The manual-mock absolute path, if resolution found one.
    pub mock_path: Option<PathBuf>,
}

impl ModuleId {
    /// Builds a core-module id. Core modules never carry a mock path.
    #[must_use]
    pub fn core(name: impl Into<PathBuf>) -> Self {
        Self {
            kind: ResolutionKind::Core,
            real_path: Some(name.into()),
            mock_path: None,
        }
    }

    /// Builds a user-module id from whichever paths resolution found.
    #[must_use]
    pub fn user(real_path: Option<PathBuf>, mock_path: Option<PathBuf>) -> Self {
        Self {
            kind: ResolutionKind::User,
            real_path,
            mock_path,
        }
    }

    /// Encodes the id as the single-string form described in spec
    /// §4.1: `kind SEP real|∅ SEP mock|∅`.
    #[must_use]
    pub fn encode(&self) -> String {
        let kind = match self.kind {
            ResolutionKind::Core => "core",
            ResolutionKind::User => "user",
        };
        format!(
            "{kind}{SEP}{}{SEP}{}",
            display_opt(self.real_path.as_deref()),
            display_opt(self.mock_path.as_deref()),
        )
    }
}

fn display_opt(path: Option<&Path>) -> String {
    path.map_or_else(String::new, |p| p.display().to_string())
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
