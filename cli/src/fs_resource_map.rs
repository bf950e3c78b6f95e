//! A filesystem-backed [`ResourceMap`], the real counterpart to the
//! in-memory `FakeResourceMap` `loader_core`'s own tests use.
//!
//! The real "Resource Indexer" (spec §1) is out of scope for the core
//! crate; this is a minimal, recursive directory scan good enough to
//! drive `loader-cli` against a real project on disk. It classifies
//! every `.js`/`.json` file under a root as a `Source`, files under a
//! `__mocks__` directory as a `ManualMock`, and every `package.json` as
//! a `ProjectConfig`. A file's `required_modules` are discovered with a
//! conservative regex scan for `require("...")`/`require('...')` calls
//! rather than a real parse, since parsing JavaScript is itself out of
//! scope here.

use std::fs;
use std::path::{Path, PathBuf};

use loader_core::{Resource, ResourceData, ResourceKind, ResourceMap};
use regex::Regex;

/// Scans a directory tree once at construction time and serves lookups
/// from the in-memory result afterward; this crate does not watch the
/// filesystem for changes (spec §1 Non-goals).
pub struct FsResourceMap {
    resources: Vec<Resource>,
}

impl FsResourceMap {
    /// Recursively scans `root`, building a resource for every
    /// `.js`/`.json`/`package.json` file found.
    ///
    /// # Errors
    /// Propagates an [`std::io::Error`] from walking the directory tree.
    pub fn scan(root: &Path) -> std::io::Result<Self> {
        let require_pattern =
            Regex::new(r#"require\(\s*["']([^"']+)["']\s*\)"#).expect("static pattern is valid");
        let mut resources = Vec::new();
        scan_dir(root, &require_pattern, &mut resources)?;
        Ok(Self { resources })
    }
}

fn scan_dir(dir: &Path, require_pattern: &Regex, out: &mut Vec<Resource>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            scan_dir(&path, require_pattern, out)?;
            continue;
        }
        if !file_type.is_file() {
            continue;
        }
        if let Some(resource) = resource_for(&path, require_pattern) {
            out.push(resource);
        }
    }
    Ok(())
}

fn resource_for(path: &Path, require_pattern: &Regex) -> Option<Resource> {
    let file_name = path.file_name()?.to_str()?;
    if file_name == "package.json" {
        let contents = fs::read_to_string(path).ok()?;
        let name = extract_json_string_field(&contents, "name");
        let main = extract_json_string_field(&contents, "main");
        return Some(Resource {
            id: name.clone().unwrap_or_else(|| path.display().to_string()),
            kind: ResourceKind::ProjectConfig,
            path: path.to_path_buf(),
            data: ResourceData { name, main },
            required_modules: Vec::new(),
        });
    }

    let extension = path.extension()?.to_str()?;
    if extension != "js" && extension != "json" {
        return None;
    }

    let is_manual_mock = path
        .parent()
        .and_then(Path::file_name)
        .is_some_and(|name| name == "__mocks__");

    let required_modules = if extension == "js" {
        fs::read_to_string(path)
            .ok()
            .map(|source| {
                require_pattern
                    .captures_iter(&source)
                    .map(|c| c[1].to_owned())
                    .collect()
            })
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    Some(Resource {
        id: path.display().to_string(),
        kind: if is_manual_mock {
            ResourceKind::ManualMock
        } else {
            ResourceKind::Source
        },
        path: path.to_path_buf(),
        data: ResourceData::default(),
        required_modules,
    })
}

/// A deliberately naive `"field": "value"` scraper, good enough for the
/// flat `package.json` shape this harness cares about (`name`, `main`)
/// without pulling in a JSON parser for a CLI harness that otherwise has
/// no use for one.
fn extract_json_string_field(contents: &str, field: &str) -> Option<String> {
    let pattern = Regex::new(&format!(r#""{field}"\s*:\s*"([^"]*)""#)).ok()?;
    pattern
        .captures(contents)
        .map(|c| c[1].to_owned())
}

impl ResourceMap for FsResourceMap {
    fn get_resource(&self, kind: ResourceKind, name: &str) -> Option<Resource> {
        self.resources
            .iter()
            .find(|r| r.kind == kind && r.id == name)
            .cloned()
    }

    fn get_resource_by_path(&self, path: &Path) -> Option<Resource> {
        self.resources.iter().find(|r| r.path == path).cloned()
    }

    fn get_all_resources(&self) -> Vec<Resource> {
        self.resources.clone()
    }

    fn get_all_resources_by_type(&self, kind: ResourceKind) -> Vec<Resource> {
        self.resources
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_sources_manual_mocks_and_manifests_with_their_requires() {
        let dir = tempdir();
        fs::create_dir_all(dir.join("__mocks__")).unwrap();
        fs::write(dir.join("package.json"), r#"{"name": "demo", "main": "index.js"}"#).unwrap();
        fs::write(dir.join("index.js"), r#"const x = require("./util");"#).unwrap();
        fs::write(dir.join("util.js"), "exports.noop = true;").unwrap();
        fs::write(dir.join("__mocks__").join("util.js"), "exports.noop = false;").unwrap();

        let map = FsResourceMap::scan(&dir).unwrap();

        let manifest = map
            .get_all_resources_by_type(ResourceKind::ProjectConfig)
            .pop()
            .unwrap();
        assert_eq!(manifest.data.name.as_deref(), Some("demo"));
        assert_eq!(manifest.data.main.as_deref(), Some("index.js"));

        let index = map.get_resource_by_path(&dir.join("index.js")).unwrap();
        assert_eq!(index.required_modules, vec!["./util".to_owned()]);

        let mock = map.get_resource_by_path(&dir.join("__mocks__").join("util.js")).unwrap();
        assert_eq!(mock.kind, ResourceKind::ManualMock);

        fs::remove_dir_all(&dir).unwrap();
    }

    fn tempdir() -> PathBuf {
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock is after the epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "loader-cli-test-{}-{nonce}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }
}
