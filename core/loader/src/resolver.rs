//! The Resolver (spec §4.1): maps an importer path plus a requested
//! identifier to a canonical [`ModuleId`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::LoaderConfig;
use crate::error::{JsResult, LoaderError};
use crate::module_id::ModuleId;
use crate::resource_map::{Resource, ResourceKind, ResourceMap};

/// Resolves import requests to canonical module identities.
///
/// Per the design note in spec §9, this is "stateful only in caches":
/// every public method is a pure function of its arguments plus the
/// immutable `config`/`resource_map`, backed by one memo table (the
/// package-manifest-by-name index used by the package-shadow fallback
/// in step 4).
pub struct Resolver {
    config: LoaderConfig,
    resource_map: Rc<dyn ResourceMap>,
    core_modules: std::collections::HashSet<String>,
    manifest_by_name: RefCell<Option<HashMap<String, Resource>>>,
}

impl Resolver {
    /// Creates a resolver over `resource_map`, treating the names in
    /// `core_modules` as platform built-ins (spec §4.1 step 1). What
    /// counts as a built-in is host-environment knowledge the spec
    /// leaves external, so it is supplied by the caller rather than
    /// hardcoded.
    pub fn new(
        config: LoaderConfig,
        resource_map: Rc<dyn ResourceMap>,
        core_modules: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            config,
            resource_map,
            core_modules: core_modules.into_iter().collect(),
            manifest_by_name: RefCell::new(None),
        }
    }

    /// The configuration this resolver was built with.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Resolves `requested` as imported from `importer`.
    ///
    /// # Errors
    /// Returns [`LoaderError::ModuleNotFound`] once every strategy in
    /// spec §4.1 is exhausted and no manual mock stands in for the name.
    pub fn resolve(&self, importer: &Path, requested: &str) -> JsResult<ModuleId> {
        if self.core_modules.contains(requested) {
            return Ok(ModuleId::core(requested.to_owned()));
        }

        let name = self.apply_name_mapping(requested);

        let importer_dir = importer.parent().unwrap_or(importer);

        if Self::is_path_form(&name) {
            return self
                .resolve_filesystem(importer_dir, &name)
                .map(|real| ModuleId::user(Some(real.clone()), self.sibling_manual_mock(&real)))
                .ok_or_else(|| Self::not_found(&name, importer));
        }

        if let Some(resource) = self.resource_map.get_resource(ResourceKind::Source, &name) {
            let mock = self.sibling_manual_mock(&resource.path);
            return Ok(ModuleId::user(Some(resource.path), mock));
        }
        if let Some(resource) = self
            .resource_map
            .get_resource(ResourceKind::ManualMock, &name)
        {
            return Ok(ModuleId::user(None, Some(resource.path)));
        }

        // Unknown to the resource map: fall through to filesystem
        // resolution, then the package-shadow fallback (spec §4.1 step
        // 4).
        if let Some(real) = self.resolve_filesystem(importer_dir, &name) {
            let mock = self.sibling_manual_mock(&real);
            return Ok(ModuleId::user(Some(real), mock));
        }
        if let Some(real) = self.resolve_via_manifest(importer_dir, &name) {
            log::trace!("'{name}' resolved via package-shadow fallback to {}", real.display());
            let mock = self.sibling_manual_mock(&real);
            return Ok(ModuleId::user(Some(real), mock));
        }

        Err(Self::not_found(&name, importer))
    }

    fn not_found(name: &str, importer: &Path) -> LoaderError {
        LoaderError::ModuleNotFound {
            name: name.to_owned(),
            importer: importer.to_path_buf(),
        }
    }

    fn apply_name_mapping(&self, requested: &str) -> String {
        for rule in &self.config.name_mapper {
            if rule.pattern.is_match(requested) {
                return rule.canonical_name.clone();
            }
        }
        requested.to_owned()
    }

    fn is_path_form(name: &str) -> bool {
        name.starts_with("./") || name.starts_with("../") || name.starts_with('/')
    }

    fn resolve_filesystem(&self, base_dir: &Path, name: &str) -> Option<PathBuf> {
        if Path::new(name).is_absolute() {
            return self.try_candidate(Path::new(name));
        }
        if let Some(found) = self.try_candidate(&base_dir.join(name)) {
            return Some(found);
        }
        self.config
            .search_roots
            .iter()
            .find_map(|root| self.try_candidate(&root.join(name)))
    }

    fn try_candidate(&self, candidate: &Path) -> Option<PathBuf> {
        if Self::is_regular_or_fifo(candidate) {
            return Some(candidate.to_path_buf());
        }
        for ext in &self.config.module_file_extensions {
            let with_ext = append_extension(candidate, ext);
            if Self::is_regular_or_fifo(&with_ext) {
                return Some(with_ext);
            }
        }
        if candidate.is_dir() {
            let main = self
                .manifest_main_for_dir(candidate)
                .unwrap_or_else(|| "index".to_owned());
            let main_path = candidate.join(&main);
            if Self::is_regular_or_fifo(&main_path) {
                return Some(main_path);
            }
            for ext in &self.config.module_file_extensions {
                let with_ext = append_extension(&main_path, ext);
                if Self::is_regular_or_fifo(&with_ext) {
                    return Some(with_ext);
                }
            }
        }
        None
    }

    fn manifest_main_for_dir(&self, dir: &Path) -> Option<String> {
        let resource = self.resource_map.get_resource_by_path(&dir.join("package.json"))?;
        (resource.kind == ResourceKind::ProjectConfig)
            .then_some(())
            .and_then(|()| resource.data.main)
    }

    fn resolve_via_manifest(&self, importer_dir: &Path, name: &str) -> Option<PathBuf> {
        let mut parts = name.splitn(2, '/');
        let pkg = parts.next()?;
        let rest = parts.next();

        let manifest = self.manifest_named(pkg)?;
        let manifest_dir = manifest.path.parent()?;

        // Directionality check: a package must not shadow a local file
        // that simply happens to live under the importer's own tree.
        if manifest_dir.starts_with(importer_dir) {
            return None;
        }

        let entry = rest
            .map(str::to_owned)
            .or(manifest.data.main)
            .unwrap_or_else(|| "index".to_owned());
        self.resolve_filesystem(manifest_dir, &format!("./{entry}"))
    }

    fn manifest_named(&self, pkg_name: &str) -> Option<Resource> {
        self.ensure_manifest_index();
        self.manifest_by_name
            .borrow()
            .as_ref()
            .expect("index was just populated")
            .get(pkg_name)
            .cloned()
    }

    fn ensure_manifest_index(&self) {
        if self.manifest_by_name.borrow().is_some() {
            return;
        }
        let mut index = HashMap::new();
        for resource in self
            .resource_map
            .get_all_resources_by_type(ResourceKind::ProjectConfig)
        {
            if let Some(name) = resource.data.name.clone() {
                index.entry(name).or_insert(resource);
            }
        }
        *self.manifest_by_name.borrow_mut() = Some(index);
    }

    /// The `__mocks__/<basename>` sibling check (spec §4.1 step 6).
    fn sibling_manual_mock(&self, real_path: &Path) -> Option<PathBuf> {
        let dir = real_path.parent()?;
        let basename = real_path.file_name()?;
        let candidate = dir.join("__mocks__").join(basename);
        let resource = self.resource_map.get_resource_by_path(&candidate)?;
        (resource.kind == ResourceKind::ManualMock).then_some(resource.path)
    }

    fn is_regular_or_fifo(path: &Path) -> bool {
        let Ok(meta) = std::fs::metadata(path) else {
            return false;
        };
        let file_type = meta.file_type();
        #[cfg(unix)]
        {
            file_type.is_file() || std::os::unix::fs::FileTypeExt::is_fifo(&file_type)
        }
        #[cfg(not(unix))]
        {
            file_type.is_file()
        }
    }
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut with_ext = path.as_os_str().to_owned();
    with_ext.push(".");
    with_ext.push(ext);
    PathBuf::from(with_ext)
}

#[cfg(test)]
mod tests;
