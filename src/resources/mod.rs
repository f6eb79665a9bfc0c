use std::{
    ffi::OsStr,
    fmt,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::{
    data_structures::{model::ModelPrefab, texture::EnvironmentTexture},
    error::{CaptureError, Result},
};

/**
 * This module contains all logic for discovering and loading models and
 * environment maps from external files.
 */
pub mod environment;
pub mod loader;
pub mod model_queue;

/// Identity of a catalog entry: its path relative to the catalog root, `/`
/// separated, without the file extension (`sub/b` for `<root>/sub/b.fbx`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicalPath(String);

impl LogicalPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Resolve `file` below `root` into a logical path.
    pub fn from_file(root: &Path, file: &Path) -> Option<Self> {
        let relative = file.strip_prefix(root).ok()?;
        let stem = relative.file_stem()?.to_str()?;
        let mut parts = relative
            .parent()
            .into_iter()
            .flat_map(|parent| parent.components())
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        parts.push(stem);
        Some(Self(parts.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The same path as a relative filesystem path.
    pub fn to_relative_path(&self) -> PathBuf {
        self.0.split('/').filter(|part| !part.is_empty()).collect()
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogicalPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One discovered file: where it is and what it is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub file: PathBuf,
    pub logical: LogicalPath,
}

/// The asset layer: turns catalog entries into loaded handles.
///
/// Loading is synchronous; the orchestrator only asks for the next model once
/// the previous orbit finished.
pub trait AssetLoader {
    fn load_model(&mut self, entry: &CatalogEntry) -> Result<ModelPrefab>;

    fn load_environment(&mut self, entry: &CatalogEntry) -> Result<EnvironmentTexture>;

    /// Called after every model load so loaders can drop cached data.
    fn unload_unused(&mut self) {}
}

/// Recursively collect all files below `root` whose extension matches
/// `extension` (case-insensitive, leading dot optional).
///
/// Entries keep the order the filesystem reports them in. An unreadable root is
/// an error, unreadable entries below it are logged and skipped.
pub fn scan_catalog(root: &Path, extension: &str) -> Result<Vec<CatalogEntry>> {
    let extension = extension.trim_start_matches('.');
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(CaptureError::Scan {
                    root: root.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                log::warn!("Skipping unreadable entry below {:?}: {}", root, e);
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_extension(entry.path(), extension) {
            continue;
        }
        match LogicalPath::from_file(root, entry.path()) {
            Some(logical) => entries.push(CatalogEntry {
                file: entry.path().to_path_buf(),
                logical,
            }),
            None => log::warn!("Skipping {:?}: path is not valid UTF-8", entry.path()),
        }
    }
    Ok(entries)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
