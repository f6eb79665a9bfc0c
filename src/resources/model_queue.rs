//! The model work queue.
//!
//! [`ModelQueue`] scans the model root once and then hands out the models one by
//! one. It is strictly forward-only: there is no way to rewind, and once every
//! entry was handed out (or skipped) it keeps answering `None`.

use std::path::Path;

use crate::{
    data_structures::model::ModelPrefab,
    error::Result,
    resources::{AssetLoader, CatalogEntry, LogicalPath, scan_catalog},
};

pub struct ModelQueue {
    catalog: Vec<CatalogEntry>,
    cursor: usize,
    skipped: Vec<LogicalPath>,
    loader: Box<dyn AssetLoader>,
}

impl ModelQueue {
    /// Scan `root` for files with `extension`. The catalog order is the
    /// filesystem traversal order.
    pub fn new(root: &Path, extension: &str, loader: Box<dyn AssetLoader>) -> Result<Self> {
        let catalog = scan_catalog(root, extension)?;
        log::info!("Found {} models under {:?}", catalog.len(), root);
        Ok(Self::from_catalog(catalog, loader))
    }

    pub fn from_catalog(catalog: Vec<CatalogEntry>, loader: Box<dyn AssetLoader>) -> Self {
        Self {
            catalog,
            cursor: 0,
            skipped: Vec::new(),
            loader,
        }
    }

    /// Hand out the next model together with its logical path.
    ///
    /// Entries the loader cannot load are logged and skipped, so `None` always
    /// means the catalog is exhausted and never hides a failed load.
    pub fn retrieve_next(&mut self) -> Option<(ModelPrefab, LogicalPath)> {
        while let Some(entry) = self.catalog.get(self.cursor) {
            self.cursor += 1;
            let loaded = self.loader.load_model(entry);
            self.loader.unload_unused();
            match loaded {
                Ok(prefab) => return Some((prefab, entry.logical.clone())),
                Err(e) => {
                    log::error!(
                        "Model {} ({:?}) could not be loaded and is skipped: {}",
                        entry.logical,
                        entry.file,
                        e
                    );
                    self.skipped.push(entry.logical.clone());
                }
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// Entries not handed out yet.
    pub fn remaining(&self) -> usize {
        self.catalog.len() - self.cursor
    }

    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    /// Entries that failed to load.
    pub fn skipped(&self) -> &[LogicalPath] {
        &self.skipped
    }
}
