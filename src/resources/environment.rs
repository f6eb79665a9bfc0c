//! Random environment selection.
//!
//! The selector mixes environment-map backgrounds with flat-color backgrounds.
//! A draw over `[0, N * (1 + chance))` picks catalog entry `floor(draw)` when it
//! lands below `N` and "no environment" otherwise, so about
//! `chance / (1 + chance)` of all frames get a flat color regardless of how many
//! maps there are.

use std::{path::Path, sync::Arc};

use rand::RngExt;
use rand::rngs::StdRng;

use crate::{
    data_structures::texture::EnvironmentTexture,
    error::Result,
    resources::{AssetLoader, scan_catalog},
};

/// Default weight of the flat-color fallback.
pub const COLOR_PICK_CHANCE: f32 = 0.1;

#[derive(Debug)]
pub struct EnvironmentSelector {
    skyboxes: Vec<Arc<EnvironmentTexture>>,
    color_pick_chance: f32,
}

impl EnvironmentSelector {
    /// Scan `root` and load every environment map through `loader`.
    ///
    /// A missing root or an empty catalog is not an error: every frame then
    /// falls back to a flat color. Maps that fail to load are left out.
    pub fn new(
        root: &Path,
        extension: &str,
        color_pick_chance: f32,
        loader: &mut dyn AssetLoader,
    ) -> Result<Self> {
        let catalog = if root.exists() {
            scan_catalog(root, extension)?
        } else {
            log::warn!("Environment root {:?} does not exist", root);
            Vec::new()
        };

        let mut skyboxes = Vec::with_capacity(catalog.len());
        for entry in &catalog {
            match loader.load_environment(entry) {
                Ok(texture) => skyboxes.push(Arc::new(texture)),
                Err(e) => log::error!("Environment map {} is skipped: {}", entry.logical, e),
            }
        }

        if skyboxes.is_empty() {
            log::warn!(
                "No environment maps available under {:?}, using flat colors only",
                root
            );
        } else {
            log::info!("Loaded {} environment maps from {:?}", skyboxes.len(), root);
        }
        Ok(Self::from_textures(skyboxes, color_pick_chance))
    }

    pub fn from_textures(skyboxes: Vec<Arc<EnvironmentTexture>>, color_pick_chance: f32) -> Self {
        Self {
            skyboxes,
            color_pick_chance: color_pick_chance.max(0.0),
        }
    }

    /// Pick a random environment, or `None` when a flat color should be used.
    pub fn random_skybox(&self, rng: &mut StdRng) -> Option<Arc<EnvironmentTexture>> {
        let count = self.skyboxes.len();
        if count == 0 {
            return None;
        }
        let upper = count as f64 * (1.0 + self.color_pick_chance as f64);
        let draw = rng.random_range(0.0..upper);
        let index = draw.floor() as usize;
        if index >= count {
            return None;
        }
        Some(self.skyboxes[index].clone())
    }

    pub fn len(&self) -> usize {
        self.skyboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skyboxes.is_empty()
    }

    pub fn color_pick_chance(&self) -> f32 {
        self.color_pick_chance
    }
}
