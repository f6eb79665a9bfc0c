//! Bundled asset loader: glTF models and image environment maps.
//!
//! Only material state and mesh layout are read from models, which is what the
//! capture pipeline needs to set up a session. Environment maps are decoded with
//! the `image` crate, so Radiance `.hdr`, OpenEXR, PNG and JPEG all work.

use crate::{
    data_structures::{
        model::{Material, MeshRenderer, ModelPrefab},
        texture::EnvironmentTexture,
    },
    error::{CaptureError, Result},
    resources::{AssetLoader, CatalogEntry},
};

#[derive(Debug, Default)]
pub struct FileAssetLoader;

impl FileAssetLoader {
    pub fn new() -> Self {
        Self
    }
}

impl AssetLoader for FileAssetLoader {
    fn load_model(&mut self, entry: &CatalogEntry) -> Result<ModelPrefab> {
        if !entry.file.is_file() {
            return Err(CaptureError::AssetNotFound(entry.logical.to_string()));
        }
        let gltf = gltf::Gltf::open(&entry.file).map_err(|e| CaptureError::AssetLoad {
            path: entry.logical.to_string(),
            reason: e.to_string(),
        })?;

        let mut renderers = Vec::new();
        for scene in gltf.scenes() {
            for node in scene.nodes() {
                collect_renderers(node, &mut renderers);
            }
        }
        if renderers.is_empty() {
            log::warn!("Model {} contains no meshes", entry.logical);
        }

        Ok(ModelPrefab::new(entry.logical.as_str(), renderers))
    }

    fn load_environment(&mut self, entry: &CatalogEntry) -> Result<EnvironmentTexture> {
        if !entry.file.is_file() {
            return Err(CaptureError::AssetNotFound(entry.logical.to_string()));
        }
        let image = image::open(&entry.file).map_err(|e| CaptureError::AssetLoad {
            path: entry.logical.to_string(),
            reason: e.to_string(),
        })?;
        Ok(EnvironmentTexture::new(
            entry.logical.clone(),
            image.into_rgb32f(),
        ))
    }
}

fn collect_renderers(node: gltf::Node, renderers: &mut Vec<MeshRenderer>) {
    if let Some(mesh) = node.mesh() {
        let name = node.name().or(mesh.name()).unwrap_or("mesh");
        let materials = mesh
            .primitives()
            .map(|primitive| to_material(&primitive.material()))
            .collect();
        renderers.push(MeshRenderer {
            name: name.to_string(),
            skinned: node.skin().is_some(),
            materials,
        });
    }
    for child in node.children() {
        collect_renderers(child, renderers);
    }
}

fn to_material(material: &gltf::Material) -> Material {
    let name = material.name().unwrap_or("default");
    match material.alpha_mode() {
        gltf::material::AlphaMode::Opaque => Material::opaque(name),
        gltf::material::AlphaMode::Mask => Material::cutout(name),
        gltf::material::AlphaMode::Blend => Material::transparent(name),
    }
}
