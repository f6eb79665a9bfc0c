//! Model prefabs, live instances and their materials.
//!
//! A [`ModelPrefab`] is what the asset loader hands out: an immutable template
//! with mesh renderers and material state as authored. [`ModelPrefab::instantiate`]
//! creates the live [`ModelInstance`] the orchestrator owns for one orbit. Every
//! instance gets its own copies of the materials, so normalizing them never
//! touches the prefab.

use std::collections::BTreeSet;

use crate::data_structures::transform::Transform;

/// Render queue value meaning "use the queue of the shader".
pub const DEFAULT_RENDER_QUEUE: i32 = -1;

/// Keywords that switch a material into one of the transparent modes.
pub const ALPHA_KEYWORDS: [&str; 3] = ["_ALPHATEST_ON", "_ALPHABLEND_ON", "_ALPHAPREMULTIPLY_ON"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// Render state of one material slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub src_blend: BlendFactor,
    pub dst_blend: BlendFactor,
    pub depth_write: bool,
    pub render_queue: i32,
    keywords: BTreeSet<String>,
}

impl Material {
    pub fn opaque(name: &str) -> Self {
        Self {
            name: name.to_string(),
            src_blend: BlendFactor::One,
            dst_blend: BlendFactor::Zero,
            depth_write: true,
            render_queue: DEFAULT_RENDER_QUEUE,
            keywords: BTreeSet::new(),
        }
    }

    /// Alpha-tested ("cutout") material.
    pub fn cutout(name: &str) -> Self {
        let mut material = Self::opaque(name);
        material.render_queue = 2450;
        material.enable_keyword("_ALPHATEST_ON");
        material
    }

    /// Alpha-blended material.
    pub fn transparent(name: &str) -> Self {
        let mut material = Self::opaque(name);
        material.src_blend = BlendFactor::SrcAlpha;
        material.dst_blend = BlendFactor::OneMinusSrcAlpha;
        material.depth_write = false;
        material.render_queue = 3000;
        material.enable_keyword("_ALPHABLEND_ON");
        material
    }

    pub fn enable_keyword(&mut self, keyword: &str) {
        self.keywords.insert(keyword.to_string());
    }

    pub fn disable_keyword(&mut self, keyword: &str) {
        self.keywords.remove(keyword);
    }

    pub fn is_keyword_enabled(&self, keyword: &str) -> bool {
        self.keywords.contains(keyword)
    }

    /// Force fully opaque state: One/Zero blending, depth write, no alpha
    /// keywords and the default render queue.
    ///
    /// Depth and normal passes read the depth buffer, so any transparency
    /// inherited from the source asset would leave holes in them.
    pub fn make_opaque(&mut self) {
        self.src_blend = BlendFactor::One;
        self.dst_blend = BlendFactor::Zero;
        self.depth_write = true;
        for keyword in ALPHA_KEYWORDS {
            self.disable_keyword(keyword);
        }
        self.render_queue = DEFAULT_RENDER_QUEUE;
    }

    pub fn is_opaque(&self) -> bool {
        self.src_blend == BlendFactor::One
            && self.dst_blend == BlendFactor::Zero
            && self.depth_write
            && self.render_queue == DEFAULT_RENDER_QUEUE
            && ALPHA_KEYWORDS.iter().all(|k| !self.is_keyword_enabled(k))
    }
}

/// A mesh with its material slots. Skinned renderers are the ones driven by a
/// skeleton, i.e. the character body.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRenderer {
    pub name: String,
    pub skinned: bool,
    pub materials: Vec<Material>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrefab {
    pub name: String,
    pub root: Transform,
    pub renderers: Vec<MeshRenderer>,
}

impl ModelPrefab {
    pub fn new(name: &str, renderers: Vec<MeshRenderer>) -> Self {
        Self {
            name: name.to_string(),
            root: Transform::new(),
            renderers,
        }
    }

    /// Create a live copy parented under `anchor`.
    pub fn instantiate(&self, anchor: &Transform) -> ModelInstance {
        ModelInstance {
            name: self.name.clone(),
            transform: anchor * &self.root,
            renderers: self.renderers.clone(),
        }
    }
}

/// The model copy that lives in the scene for the duration of one orbit.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    pub name: String,
    /// World transform.
    pub transform: Transform,
    pub renderers: Vec<MeshRenderer>,
}

impl ModelInstance {
    pub fn position(&self) -> cgmath::Point3<f32> {
        self.transform.origin()
    }

    pub fn skinned_renderers(&self) -> impl Iterator<Item = &MeshRenderer> {
        self.renderers.iter().filter(|r| r.skinned)
    }

    /// Make every material on every skinned renderer opaque.
    /// Returns the number of materials touched.
    pub fn normalize_materials(&mut self) -> usize {
        let mut count = 0;
        for renderer in self.renderers.iter_mut().filter(|r| r.skinned) {
            for material in renderer.materials.iter_mut() {
                material.make_opaque();
                count += 1;
            }
        }
        count
    }
}
