#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::HashSet,
    path::{Path, PathBuf},
    rc::Rc,
    sync::atomic::{AtomicUsize, Ordering},
};

use image::{Rgb, RgbImage};
use orbit_capture::{
    CaptureConfig, CaptureError, Result,
    camera::Camera,
    cgmath::Point3,
    data_structures::{
        model::{Material, MeshRenderer, ModelPrefab},
        texture::{Background, EnvironmentTexture},
    },
    flow::{FrameView, RenderHost, ShadingPass, ShadingPasses},
    resources::{AssetLoader, CatalogEntry},
};

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A fresh, empty directory below the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let id = SCRATCH_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir()
        .join("orbit-capture-tests")
        .join(format!("{}-{}-{}", name, std::process::id(), id));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).expect("failed to clear scratch dir");
    }
    std::fs::create_dir_all(&dir).expect("failed to create scratch dir");
    dir
}

/// Create an empty file at `root/relative`, including parent directories.
pub fn touch(root: &Path, relative: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create parent dir");
    }
    std::fs::write(&path, b"").expect("failed to create file");
    path
}

/// Sorted file names in `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("failed to read dir")
        .map(|entry| entry.expect("bad entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Small viewport and a fixed seed.
pub fn test_config(models: &Path, environments: &Path, output: &Path) -> CaptureConfig {
    CaptureConfig {
        models_root: models.to_path_buf(),
        environments_root: environments.to_path_buf(),
        output_root: output.to_path_buf(),
        model_extension: "fbx".to_string(),
        environment_extension: "hdr".to_string(),
        width: 8,
        height: 6,
        seed: Some(7),
        ..CaptureConfig::default()
    }
}

/// The prefab every scripted model load returns: a skinned body with one
/// transparent and one cutout material, and a rigid prop with a transparent one.
pub fn character_prefab(name: &str) -> ModelPrefab {
    ModelPrefab::new(
        name,
        vec![
            MeshRenderer {
                name: "Body".to_string(),
                skinned: true,
                materials: vec![Material::transparent("Hair"), Material::cutout("Lashes")],
            },
            MeshRenderer {
                name: "Prop".to_string(),
                skinned: false,
                materials: vec![Material::transparent("Glass")],
            },
        ],
    )
}

/// Loader that never touches file contents. Models named in `failing` report
/// `AssetNotFound`.
#[derive(Default)]
pub struct ScriptedLoader {
    pub failing: HashSet<String>,
    pub model_loads: Rc<RefCell<Vec<String>>>,
    pub unloads: Rc<RefCell<usize>>,
}

impl ScriptedLoader {
    pub fn failing(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }
}

impl AssetLoader for ScriptedLoader {
    fn load_model(&mut self, entry: &CatalogEntry) -> Result<ModelPrefab> {
        self.model_loads.borrow_mut().push(entry.logical.to_string());
        if self.failing.contains(entry.logical.as_str()) {
            return Err(CaptureError::AssetNotFound(entry.logical.to_string()));
        }
        Ok(character_prefab(entry.logical.as_str()))
    }

    fn load_environment(&mut self, entry: &CatalogEntry) -> Result<EnvironmentTexture> {
        let image = image::Rgb32FImage::from_pixel(4, 2, Rgb([0.25, 0.5, 1.0]));
        Ok(EnvironmentTexture::new(entry.logical.clone(), image))
    }

    fn unload_unused(&mut self) {
        *self.unloads.borrow_mut() += 1;
    }
}

/// What a [`RecordingHost`] saw in one rasterized frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SeenBackground {
    Color,
    Environment(String),
}

/// Render host that records every hook invocation.
pub struct RecordingHost {
    pub width: u32,
    pub height: u32,
    pub initial_camera: Camera,
    pub started: usize,
    pub disabled: usize,
    pub stop_requests: usize,
    pub presented: usize,
    pub backgrounds: Vec<SeenBackground>,
    pub models: Vec<Option<String>>,
    pub blits: Vec<ShadingPass>,
    /// Makes the normal pass return a frame of the wrong size.
    pub broken_normal_pass: bool,
}

impl RecordingHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            initial_camera: Camera::looking_at(Point3::new(0.0, 1.0, -3.0), Point3::new(0.0, 1.0, 0.0)),
            started: 0,
            disabled: 0,
            stop_requests: 0,
            presented: 0,
            backgrounds: Vec::new(),
            models: Vec::new(),
            blits: Vec::new(),
            broken_normal_pass: false,
        }
    }
}

impl ShadingPasses for RecordingHost {
    fn blit(&mut self, frame: &RgbImage, pass: ShadingPass) -> Result<RgbImage> {
        self.blits.push(pass);
        let (width, height) = match pass {
            ShadingPass::Normal if self.broken_normal_pass => (frame.width() + 1, frame.height()),
            _ => frame.dimensions(),
        };
        let encoding = match pass {
            ShadingPass::Depth => Rgb([40, 40, 40]),
            ShadingPass::Normal => Rgb([128, 128, 255]),
        };
        Ok(RgbImage::from_pixel(width, height, encoding))
    }
}

impl RenderHost for RecordingHost {
    fn on_start(&mut self) -> Result<Camera> {
        self.started += 1;
        Ok(self.initial_camera)
    }

    fn rasterize(&mut self, view: &FrameView<'_>) -> Result<RgbImage> {
        let seen = match view.background {
            Background::Color(_) => SeenBackground::Color,
            Background::Environment { texture, .. } => {
                SeenBackground::Environment(texture.name.to_string())
            }
        };
        self.backgrounds.push(seen);
        self.models.push(view.model.map(|m| m.name.clone()));
        let shade = (self.backgrounds.len() % 256) as u8;
        Ok(RgbImage::from_pixel(self.width, self.height, Rgb([shade, 0, 0])))
    }

    fn present(&mut self, _frame: RgbImage) {
        self.presented += 1;
    }

    fn request_stop(&mut self) {
        self.stop_requests += 1;
    }

    fn on_disable(&mut self) {
        self.disabled += 1;
    }
}
