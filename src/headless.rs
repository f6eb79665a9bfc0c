//! CPU-only render host.
//!
//! [`HeadlessHost`] renders just the background of each frame (the flat color or
//! an equirectangular lookup into the environment map) and produces the depth and
//! normal encodings of an empty scene. It draws no model geometry. That makes it
//! a dry-run host: a full run writes the complete dataset layout with real
//! backgrounds and camera motion, which is enough to validate catalogs, output
//! paths and throughput before switching to a GPU host.

use std::f32::consts::PI;

use cgmath::{Deg, InnerSpace, Point3, Rad};
use image::{Rgb, RgbImage};

use crate::{
    camera::Camera,
    config::CaptureConfig,
    data_structures::texture::{Background, EnvironmentTexture},
    error::{CaptureError, Result},
    flow::{FrameView, RenderHost, ShadingPass, ShadingPasses},
};

/// Constant encodings of an empty scene.
#[derive(Debug, Clone, Copy)]
struct PassPrograms {
    /// Far plane.
    depth: Rgb<u8>,
    /// Facing the camera.
    normal: Rgb<u8>,
}

#[derive(Debug)]
pub struct HeadlessHost {
    width: u32,
    height: u32,
    fov_y: Deg<f32>,
    initial_camera: Camera,
    programs: Option<PassPrograms>,
    frames_presented: u64,
    stop_requested: bool,
}

impl HeadlessHost {
    pub fn new(width: u32, height: u32, initial_camera: Camera) -> Self {
        Self {
            width,
            height,
            fov_y: Deg(60.0),
            initial_camera,
            programs: None,
            frames_presented: 0,
            stop_requested: false,
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        let camera = Camera::looking_at(
            Point3::from(config.camera_position),
            Point3::from(config.camera_target),
        );
        Self::new(config.width, config.height, camera)
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    fn render_environment(
        &self,
        camera: &Camera,
        texture: &EnvironmentTexture,
        tint: [f32; 3],
    ) -> RgbImage {
        let tan = (Rad::from(self.fov_y).0 * 0.5).tan();
        let aspect = self.width as f32 / self.height as f32;
        let (forward, up, right) = (camera.forward(), camera.up(), camera.right());

        RgbImage::from_fn(self.width, self.height, |x, y| {
            let ndc_x = 2.0 * (x as f32 + 0.5) / self.width as f32 - 1.0;
            let ndc_y = 1.0 - 2.0 * (y as f32 + 0.5) / self.height as f32;
            let direction =
                (forward + right * (ndc_x * tan * aspect) + up * (ndc_y * tan)).normalize();

            let u = 0.5 + direction.x.atan2(direction.z) / (2.0 * PI);
            let v = 0.5 - direction.y.clamp(-1.0, 1.0).asin() / PI;
            let texel = texture.sample(u, v);
            Rgb([
                tonemap(texel[0] * tint[0]),
                tonemap(texel[1] * tint[1]),
                tonemap(texel[2] * tint[2]),
            ])
        })
    }
}

/// Clamp and gamma-encode a linear value.
fn tonemap(linear: f32) -> u8 {
    (linear.clamp(0.0, 1.0).powf(1.0 / 2.2) * 255.0).round() as u8
}

impl ShadingPasses for HeadlessHost {
    fn blit(&mut self, frame: &RgbImage, pass: ShadingPass) -> Result<RgbImage> {
        let programs = self.programs.ok_or_else(|| {
            CaptureError::Host("shading programs are not built, on_start was not called".to_string())
        })?;
        let encoding = match pass {
            ShadingPass::Depth => programs.depth,
            ShadingPass::Normal => programs.normal,
        };
        Ok(RgbImage::from_pixel(frame.width(), frame.height(), encoding))
    }
}

impl RenderHost for HeadlessHost {
    fn on_start(&mut self) -> Result<Camera> {
        self.programs = Some(PassPrograms {
            depth: Rgb([255, 255, 255]),
            normal: Rgb([128, 128, 255]),
        });
        log::info!(
            "Headless host ready: {}x{}, background-only rendering",
            self.width,
            self.height
        );
        Ok(self.initial_camera)
    }

    fn rasterize(&mut self, view: &FrameView<'_>) -> Result<RgbImage> {
        let frame = match view.background {
            Background::Color(color) => RgbImage::from_pixel(self.width, self.height, color.to_rgb8()),
            // Gray is the neutral tint, hence the factor of two.
            Background::Environment { texture, tint } => self.render_environment(
                view.camera,
                texture,
                [tint.r * 2.0, tint.g * 2.0, tint.b * 2.0],
            ),
        };
        Ok(frame)
    }

    fn present(&mut self, _frame: RgbImage) {
        self.frames_presented += 1;
    }

    fn request_stop(&mut self) {
        log::info!("Stop requested after {} frames", self.frames_presented);
        self.stop_requested = true;
    }

    fn on_disable(&mut self) {
        self.programs = None;
    }
}
