//! Environment textures and background binding.
//!
//! This module provides [`EnvironmentTexture`], a decoded equirectangular
//! environment map, the [`Background`] a frame is rendered against, and the
//! [`EnvironmentSlot`] that owns the currently bound background.

use std::sync::Arc;

use rand::RngExt;
use rand::rngs::StdRng;

use crate::resources::LogicalPath;

/// A decoded environment map in linear floating point RGB.
#[derive(Debug)]
pub struct EnvironmentTexture {
    pub name: LogicalPath,
    pub image: image::Rgb32FImage,
}

impl EnvironmentTexture {
    pub fn new(name: LogicalPath, image: image::Rgb32FImage) -> Self {
        Self { name, image }
    }

    /// Nearest-neighbour lookup with `u` wrapping and `v` clamped.
    pub fn sample(&self, u: f32, v: f32) -> [f32; 3] {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return [0.0; 3];
        }
        let x = (u.rem_euclid(1.0) * width as f32) as u32;
        let y = (v.clamp(0.0, 1.0) * height as f32) as u32;
        self.image.get_pixel(x.min(width - 1), y.min(height - 1)).0
    }
}

/// Linear RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Neutral tint: leaves environment maps unchanged.
    pub const GRAY: Color = Color {
        r: 0.5,
        g: 0.5,
        b: 0.5,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let h = hue.rem_euclid(1.0) * 6.0;
        let sector = h.floor();
        let f = h - sector;
        let p = value * (1.0 - saturation);
        let q = value * (1.0 - saturation * f);
        let t = value * (1.0 - saturation * (1.0 - f));
        match sector as u32 {
            0 => Self::new(value, t, p),
            1 => Self::new(q, value, p),
            2 => Self::new(p, value, t),
            3 => Self::new(p, q, value),
            4 => Self::new(t, p, value),
            _ => Self::new(value, p, q),
        }
    }

    /// Hue, saturation and value each uniform in `[0, 1)`.
    pub fn random_hsv(rng: &mut StdRng) -> Self {
        Self::from_hsv(
            rng.random_range(0.0..1.0),
            rng.random_range(0.0..1.0),
            rng.random_range(0.0..1.0),
        )
    }

    pub fn to_rgb8(self) -> image::Rgb<u8> {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        image::Rgb([to_u8(self.r), to_u8(self.g), to_u8(self.b)])
    }
}

/// What a frame is rendered against.
#[derive(Debug, Clone)]
pub enum Background {
    /// Flat color, used when no environment map was picked.
    Color(Color),
    /// Environment map multiplied by `tint` (two times, so that gray is neutral).
    Environment {
        texture: Arc<EnvironmentTexture>,
        tint: Color,
    },
}

impl Background {
    pub fn texture(&self) -> Option<&Arc<EnvironmentTexture>> {
        match self {
            Background::Environment { texture, .. } => Some(texture),
            Background::Color(_) => None,
        }
    }
}

/// Owns the bound background.
///
/// Binding always releases the previous environment first, and dropping the
/// slot releases whatever it still holds.
#[derive(Debug)]
pub struct EnvironmentSlot {
    current: Background,
    binds: u64,
    releases: u64,
}

impl EnvironmentSlot {
    pub fn new() -> Self {
        Self {
            current: Background::Color(Color::GRAY),
            binds: 0,
            releases: 0,
        }
    }

    pub fn bind(&mut self, background: Background) {
        self.release();
        if background.texture().is_some() {
            self.binds += 1;
        }
        self.current = background;
    }

    pub fn release(&mut self) {
        let previous = std::mem::replace(&mut self.current, Background::Color(Color::GRAY));
        if let Background::Environment { texture, .. } = previous {
            self.releases += 1;
            log::trace!("Released environment {}", texture.name);
        }
    }

    pub fn current(&self) -> &Background {
        &self.current
    }

    /// Number of environment textures bound so far.
    pub fn binds(&self) -> u64 {
        self.binds
    }

    pub fn releases(&self) -> u64 {
        self.releases
    }
}

impl Default for EnvironmentSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EnvironmentSlot {
    fn drop(&mut self) {
        self.release();
    }
}
