//! Run configuration.
//!
//! [`CaptureConfig`] collects every tunable of a capture run: input and output
//! roots, the orbit step and jitter ranges, the background color-pick chance and
//! the viewport. Defaults are the settings the dataset was captured with, so a config
//! file only has to name the fields it changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    pub models_root: PathBuf,
    pub environments_root: PathBuf,
    pub output_root: PathBuf,
    /// Matched case-insensitively, with or without a leading dot.
    pub model_extension: String,
    pub environment_extension: String,

    /// Orbit increment per captured step, in degrees.
    pub angle_step_degrees: f32,
    /// Height jitter, drawn from `[-height_jitter, height_jitter)`.
    pub height_jitter: f32,
    /// Radial jitter, drawn from `[0, distance_jitter)`.
    pub distance_jitter: f32,
    pub tilt_jitter_degrees: f32,
    /// Relative weight of "flat color" against the environment catalog.
    pub color_pick_chance: f32,

    /// Scene anchor every model is instantiated under.
    pub anchor: [f32; 3],
    /// Starting camera pose, used by hosts that don't bring their own.
    pub camera_position: [f32; 3],
    pub camera_target: [f32; 3],

    pub width: u32,
    pub height: u32,
    pub seed: Option<u64>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            models_root: "Resources/Models".into(),
            environments_root: "Resources/Environment Maps".into(),
            output_root: "Dataset".into(),
            model_extension: "glb".to_string(),
            environment_extension: "hdr".to_string(),
            angle_step_degrees: 5.0,
            height_jitter: 0.1,
            distance_jitter: 1.0,
            tilt_jitter_degrees: 5.0,
            color_pick_chance: 0.1,
            anchor: [0.0; 3],
            camera_position: [0.0, 1.0, -3.0],
            camera_target: [0.0, 1.0, 0.0],
            width: 512,
            height: 512,
            seed: None,
        }
    }
}

impl CaptureConfig {
    pub fn from_json(value: &str) -> serde_json::Result<Self> {
        serde_json::from_str(value)
    }

    /// Read a JSON config file. Missing fields fall back to their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content).map_err(|source| CaptureError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.angle_step_degrees > 0.0 && self.angle_step_degrees <= 360.0) {
            return Err(CaptureError::InvalidConfig(format!(
                "angle_step_degrees must be in (0, 360], got {}",
                self.angle_step_degrees
            )));
        }
        let ranges = [
            ("height_jitter", self.height_jitter),
            ("distance_jitter", self.distance_jitter),
            ("tilt_jitter_degrees", self.tilt_jitter_degrees),
            ("color_pick_chance", self.color_pick_chance),
        ];
        for (name, value) in ranges {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(CaptureError::InvalidConfig(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::InvalidConfig(format!(
                "viewport must not be empty, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Number of captured steps per model.
    pub fn steps_per_revolution(&self) -> u32 {
        (360.0 / self.angle_step_degrees).ceil() as u32
    }
}
