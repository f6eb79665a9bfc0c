//! orbit-capture
//!
//! A synthetic-dataset generator. It walks a library of 3D character models,
//! orbits a camera around each of them against randomized environment
//! backgrounds and writes three aligned images per view: base color, depth and
//! surface normal. The capture loop is a host-independent state machine; the
//! renderer plugs in through the [`flow::RenderHost`] trait.
//!
//! High-level modules
//! - `camera`: camera pose and orbit/jitter placement
//! - `capture`: the capture state machine and the dataset output layout
//! - `config`: run configuration with defaults and JSON loading
//! - `data_structures`: model prefabs, materials, transforms and environment textures
//! - `error`: the crate error type
//! - `flow`: host hooks and the frame loop driving a capture run
//! - `headless`: a CPU host that renders backgrounds only, for dry runs
//! - `resources`: catalog scanning, the model queue, environment selection and loaders
//!

pub mod camera;
pub mod capture;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod headless;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use capture::{CaptureCommand, CaptureOrchestrator, CaptureState, RunSummary};
pub use cgmath;
pub use config::CaptureConfig;
pub use error::{CaptureError, Result};
pub use image::RgbImage;
