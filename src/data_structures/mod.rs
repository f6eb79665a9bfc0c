//! Capture data structures: models, materials, transforms and environment textures.
//!
//! This module contains the data types the orchestrator works on:
//!
//! - `model` contains model prefabs, live model instances, mesh renderers and materials
//! - `texture` contains environment textures, background colors and the binding slot
//! - `transform` holds position/rotation/scale and parent-child composition

pub mod model;
pub mod texture;
pub mod transform;
