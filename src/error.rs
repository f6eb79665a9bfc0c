//! Error types.
//!
//! Every fallible library API returns [`Result<T>`], an alias for
//! `std::result::Result<T, CaptureError>`. The variants follow the failure
//! taxonomy of a capture run:
//!
//! - asset errors ([`CaptureError::AssetNotFound`], [`CaptureError::AssetLoad`])
//!   are fatal for one catalog entry only; the model queue logs and skips them
//! - [`CaptureError::EmptyCatalog`] stops a run before the first frame
//! - filesystem errors while writing the dataset abort the run, there are no retries

use std::path::PathBuf;

use thiserror::Error;

use crate::flow::ShadingPass;

#[derive(Error, Debug)]
pub enum CaptureError {
    // ========================================================================
    // Asset Errors
    // ========================================================================
    /// A catalog entry does not resolve to a loadable file.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// The file exists but the loader could not turn it into a handle.
    #[error("Failed to load asset {path}: {reason}")]
    AssetLoad { path: String, reason: String },

    /// No model matching the extension was found under the models root.
    /// An empty environment catalog only falls back to flat colors.
    #[error("No models found under {}", root.display())]
    EmptyCatalog { root: PathBuf },

    /// The catalog root itself could not be traversed.
    #[error("Failed to scan {}: {source}", root.display())]
    Scan {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    // ========================================================================
    // Dataset Output Errors
    // ========================================================================
    #[error("Failed to create output directory {}: {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    WriteImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode {}: {source}", path.display())]
    EncodeImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A shading pass returned an image that does not line up with the base frame.
    #[error("{pass:?} pass returned {actual:?}, expected {expected:?}")]
    FrameMismatch {
        pass: ShadingPass,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse configuration {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ========================================================================
    // Host & I/O Errors
    // ========================================================================
    /// A render host hook failed.
    #[error("Render host error: {0}")]
    Host(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
