// SPDX-License-Identifier: MPL-2.0

//! Error types for the scanner

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ScanError
pub type ScanResult<T> = Result<T, ScanError>;

/// Top-level error for a scan session
#[derive(Debug, Error)]
pub enum ScanError {
    /// Camera-related errors
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Terminal viewer I/O failed
    #[error("Display error: {0}")]
    Display(#[from] io::Error),
}

/// Camera-specific errors
#[derive(Debug, Clone, Error)]
pub enum CameraError {
    /// Device could not be acquired
    #[error("could not open camera {index}: {reason}")]
    Open { index: usize, reason: String },
    /// A read returned no frame
    #[error("frame read failed: {0}")]
    Read(String),
    /// Device only offers pixel formats we cannot convert
    #[error("unsupported pixel format: {0}")]
    UnsupportedFormat(String),
    /// Raw buffer could not be turned into an RGB frame
    #[error("frame conversion failed: {0}")]
    Conversion(String),
}

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
