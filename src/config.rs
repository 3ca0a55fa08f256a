// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{self, decoding, overlay};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Outline and label appearance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// RGB colour used for outlines and labels
    pub color: [u8; 3],
    /// Outline thickness in pixels
    pub thickness: u32,
    /// Distance of the label above the symbol's bounding box
    pub label_offset: i32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            color: overlay::COLOR,
            thickness: overlay::THICKNESS,
            label_offset: overlay::LABEL_OFFSET,
        }
    }
}

/// Which detectors run and how they are tuned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Run the QR code detector
    pub qr: bool,
    /// Run the linear and stacked barcode detector (EAN, UPC, Code 128, ...)
    pub barcodes: bool,
    /// Frames larger than this are downscaled before QR detection
    pub qr_max_dimension: u32,
    /// Spend more time per frame looking for rotated or damaged barcodes
    pub try_harder: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            qr: true,
            barcodes: true,
            qr_max_dimension: decoding::QR_MAX_DIMENSION,
            try_harder: decoding::BARCODE_TRY_HARDER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// V4L2 device index (`/dev/video{index}`)
    pub camera_index: usize,
    /// Requested capture width
    pub width: u32,
    /// Requested capture height
    pub height: u32,
    /// Terminal window title
    pub window_title: String,
    /// Key that ends the scan
    pub quit_key: char,
    /// Key poll timeout per frame, in milliseconds
    pub poll_interval_ms: u64,
    /// Detection lines shown under the video
    pub panel_lines: u16,
    pub decoder: DecoderConfig,
    pub overlay: OverlayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_index: constants::DEFAULT_CAMERA_INDEX,
            width: constants::DEFAULT_CAPTURE_WIDTH,
            height: constants::DEFAULT_CAPTURE_HEIGHT,
            window_title: constants::WINDOW_TITLE.to_string(),
            quit_key: constants::DEFAULT_QUIT_KEY,
            poll_interval_ms: constants::KEY_POLL_INTERVAL.as_millis() as u64,
            panel_lines: constants::DETECTION_PANEL_LINES,
            decoder: DecoderConfig::default(),
            overlay: OverlayConfig::default(),
        }
    }
}

impl Config {
    /// Load a TOML configuration file
    ///
    /// Missing keys keep their defaults, so a file only needs the values it
    /// changes.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
