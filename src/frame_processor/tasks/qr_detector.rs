// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! This module implements QR code detection using the rqrr crate.
//! Frames are converted to grayscale and optionally downscaled before the
//! grid search; corner points are scaled back to frame coordinates.

use super::SymbolDecoder;
use crate::constants::decoding;
use crate::frame_processor::types::{DetectedSymbol, Point, Symbology};
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use rqrr::PreparedImage;
use tracing::{debug, trace};

/// QR code detector
///
/// Optimized for real-time processing with frame downscaling.
pub struct QrDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    /// Create a new QR detector with default settings
    pub fn new() -> Self {
        Self {
            max_dimension: decoding::QR_MAX_DIMENSION,
        }
    }

    /// Create a QR detector with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }
}

impl SymbolDecoder for QrDetector {
    fn decode(&mut self, frame: &RgbImage) -> Vec<DetectedSymbol> {
        detect_sync(frame, self.max_dimension)
    }
}

fn detect_sync(frame: &RgbImage, max_dimension: u32) -> Vec<DetectedSymbol> {
    let start = std::time::Instant::now();

    let (gray, scale) = prepare_gray(frame, max_dimension);
    let (proc_width, proc_height) = gray.dimensions();
    trace!(proc_width, proc_height, scale, "Prepared grayscale image");

    let mut prepared = PreparedImage::prepare_from_greyscale(
        proc_width as usize,
        proc_height as usize,
        |x, y| gray.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();

    let mut detections = Vec::with_capacity(grids.len());
    for grid in grids {
        let mut payload = Vec::new();
        if let Err(e) = grid.decode_to(&mut payload) {
            debug!(error = %e, "Failed to decode QR code");
            continue;
        }

        let polygon = grid
            .bounds
            .iter()
            .map(|p| {
                Point::new(
                    (p.x as f32 * scale).round() as i32,
                    (p.y as f32 * scale).round() as i32,
                )
            })
            .collect();

        detections.push(DetectedSymbol::new(Symbology::QrCode, payload, polygon));
    }

    if !detections.is_empty() {
        debug!(
            count = detections.len(),
            total_ms = start.elapsed().as_millis(),
            "QR detection found codes"
        );
    }

    detections
}

/// Grayscale copy of the frame, downscaled so neither side exceeds
/// `max_dimension`
///
/// Returns the image and the factor that maps its coordinates back to the
/// original frame.
fn prepare_gray(frame: &RgbImage, max_dimension: u32) -> (GrayImage, f32) {
    let gray = imageops::grayscale(frame);
    let (width, height) = gray.dimensions();

    if width <= max_dimension && height <= max_dimension {
        return (gray, 1.0);
    }

    let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
    let new_width = ((width as f32 / scale) as u32).max(1);
    let new_height = ((height as f32 / scale) as u32).max(1);

    let resized = imageops::resize(&gray, new_width, new_height, FilterType::Triangle);
    (resized, width as f32 / new_width as f32)
}
