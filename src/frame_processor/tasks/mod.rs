// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks
//!
//! Each detector turns one RGB frame into the symbols it can find. A symbol
//! that cannot be decoded is simply not reported.

pub mod barcode_detector;
pub mod qr_detector;

pub use barcode_detector::BarcodeDetector;
pub use qr_detector::QrDetector;

use crate::config::DecoderConfig;
use crate::frame_processor::types::DetectedSymbol;
use image::RgbImage;

/// Finds symbols in a frame
pub trait SymbolDecoder {
    fn decode(&mut self, frame: &RgbImage) -> Vec<DetectedSymbol>;
}

impl<D: SymbolDecoder + ?Sized> SymbolDecoder for Box<D> {
    fn decode(&mut self, frame: &RgbImage) -> Vec<DetectedSymbol> {
        (**self).decode(frame)
    }
}

/// Runs several detectors on the same frame and concatenates their results
#[derive(Default)]
pub struct CompositeDecoder {
    detectors: Vec<Box<dyn SymbolDecoder>>,
}

impl CompositeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the detector set enabled in the configuration
    pub fn from_config(config: &DecoderConfig) -> Self {
        let mut decoder = Self::new();
        if config.qr {
            decoder.push(QrDetector::with_max_dimension(config.qr_max_dimension));
        }
        if config.barcodes {
            decoder.push(BarcodeDetector::new(config.try_harder));
        }
        decoder
    }

    pub fn push(&mut self, detector: impl SymbolDecoder + 'static) {
        self.detectors.push(Box::new(detector));
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

impl SymbolDecoder for CompositeDecoder {
    fn decode(&mut self, frame: &RgbImage) -> Vec<DetectedSymbol> {
        self.detectors
            .iter_mut()
            .flat_map(|detector| detector.decode(frame))
            .collect()
    }
}
