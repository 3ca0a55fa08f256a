// SPDX-License-Identifier: GPL-3.0-only

//! Linear and stacked barcode detection task
//!
//! Uses the zxing-cpp reader on a grayscale copy of the frame. Symbols are
//! found in any orientation; the reported position is the quadrilateral
//! the reader located the symbol in.

use super::SymbolDecoder;
use crate::frame_processor::types::{DetectedSymbol, Point, Symbology};
use image::{RgbImage, imageops};
use tracing::{debug, trace};
use zxingcpp::BarcodeFormat;

/// Barcode detector for every non-QR symbology
pub struct BarcodeDetector {
    try_harder: bool,
}

impl Default for BarcodeDetector {
    fn default() -> Self {
        Self::new(true)
    }
}

impl BarcodeDetector {
    /// `try_harder` trades speed for more scan lines and rotations
    pub fn new(try_harder: bool) -> Self {
        Self { try_harder }
    }
}

impl SymbolDecoder for BarcodeDetector {
    fn decode(&mut self, frame: &RgbImage) -> Vec<DetectedSymbol> {
        let start = std::time::Instant::now();
        let gray = imageops::grayscale(frame);

        let reader = zxingcpp::read()
            .formats(
                BarcodeFormat::EAN13
                    | BarcodeFormat::EAN8
                    | BarcodeFormat::UPCA
                    | BarcodeFormat::UPCE
                    | BarcodeFormat::Code128
                    | BarcodeFormat::Code39
                    | BarcodeFormat::Code93
                    | BarcodeFormat::Codabar
                    | BarcodeFormat::ITF
                    | BarcodeFormat::DataBar
                    | BarcodeFormat::DataBarExpanded
                    | BarcodeFormat::PDF417,
            )
            .try_harder(self.try_harder)
            .try_invert(false);

        let barcodes = match reader.from(&gray) {
            Ok(barcodes) => barcodes,
            Err(e) => {
                debug!(error = %e, "Barcode reader failed");
                return Vec::new();
            }
        };

        let mut detections = Vec::with_capacity(barcodes.len());
        for barcode in &barcodes {
            let Some(symbology) = symbology_of(barcode.format()) else {
                trace!(format = ?barcode.format(), "Ignoring unmapped barcode format");
                continue;
            };

            let position = barcode.position();
            let polygon = [
                position.top_left,
                position.top_right,
                position.bottom_right,
                position.bottom_left,
            ]
            .iter()
            .map(|p| Point::new(p.x, p.y))
            .collect();

            detections.push(DetectedSymbol::new(symbology, barcode.bytes(), polygon));
        }

        if !detections.is_empty() {
            debug!(
                count = detections.len(),
                total_ms = start.elapsed().as_millis(),
                "Barcode detection found codes"
            );
        }

        detections
    }
}

/// Symbology for a reader format, `None` for formats this scanner does
/// not report
fn symbology_of(format: BarcodeFormat) -> Option<Symbology> {
    let symbology = match format {
        BarcodeFormat::EAN13 => Symbology::Ean13,
        BarcodeFormat::EAN8 => Symbology::Ean8,
        BarcodeFormat::UPCA => Symbology::UpcA,
        BarcodeFormat::UPCE => Symbology::UpcE,
        BarcodeFormat::Code128 => Symbology::Code128,
        BarcodeFormat::Code39 => Symbology::Code39,
        BarcodeFormat::Code93 => Symbology::Code93,
        BarcodeFormat::Codabar => Symbology::Codabar,
        BarcodeFormat::ITF => Symbology::I25,
        BarcodeFormat::DataBar => Symbology::DataBar,
        BarcodeFormat::DataBarExpanded => Symbology::DataBarExpanded,
        BarcodeFormat::PDF417 => Symbology::Pdf417,
        BarcodeFormat::QRCode => Symbology::QrCode,
        _ => return None,
    };
    Some(symbology)
}
