// SPDX-License-Identifier: MPL-2.0

//! Core types for frame processing results
//!
//! These are produced fresh for every frame by the detectors and consumed by
//! the annotator. Coordinates are in frame pixels.

use std::fmt;
use std::str::Utf8Error;

/// A point in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box of a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingRect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingRect {
    /// Smallest rectangle containing every point
    ///
    /// An empty slice gives a zero-sized rectangle at the origin.
    pub fn enclosing(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Self {
            left: min_x,
            top: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }
}

/// Barcode symbology reported by a detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbology {
    QrCode,
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    Code128,
    Code39,
    Code93,
    Codabar,
    /// Interleaved 2 of 5
    I25,
    DataBar,
    DataBarExpanded,
    Pdf417,
}

impl Symbology {
    /// Type tag as printed in detection lines
    pub fn tag(&self) -> &'static str {
        match self {
            Self::QrCode => "QRCODE",
            Self::Ean13 => "EAN13",
            Self::Ean8 => "EAN8",
            Self::UpcA => "UPCA",
            Self::UpcE => "UPCE",
            Self::Code128 => "CODE128",
            Self::Code39 => "CODE39",
            Self::Code93 => "CODE93",
            Self::Codabar => "CODABAR",
            Self::I25 => "I25",
            Self::DataBar => "DATABAR",
            Self::DataBarExpanded => "DATABAR_EXP",
            Self::Pdf417 => "PDF417",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A barcode or QR code found in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedSymbol {
    pub symbology: Symbology,
    /// Raw decoded bytes
    pub payload: Vec<u8>,
    /// Outline as reported by the detector, in order
    pub polygon: Vec<Point>,
    pub rect: BoundingRect,
}

impl DetectedSymbol {
    /// Build a symbol whose bounding box is derived from its polygon
    pub fn new(symbology: Symbology, payload: Vec<u8>, polygon: Vec<Point>) -> Self {
        let rect = BoundingRect::enclosing(&polygon);
        Self {
            symbology,
            payload,
            polygon,
            rect,
        }
    }

    /// Payload as UTF-8 text
    pub fn text(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.payload)
    }
}
