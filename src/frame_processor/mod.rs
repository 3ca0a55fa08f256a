// SPDX-License-Identifier: MPL-2.0

//! Frame processor module
//!
//! Detection tasks turn a frame into symbols; the annotator deduplicates
//! them by payload and draws outlines for the new ones.

pub mod annotator;
pub mod tasks;
pub mod types;

pub use annotator::{Annotator, Detection, FrameAnnotations, Label, SeenPayloads};
pub use tasks::{BarcodeDetector, CompositeDecoder, QrDetector, SymbolDecoder};
pub use types::{BoundingRect, DetectedSymbol, Point, Symbology};
