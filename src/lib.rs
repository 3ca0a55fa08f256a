// SPDX-License-Identifier: MPL-2.0

//! Code Scanner - live barcode and QR code scanning from a V4L2 camera
//!
//! Frames are captured from a webcam, searched for QR codes and linear or
//! stacked barcodes (EAN/UPC, Code 128, PDF417 and others), and shown in a
//! terminal viewer with each newly seen code outlined and labelled. Every
//! distinct payload is reported once per session.
//!
//! # Architecture
//!
//! - [`backends`]: V4L2 capture and pixel format conversion
//! - [`frame_processor`]: symbol detectors, deduplication and overlay drawing
//! - [`scanner`]: the capture, decode, annotate and display loop
//! - [`terminal`]: the half-block terminal viewer
//! - [`config`]: TOML configuration with built-in defaults
//!
//! # Example
//!
//! ```ignore
//! let config = Config::default();
//! let mut camera = V4l2Camera::open(config.camera_index, config.width, config.height)?;
//! let mut viewer = TerminalViewer::open(&config.window_title, config.quit_key, config.panel_lines)?;
//! let reason = Scanner::from_config(&config).run(&mut camera, &mut viewer, &mut ConsoleLog::new())?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod frame_processor;
pub mod scanner;
pub mod terminal;

// Re-export commonly used types
pub use backends::camera::{FrameSource, Frames, V4l2Camera};
pub use config::Config;
pub use errors::{CameraError, ConfigError, ScanError, ScanResult};
pub use frame_processor::{Annotator, DetectedSymbol, SymbolDecoder, Symbology};
pub use scanner::{ConsoleLog, DetectionLog, DisplaySink, ExitReason, Overlay, Scanner, run_session};
pub use terminal::TerminalViewer;
