// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Title set on the terminal window while the viewer is open
pub const WINDOW_TITLE: &str = "Barcode and QR Code Scanner";

/// Camera opened when no index is given
pub const DEFAULT_CAMERA_INDEX: usize = 0;

/// Key that ends the scan loop
pub const DEFAULT_QUIT_KEY: char = 'q';

/// Requested capture resolution
///
/// Terminal cells are coarse, so a higher resolution only slows capture
/// and decoding down.
pub const DEFAULT_CAPTURE_WIDTH: u32 = 640;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 480;

/// Number of mmap buffers queued on the V4L2 device
pub const CAPTURE_BUFFER_COUNT: u32 = 4;

/// Undecodable frames tolerated in a row before the stream is given up
pub const MAX_CONSECUTIVE_BAD_FRAMES: u32 = 30;

/// Key poll timeout per loop iteration
pub const KEY_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Polygons with more vertices than this are outlined by their convex hull
pub const HULL_VERTEX_THRESHOLD: usize = 4;

/// Overlay style defaults
pub mod overlay {
    /// Outline and label colour (RGB)
    pub const COLOR: [u8; 3] = [0, 255, 0];
    /// Outline thickness in pixels
    pub const THICKNESS: u32 = 3;
    /// Label baseline distance above the symbol's top edge, in pixels
    pub const LABEL_OFFSET: i32 = 10;
}

/// Decoder defaults
pub mod decoding {
    /// Frames are downscaled to this size before QR detection
    pub const QR_MAX_DIMENSION: u32 = 640;
    /// Let the barcode reader try extra rotations and scan lines
    pub const BARCODE_TRY_HARDER: bool = true;
}

/// Detection lines kept visible in the viewer panel
pub const DETECTION_PANEL_LINES: u16 = 5;

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
