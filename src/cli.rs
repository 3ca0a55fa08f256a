// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - Listing available cameras
//! - Running a scan session in the terminal viewer

use code_scanner::backends::camera::{V4l2Camera, enumerate_cameras};
use code_scanner::config::Config;
use code_scanner::errors::ScanResult;
use code_scanner::scanner::{ConsoleLog, ExitReason, run_session};
use code_scanner::terminal::TerminalViewer;
use tracing::info;

/// List all available cameras
pub fn list_cameras() -> ScanResult<()> {
    let cameras = enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for camera in &cameras {
        println!("  [{}] {}", camera.index, camera.name);
        println!("      Device: {} ({})", camera.path, camera.driver);
        println!("      Formats: {}", camera.formats.join(", "));
    }

    Ok(())
}

/// Scan with the configured camera in the terminal viewer
///
/// Detection lines held back while the viewer owned the screen are printed
/// once both the viewer and the camera are released.
pub fn scan(config: &Config) -> ScanResult<ExitReason> {
    let mut log = ConsoleLog::new();

    let result = run_session(
        config,
        |config| {
            let camera = V4l2Camera::open(config.camera_index, config.width, config.height)?;
            info!(camera = camera.name(), format = %camera.format(), "Camera ready");
            Ok(camera)
        },
        |config| {
            let viewer =
                TerminalViewer::open(&config.window_title, config.quit_key, config.panel_lines)?;
            Ok(viewer.with_label_color(config.overlay.color))
        },
        &mut log,
    );

    log.flush();
    result
}
