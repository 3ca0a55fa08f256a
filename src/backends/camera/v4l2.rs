// SPDX-License-Identifier: GPL-3.0-only

//! Direct V4L2 capture
//!
//! Opens `/dev/videoN` with the v4l crate, negotiates a pixel format the
//! scanner can convert and dequeues frames from a memory-mapped stream on
//! the calling thread.

use super::FrameSource;
use super::format_converters::frame_to_rgb;
use super::types::{CameraDevice, CameraFormat, CameraFrame, PixelFormat};
use crate::constants::CAPTURE_BUFFER_COUNT;
use crate::errors::CameraError;
use image::RgbImage;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// An open camera streaming frames
///
/// The stream is stopped and the device closed when this is dropped.
pub struct V4l2Camera {
    index: usize,
    name: String,
    format: CameraFormat,
    stream: MmapStream<'static>,
}

impl V4l2Camera {
    /// Open `/dev/video{index}` and start streaming
    ///
    /// `width` and `height` are a request; the driver picks the closest size
    /// it supports.
    pub fn open(index: usize, width: u32, height: u32) -> Result<Self, CameraError> {
        let open_error = |reason: String| CameraError::Open { index, reason };

        info!(index, width, height, "Opening V4L2 device");
        let dev = Device::new(index).map_err(|e| open_error(e.to_string()))?;

        let name = dev
            .query_caps()
            .map(|caps| caps.card)
            .unwrap_or_else(|_| format!("/dev/video{}", index));

        let format = negotiate_format(&dev, index, width, height)?;
        info!(device = %name, format = %format, "Negotiated capture format");

        let stream = MmapStream::with_buffers(&dev, Type::VideoCapture, CAPTURE_BUFFER_COUNT)
            .map_err(|e| open_error(format!("failed to create buffer stream: {}", e)))?;

        info!(device = %name, "V4L2 capture stream started");

        Ok(Self {
            index,
            name,
            format,
            stream,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> CameraFormat {
        self.format
    }

    /// Dequeue the next raw buffer
    fn next_raw(&mut self) -> Result<CameraFrame, CameraError> {
        let (buf, meta) = self
            .stream
            .next()
            .map_err(|e| CameraError::Read(e.to_string()))?;

        // Some drivers leave bytesused at zero for uncompressed formats
        let used = match meta.bytesused as usize {
            0 => buf.len(),
            n => n.min(buf.len()),
        };
        if used == 0 {
            return Err(CameraError::Read("device returned an empty buffer".to_string()));
        }

        Ok(CameraFrame {
            width: self.format.width,
            height: self.format.height,
            stride: self.format.stride,
            format: self.format.pixel_format,
            data: buf[..used].to_vec(),
            sequence: meta.sequence,
        })
    }
}

impl FrameSource for V4l2Camera {
    fn read_frame(&mut self) -> Result<RgbImage, CameraError> {
        let frame = self.next_raw()?;
        if frame.sequence % 120 == 0 {
            debug!(
                sequence = frame.sequence,
                bytes = frame.data.len(),
                "Frame captured"
            );
        }
        frame_to_rgb(&frame)
    }
}

impl Drop for V4l2Camera {
    fn drop(&mut self) {
        info!(index = self.index, device = %self.name, "Releasing camera");
    }
}

/// Ask the device for each preferred format in turn, accepting whatever
/// supported format it answers with
fn negotiate_format(
    dev: &Device,
    index: usize,
    width: u32,
    height: u32,
) -> Result<CameraFormat, CameraError> {
    let query = || {
        dev.format().map_err(|e| CameraError::Open {
            index,
            reason: format!("failed to query format: {}", e),
        })
    };
    let current = query()?;

    for preferred in PixelFormat::PREFERRED {
        let mut request = current.clone();
        request.width = width;
        request.height = height;
        request.fourcc = FourCC::new(&preferred.fourcc());

        match dev.set_format(&request) {
            Ok(actual) => {
                if let Some(format) = camera_format(&actual) {
                    if format.pixel_format != preferred {
                        warn!(
                            requested = %preferred,
                            got = %format.pixel_format,
                            "Device substituted pixel format"
                        );
                    }
                    return Ok(format);
                }
                debug!(
                    requested = %preferred,
                    got = %fourcc_string(&actual.fourcc),
                    "Device answered with an unsupported format"
                );
            }
            Err(e) => {
                warn!(requested = %preferred, error = %e, "Could not set format");
            }
        }
    }

    // Last resort: whatever the device is currently configured for
    let current = query()?;
    camera_format(&current)
        .ok_or_else(|| CameraError::UnsupportedFormat(fourcc_string(&current.fourcc)))
}

fn camera_format(format: &Format) -> Option<CameraFormat> {
    let pixel_format = PixelFormat::from_fourcc(&format.fourcc.repr)?;
    Some(CameraFormat {
        width: format.width,
        height: format.height,
        stride: format.stride,
        pixel_format,
    })
}

fn fourcc_string(fourcc: &FourCC) -> String {
    String::from_utf8_lossy(&fourcc.repr).into_owned()
}

/// List V4L2 nodes that offer at least one capture format
///
/// Metadata nodes created by uvcvideo next to each camera have no formats
/// and are skipped.
pub fn enumerate_cameras() -> Vec<CameraDevice> {
    let mut cameras: Vec<CameraDevice> = v4l::context::enum_devices()
        .into_iter()
        .filter_map(|node| {
            let index = node.index();
            let dev = Device::new(index).ok()?;
            let formats: Vec<String> = dev
                .enum_formats()
                .unwrap_or_default()
                .iter()
                .map(|f| fourcc_string(&f.fourcc))
                .collect();
            if formats.is_empty() {
                debug!(index, "Skipping node without capture formats");
                return None;
            }

            let caps = dev.query_caps().ok()?;
            Some(CameraDevice {
                index,
                name: caps.card,
                path: node.path().display().to_string(),
                driver: caps.driver,
                formats,
            })
        })
        .collect();

    cameras.sort_by_key(|c| c.index);
    cameras
}
