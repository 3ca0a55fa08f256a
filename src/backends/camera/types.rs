// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for the camera backend

use std::fmt;

/// Represents a V4L2 camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Index N of `/dev/videoN`
    pub index: usize,
    /// Card name reported by the driver
    pub name: String,
    /// Device path (e.g., /dev/video0)
    pub path: String,
    /// Driver name (e.g., uvcvideo)
    pub driver: String,
    /// FourCC codes of the capture formats the device offers
    pub formats: Vec<String>,
}

/// Negotiated capture format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    /// Bytes per row as reported by the driver (0 for compressed formats)
    pub stride: u32,
    pub pixel_format: PixelFormat,
}

impl fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.pixel_format)
    }
}

/// Pixel layouts the scanner can convert to RGB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    /// Common raw format from webcam sensors
    YUYV,
    /// UYVY - Packed 4:2:2 (U Y0 V Y1 interleaved)
    UYVY,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// Gray8 - 8-bit grayscale (single channel)
    /// Used for monochrome and IR cameras
    Gray8,
    /// Motion JPEG - every buffer is a complete JPEG image
    MJPEG,
}

impl PixelFormat {
    /// Formats to request from the device, most preferred first
    pub const PREFERRED: [PixelFormat; 2] = [PixelFormat::YUYV, PixelFormat::MJPEG];

    /// V4L2 FourCC code
    pub fn fourcc(&self) -> [u8; 4] {
        match self {
            Self::YUYV => *b"YUYV",
            Self::UYVY => *b"UYVY",
            Self::RGB24 => *b"RGB3",
            Self::Gray8 => *b"GREY",
            Self::MJPEG => *b"MJPG",
        }
    }

    /// Map a V4L2 FourCC code to a supported format
    pub fn from_fourcc(code: &[u8; 4]) -> Option<Self> {
        match code {
            b"YUYV" => Some(Self::YUYV),
            b"UYVY" => Some(Self::UYVY),
            b"RGB3" => Some(Self::RGB24),
            b"GREY" => Some(Self::Gray8),
            b"MJPG" | b"JPEG" => Some(Self::MJPEG),
            _ => None,
        }
    }

    /// Bytes per pixel for uncompressed formats
    pub fn bytes_per_pixel(&self) -> Option<u32> {
        match self {
            Self::YUYV | Self::UYVY => Some(2),
            Self::RGB24 => Some(3),
            Self::Gray8 => Some(1),
            Self::MJPEG => None,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.fourcc();
        f.write_str(&String::from_utf8_lossy(&code))
    }
}

/// A raw frame as dequeued from the device
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row (0 for compressed formats)
    pub stride: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
    /// Driver sequence number
    pub sequence: u32,
}

impl CameraFrame {
    /// Row stride, falling back to the packed width when the driver
    /// reported none
    pub fn effective_stride(&self) -> usize {
        let packed = self.width * self.format.bytes_per_pixel().unwrap_or(0);
        self.stride.max(packed) as usize
    }
}
