// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion to RGB
//!
//! Every raw V4L2 buffer is turned into an owned `RgbImage` before it
//! reaches the decoders. Packed YUV uses BT.601 coefficients.

use super::types::{CameraFrame, PixelFormat};
use crate::errors::CameraError;
use image::{ImageFormat, RgbImage};

/// Convert a raw camera frame to an RGB image
pub fn frame_to_rgb(frame: &CameraFrame) -> Result<RgbImage, CameraError> {
    if frame.format == PixelFormat::MJPEG {
        return mjpeg_to_rgb(&frame.data);
    }

    let stride = frame.effective_stride();
    let needed = stride * frame.height.saturating_sub(1) as usize
        + frame.width as usize * frame.format.bytes_per_pixel().unwrap_or(0) as usize;
    if frame.data.len() < needed {
        return Err(CameraError::Conversion(format!(
            "{} buffer too short: {} bytes, expected {}",
            frame.format,
            frame.data.len(),
            needed
        )));
    }

    let rgb = match frame.format {
        PixelFormat::YUYV => packed_422_to_rgb(frame, stride, [0, 1, 2, 3]),
        PixelFormat::UYVY => packed_422_to_rgb(frame, stride, [1, 0, 3, 2]),
        PixelFormat::RGB24 => rows_to_rgb(frame, stride, 3, |px| [px[0], px[1], px[2]]),
        PixelFormat::Gray8 => rows_to_rgb(frame, stride, 1, |px| [px[0], px[0], px[0]]),
        PixelFormat::MJPEG => unreachable!("handled above"),
    };

    RgbImage::from_raw(frame.width, frame.height, rgb)
        .ok_or_else(|| CameraError::Conversion("RGB data does not match dimensions".to_string()))
}

/// Decode a Motion JPEG buffer
pub fn mjpeg_to_rgb(data: &[u8]) -> Result<RgbImage, CameraError> {
    image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .map(|img| img.to_rgb8())
        .map_err(|e| CameraError::Conversion(format!("MJPEG decode failed: {}", e)))
}

/// Convert packed 4:2:2 YUV where two pixels share chroma
///
/// `order` gives the byte offsets of Y0, U, Y1, V inside each 4-byte group:
/// YUYV is `[0, 1, 2, 3]`, UYVY is `[1, 0, 3, 2]`.
fn packed_422_to_rgb(frame: &CameraFrame, stride: usize, order: [usize; 4]) -> Vec<u8> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let mut rgb = Vec::with_capacity(width * height * 3);

    for y in 0..height {
        let row = &frame.data[y * stride..];
        for x in 0..width {
            let base = (x & !1) * 2;
            let Some(group) = row.get(base..base + 4) else {
                // Odd width: the last pixel has no chroma pair
                let luma = row.get(base + order[0]).copied().unwrap_or(0);
                rgb.extend_from_slice(&[luma, luma, luma]);
                continue;
            };
            let luma = if x & 1 == 0 {
                group[order[0]]
            } else {
                group[order[2]]
            };
            let (r, g, b) = yuv_to_rgb(luma, group[order[1]], group[order[3]]);
            rgb.extend_from_slice(&[r, g, b]);
        }
    }

    rgb
}

/// Copy uncompressed rows, dropping stride padding
fn rows_to_rgb(
    frame: &CameraFrame,
    stride: usize,
    bytes_per_pixel: usize,
    to_rgb: impl Fn(&[u8]) -> [u8; 3],
) -> Vec<u8> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let mut rgb = Vec::with_capacity(width * height * 3);

    for y in 0..height {
        let row = &frame.data[y * stride..y * stride + width * bytes_per_pixel];
        for px in row.chunks_exact(bytes_per_pixel) {
            rgb.extend_from_slice(&to_rgb(px));
        }
    }

    rgb
}

/// Convert YUV (BT.601) to RGB
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn frame(format: PixelFormat, width: u32, height: u32, stride: u32, data: Vec<u8>) -> CameraFrame {
        CameraFrame {
            width,
            height,
            stride,
            format,
            data,
            sequence: 0,
        }
    }

    #[test]
    fn test_yuyv_gray_values() {
        // Neutral chroma (128) gives gray pixels equal to luma
        let data = vec![16, 128, 235, 128, 100, 128, 200, 128];
        let img = frame_to_rgb(&frame(PixelFormat::YUYV, 2, 2, 4, data)).unwrap();
        assert_eq!(*img.get_pixel(0, 0), Rgb([16, 16, 16]));
        assert_eq!(*img.get_pixel(1, 0), Rgb([235, 235, 235]));
        assert_eq!(*img.get_pixel(0, 1), Rgb([100, 100, 100]));
        assert_eq!(*img.get_pixel(1, 1), Rgb([200, 200, 200]));
    }

    #[test]
    fn test_uyvy_matches_yuyv() {
        let yuyv = vec![81, 90, 145, 240];
        let uyvy = vec![90, 81, 240, 145];
        let a = frame_to_rgb(&frame(PixelFormat::YUYV, 2, 1, 4, yuyv)).unwrap();
        let b = frame_to_rgb(&frame(PixelFormat::UYVY, 2, 1, 4, uyvy)).unwrap();
        assert_eq!(a, b);
        // Strong V pushes red up
        assert!(a.get_pixel(0, 0).0[0] > a.get_pixel(0, 0).0[2]);
    }

    #[test]
    fn test_rgb24_strips_stride_padding() {
        let data = vec![
            255, 0, 0, 0, 255, 0, 9, 9, // row 0 + padding
            0, 0, 255, 255, 255, 255, 9, 9, // row 1 + padding
        ];
        let img = frame_to_rgb(&frame(PixelFormat::RGB24, 2, 2, 8, data)).unwrap();
        assert_eq!(*img.get_pixel(1, 0), Rgb([0, 255, 0]));
        assert_eq!(*img.get_pixel(0, 1), Rgb([0, 0, 255]));
        assert_eq!(*img.get_pixel(1, 1), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_gray8_replicates_channels() {
        let img = frame_to_rgb(&frame(PixelFormat::Gray8, 3, 1, 0, vec![0, 128, 255])).unwrap();
        assert_eq!(*img.get_pixel(1, 0), Rgb([128, 128, 128]));
    }

    #[test]
    fn test_short_buffer_is_conversion_error() {
        let err = frame_to_rgb(&frame(PixelFormat::YUYV, 4, 4, 8, vec![0; 10])).unwrap_err();
        assert!(matches!(err, CameraError::Conversion(_)));
    }

    #[test]
    fn test_invalid_mjpeg_is_conversion_error() {
        let err = frame_to_rgb(&frame(PixelFormat::MJPEG, 4, 4, 0, vec![1, 2, 3])).unwrap_err();
        assert!(matches!(err, CameraError::Conversion(_)));
    }

    #[test]
    fn test_mjpeg_roundtrip_dimensions() {
        let src = RgbImage::from_pixel(8, 6, Rgb([120, 60, 30]));
        let mut jpeg = std::io::Cursor::new(Vec::new());
        src.write_to(&mut jpeg, ImageFormat::Jpeg).unwrap();

        let img = mjpeg_to_rgb(jpeg.get_ref()).unwrap();
        assert_eq!(img.dimensions(), (8, 6));
    }
}
