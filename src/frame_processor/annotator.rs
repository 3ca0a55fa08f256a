// SPDX-License-Identifier: GPL-3.0-only

//! Deduplication and overlay drawing
//!
//! A payload is drawn and reported only the first time it is seen during a
//! session. Later sightings of the same text are ignored even though the
//! symbol is still in view.

use crate::config::OverlayConfig;
use crate::constants::HULL_VERTEX_THRESHOLD;
use crate::frame_processor::types::{DetectedSymbol, Point, Symbology};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use std::collections::HashSet;
use tracing::debug;

/// Payload texts already handled in this session
///
/// Grows monotonically; nothing is ever removed.
#[derive(Debug, Default, Clone)]
pub struct SeenPayloads {
    payloads: HashSet<String>,
}

impl SeenPayloads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a payload, returning true if it had not been seen before
    pub fn insert(&mut self, text: &str) -> bool {
        if self.payloads.contains(text) {
            return false;
        }
        self.payloads.insert(text.to_string())
    }

    pub fn contains(&self, text: &str) -> bool {
        self.payloads.contains(text)
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

/// Text drawn next to a newly detected symbol, anchored in frame pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    pub x: i32,
    pub y: i32,
}

/// A symbol accepted for the first time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub symbology: Symbology,
    pub payload: String,
}

impl Detection {
    /// Console line for this detection
    pub fn log_line(&self) -> String {
        format!("Detected {}: {}", self.symbology, self.payload)
    }
}

/// What the annotator did to one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameAnnotations {
    pub detections: Vec<Detection>,
    pub labels: Vec<Label>,
}

/// Filters repeated payloads and draws outlines for new ones
pub struct Annotator {
    seen: SeenPayloads,
    color: Rgb<u8>,
    thickness: u32,
    label_offset: i32,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(&OverlayConfig::default())
    }
}

impl Annotator {
    pub fn new(style: &OverlayConfig) -> Self {
        Self {
            seen: SeenPayloads::new(),
            color: Rgb(style.color),
            thickness: style.thickness.max(1),
            label_offset: style.label_offset,
        }
    }

    pub fn seen(&self) -> &SeenPayloads {
        &self.seen
    }

    /// Annotate `frame` in place with every symbol not seen before
    pub fn annotate(
        &mut self,
        frame: &mut RgbImage,
        symbols: &[DetectedSymbol],
    ) -> FrameAnnotations {
        let mut result = FrameAnnotations::default();

        for symbol in symbols {
            let text = match symbol.text() {
                Ok(text) => text,
                Err(e) => {
                    debug!(
                        symbology = %symbol.symbology,
                        error = %e,
                        "Skipping symbol with non-UTF-8 payload"
                    );
                    continue;
                }
            };

            if !self.seen.insert(text) {
                continue;
            }

            let outline = outline(&symbol.polygon);
            for (from, to) in closed_segments(&outline) {
                draw_thick_line(frame, from, to, self.thickness, self.color);
            }

            result.labels.push(Label {
                text: format!("{} ({})", text, symbol.symbology),
                x: symbol.rect.left,
                y: symbol.rect.top - self.label_offset,
            });
            result.detections.push(Detection {
                symbology: symbol.symbology,
                payload: text.to_string(),
            });
        }

        result
    }
}

/// Outline to draw for a symbol polygon
///
/// Polygons with more than four vertices are replaced by their convex hull;
/// smaller ones are used as given.
pub fn outline(polygon: &[Point]) -> Vec<Point> {
    if polygon.len() <= HULL_VERTEX_THRESHOLD {
        return polygon.to_vec();
    }

    let points: Vec<imageproc::point::Point<i32>> = polygon
        .iter()
        .map(|p| imageproc::point::Point::new(p.x, p.y))
        .collect();

    imageproc::geometry::convex_hull(points.as_slice())
        .into_iter()
        .map(|p| Point::new(p.x, p.y))
        .collect()
}

/// Consecutive vertex pairs, wrapping the last vertex back to the first
pub fn closed_segments(outline: &[Point]) -> Vec<(Point, Point)> {
    let n = outline.len();
    (0..n).map(|j| (outline[j], outline[(j + 1) % n])).collect()
}

/// Line of the given thickness, drawn as parallel one-pixel segments
fn draw_thick_line(frame: &mut RgbImage, from: Point, to: Point, thickness: u32, color: Rgb<u8>) {
    let half = (thickness as i32 - 1) / 2;
    let extra = (thickness as i32 - 1) - half;
    let steep = (to.y - from.y).abs() > (to.x - from.x).abs();

    for offset in -half..=extra {
        let (dx, dy) = if steep { (offset, 0) } else { (0, offset) };
        draw_line_segment_mut(
            frame,
            ((from.x + dx) as f32, (from.y + dy) as f32),
            ((to.x + dx) as f32, (to.y + dy) as f32),
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seen_payloads_insert_once() {
        let mut seen = SeenPayloads::new();
        assert!(seen.insert("HELLO"));
        assert!(!seen.insert("HELLO"));
        assert!(seen.contains("HELLO"));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_closed_segments_wrap_around() {
        let square = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        let segments = closed_segments(&square);
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[3], (Point::new(0, 10), Point::new(0, 0)));
    }

    #[test]
    fn test_closed_segments_degenerate() {
        assert!(closed_segments(&[]).is_empty());
        let single = [Point::new(3, 4)];
        assert_eq!(closed_segments(&single), vec![(single[0], single[0])]);
    }

    #[test]
    fn test_thick_line_covers_neighbouring_rows() {
        let mut frame = RgbImage::new(20, 20);
        let green = Rgb([0, 255, 0]);
        draw_thick_line(&mut frame, Point::new(2, 10), Point::new(17, 10), 3, green);

        for y in 9..=11 {
            assert_eq!(*frame.get_pixel(10, y), green, "row {y}");
        }
        assert_eq!(*frame.get_pixel(10, 8), Rgb([0, 0, 0]));
        assert_eq!(*frame.get_pixel(10, 12), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_thick_line_out_of_frame_is_clipped() {
        let mut frame = RgbImage::new(8, 8);
        draw_thick_line(
            &mut frame,
            Point::new(-20, -5),
            Point::new(30, 40),
            3,
            Rgb([0, 255, 0]),
        );
    }
}
