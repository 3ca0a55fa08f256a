// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │     Scan loop       │
//! └──────────┬──────────┘
//!            │ Frames (lazy, stops at first read failure)
//!            ▼
//! ┌─────────────────────┐
//! │  FrameSource trait  │  ← Common interface
//! └──────────┬──────────┘
//!            │
//!            ▼
//!       ┌────────┐
//!       │  V4L2  │  ← Concrete implementation
//!       └────────┘
//! ```

pub mod format_converters;
pub mod types;
pub mod v4l2;

pub use types::*;
pub use v4l2::{V4l2Camera, enumerate_cameras};

use crate::constants::MAX_CONSECUTIVE_BAD_FRAMES;
use crate::errors::CameraError;
use image::RgbImage;
use tracing::warn;

/// Anything that yields RGB frames one at a time
pub trait FrameSource {
    /// Block until the next frame is available
    fn read_frame(&mut self) -> Result<RgbImage, CameraError>;

    /// Lazy sequence of frames that ends at the first read failure
    fn frames(&mut self) -> Frames<'_, Self>
    where
        Self: Sized,
    {
        Frames::new(self)
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> Result<RgbImage, CameraError> {
        (**self).read_frame()
    }
}

/// Iterator over a frame source
///
/// A buffer that cannot be converted is skipped; a failed read, or too many
/// bad buffers in a row, exhausts the iterator for good. The failure is kept
/// so the caller can report why the stream ended.
pub struct Frames<'a, S: FrameSource + ?Sized> {
    source: &'a mut S,
    failure: Option<CameraError>,
    bad_in_a_row: u32,
}

impl<'a, S: FrameSource + ?Sized> Frames<'a, S> {
    pub fn new(source: &'a mut S) -> Self {
        Self {
            source,
            failure: None,
            bad_in_a_row: 0,
        }
    }

    /// The error that ended the stream, if it has ended
    pub fn failure(&self) -> Option<&CameraError> {
        self.failure.as_ref()
    }

    pub fn into_failure(self) -> Option<CameraError> {
        self.failure
    }
}

impl<S: FrameSource + ?Sized> Iterator for Frames<'_, S> {
    type Item = RgbImage;

    fn next(&mut self) -> Option<RgbImage> {
        if self.failure.is_some() {
            return None;
        }

        loop {
            match self.source.read_frame() {
                Ok(frame) => {
                    self.bad_in_a_row = 0;
                    return Some(frame);
                }
                Err(e @ CameraError::Conversion(_))
                    if self.bad_in_a_row + 1 < MAX_CONSECUTIVE_BAD_FRAMES =>
                {
                    self.bad_in_a_row += 1;
                    warn!(error = %e, skipped = self.bad_in_a_row, "Skipping undecodable frame");
                }
                Err(e) => {
                    warn!(error = %e, "Frame read failed, ending stream");
                    self.failure = Some(e);
                    return None;
                }
            }
        }
    }
}

impl<S: FrameSource + ?Sized> std::iter::FusedIterator for Frames<'_, S> {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countdown(u32);

    impl FrameSource for Countdown {
        fn read_frame(&mut self) -> Result<RgbImage, CameraError> {
            if self.0 == 0 {
                return Err(CameraError::Read("no more frames".to_string()));
            }
            self.0 -= 1;
            Ok(RgbImage::new(2, 2))
        }
    }

    #[test]
    fn test_frames_stop_at_first_failure() {
        let mut source = Countdown(3);
        let mut frames = source.frames();
        assert_eq!(frames.by_ref().count(), 3);
        assert!(matches!(frames.failure(), Some(CameraError::Read(_))));
        assert!(frames.next().is_none());
    }

    /// Replays a fixed script of reads, then fails
    struct Script(Vec<Result<(), CameraError>>);

    impl FrameSource for Script {
        fn read_frame(&mut self) -> Result<RgbImage, CameraError> {
            if self.0.is_empty() {
                return Err(CameraError::Read("end of script".to_string()));
            }
            self.0.remove(0).map(|()| RgbImage::new(2, 2))
        }
    }

    fn corrupt() -> Result<(), CameraError> {
        Err(CameraError::Conversion("truncated JPEG".to_string()))
    }

    #[test]
    fn test_corrupt_frames_are_skipped() {
        let mut source = Script(vec![corrupt(), Ok(()), corrupt(), corrupt(), Ok(())]);
        let mut frames = source.frames();
        assert_eq!(frames.by_ref().count(), 2);
        assert!(matches!(frames.failure(), Some(CameraError::Read(_))));
    }

    #[test]
    fn test_endless_corrupt_frames_end_stream() {
        let script = (0..MAX_CONSECUTIVE_BAD_FRAMES + 5).map(|_| corrupt()).collect();
        let mut source = Script(script);
        let mut frames = source.frames();
        assert!(frames.next().is_none());
        assert!(matches!(frames.failure(), Some(CameraError::Conversion(_))));
        assert_eq!(source.0.len(), 5, "Reads stop at the limit");
    }

    #[test]
    fn test_frames_are_not_restartable() {
        let mut source = Countdown(1);
        let mut frames = source.frames();
        assert!(frames.next().is_some());
        assert!(frames.next().is_none());
        // The source would error again, but the iterator never asks
        assert!(frames.next().is_none());
        assert!(frames.into_failure().is_some());
    }
}
