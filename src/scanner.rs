// SPDX-License-Identifier: GPL-3.0-only

//! The scan loop
//!
//! Pulls frames from a [`FrameSource`], runs the decoders, lets the
//! [`Annotator`] filter and draw new symbols, then hands the frame to a
//! [`DisplaySink`] and checks for the quit key. The loop ends when the user
//! quits or the source stops producing frames.

use crate::backends::camera::{FrameSource, Frames};
use crate::config::Config;
use crate::errors::{CameraError, ScanError, ScanResult};
use crate::frame_processor::{Annotator, CompositeDecoder, Label, SymbolDecoder};
use image::RgbImage;
use std::collections::VecDeque;
use std::io::IsTerminal;
use std::time::Duration;
use tracing::{debug, info};

/// Everything drawn on top of the frame pixels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlay {
    /// Labels for symbols first seen in this frame
    pub labels: Vec<Label>,
    /// Most recent detection lines, oldest first
    pub recent: Vec<String>,
    /// Distinct payloads seen so far
    pub seen_count: usize,
}

/// Where annotated frames are shown and where the quit key comes from
pub trait DisplaySink {
    fn show(&mut self, frame: &RgbImage, overlay: &Overlay) -> Result<(), ScanError>;

    /// Wait up to `timeout` for input; true when the user asked to quit
    fn poll_quit(&mut self, timeout: Duration) -> Result<bool, ScanError>;
}

/// Receiver of `Detected ...` lines
pub trait DetectionLog {
    fn record(&mut self, line: &str);
}

impl DetectionLog for Vec<String> {
    fn record(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Detection lines for stdout
///
/// While stdout is the terminal hosting the viewer, lines are held back and
/// written by [`ConsoleLog::flush`] once the screen is restored. Redirected
/// output is written as it happens.
#[derive(Debug, Default)]
pub struct ConsoleLog {
    deferred: Option<Vec<String>>,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::with_deferral(std::io::stdout().is_terminal())
    }

    pub fn with_deferral(defer: bool) -> Self {
        Self {
            deferred: defer.then(Vec::new),
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    /// Write any held-back lines
    pub fn flush(&mut self) {
        if let Some(lines) = self.deferred.as_mut() {
            for line in lines.drain(..) {
                println!("{}", line);
            }
        }
    }
}

impl DetectionLog for ConsoleLog {
    fn record(&mut self, line: &str) {
        match self.deferred.as_mut() {
            Some(lines) => lines.push(line.to_string()),
            None => println!("{}", line),
        }
    }
}

/// Why the scan loop stopped
#[derive(Debug, Clone)]
pub enum ExitReason {
    /// The quit key was pressed
    QuitRequested,
    /// The source failed to deliver a frame
    StreamEnded(CameraError),
}

/// One scan session
///
/// Owns the set of payloads already reported, so a payload is announced at
/// most once per session.
pub struct Scanner {
    decoder: Box<dyn SymbolDecoder>,
    annotator: Annotator,
    recent: VecDeque<String>,
    recent_capacity: usize,
    poll_interval: Duration,
}

impl Scanner {
    pub fn new(
        decoder: impl SymbolDecoder + 'static,
        annotator: Annotator,
        poll_interval: Duration,
        recent_capacity: usize,
    ) -> Self {
        Self {
            decoder: Box::new(decoder),
            annotator,
            recent: VecDeque::with_capacity(recent_capacity),
            recent_capacity,
            poll_interval,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CompositeDecoder::from_config(&config.decoder),
            Annotator::new(&config.overlay),
            config.poll_interval(),
            config.panel_lines as usize,
        )
    }

    /// Run until the user quits or the source runs dry
    ///
    /// Errors are only returned for display failures; a failed frame read is
    /// a normal end of the session.
    pub fn run<S, D, L>(
        &mut self,
        source: &mut S,
        display: &mut D,
        log: &mut L,
    ) -> Result<ExitReason, ScanError>
    where
        S: FrameSource + ?Sized,
        D: DisplaySink + ?Sized,
        L: DetectionLog + ?Sized,
    {
        info!("Scan loop started");
        let mut frames = Frames::new(source);
        let mut count: u64 = 0;

        for mut frame in frames.by_ref() {
            count += 1;
            let overlay = self.process_frame(&mut frame, log);
            display.show(&frame, &overlay)?;

            if display.poll_quit(self.poll_interval)? {
                info!(frames = count, "Quit requested");
                return Ok(ExitReason::QuitRequested);
            }
        }

        let failure = frames
            .into_failure()
            .unwrap_or_else(|| CameraError::Read("stream ended".to_string()));
        info!(frames = count, reason = %failure, "Frame stream ended");
        Ok(ExitReason::StreamEnded(failure))
    }

    /// Decode and annotate one frame in place
    pub fn process_frame<L>(&mut self, frame: &mut RgbImage, log: &mut L) -> Overlay
    where
        L: DetectionLog + ?Sized,
    {
        let symbols = self.decoder.decode(frame);
        if !symbols.is_empty() {
            debug!(count = symbols.len(), "Symbols in frame");
        }

        let annotations = self.annotator.annotate(frame, &symbols);
        for detection in &annotations.detections {
            info!(
                symbology = %detection.symbology,
                payload = %detection.payload,
                "New symbol detected"
            );
            let line = detection.log_line();
            log.record(&line);
            self.remember(line);
        }

        Overlay {
            labels: annotations.labels,
            recent: self.recent.iter().cloned().collect(),
            seen_count: self.annotator.seen().len(),
        }
    }

    fn remember(&mut self, line: String) {
        if self.recent_capacity == 0 {
            return;
        }
        if self.recent.len() == self.recent_capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(line);
    }
}

/// Acquire the camera, then the display, and scan until quit or stream end
///
/// The display is never opened when the camera cannot be. It is released
/// before the camera on every exit path.
pub fn run_session<S, D, L>(
    config: &Config,
    open_camera: impl FnOnce(&Config) -> Result<S, CameraError>,
    open_display: impl FnOnce(&Config) -> ScanResult<D>,
    log: &mut L,
) -> ScanResult<ExitReason>
where
    S: FrameSource,
    D: DisplaySink,
    L: DetectionLog + ?Sized,
{
    let mut camera = open_camera(config)?;
    let mut display = open_display(config)?;
    Scanner::from_config(config).run(&mut camera, &mut display, log)
}
