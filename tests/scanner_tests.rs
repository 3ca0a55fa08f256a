// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the scan loop, using a scripted frame source,
//! decoder and display

use code_scanner::backends::camera::FrameSource;
use code_scanner::config::Config;
use code_scanner::errors::{CameraError, ScanError};
use code_scanner::frame_processor::{Annotator, DetectedSymbol, Point, SymbolDecoder, Symbology};
use code_scanner::scanner::{DisplaySink, ExitReason, Overlay, Scanner, run_session};
use image::{Rgb, RgbImage};
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

/// Yields `frames` blank frames, then fails
struct ScriptedSource {
    remaining: usize,
    reads: usize,
}

impl ScriptedSource {
    fn new(frames: usize) -> Self {
        Self {
            remaining: frames,
            reads: 0,
        }
    }
}

impl FrameSource for ScriptedSource {
    fn read_frame(&mut self) -> Result<RgbImage, CameraError> {
        self.reads += 1;
        if self.remaining == 0 {
            return Err(CameraError::Read("end of script".to_string()));
        }
        self.remaining -= 1;
        Ok(RgbImage::new(80, 80))
    }
}

/// Returns the next scripted symbol list for each frame, then nothing
struct ScriptedDecoder {
    per_frame: VecDeque<Vec<DetectedSymbol>>,
    repeat: Option<Vec<DetectedSymbol>>,
}

impl ScriptedDecoder {
    fn repeating(symbols: Vec<DetectedSymbol>) -> Self {
        Self {
            per_frame: VecDeque::new(),
            repeat: Some(symbols),
        }
    }

    fn sequence(frames: Vec<Vec<DetectedSymbol>>) -> Self {
        Self {
            per_frame: frames.into(),
            repeat: None,
        }
    }
}

impl SymbolDecoder for ScriptedDecoder {
    fn decode(&mut self, _frame: &RgbImage) -> Vec<DetectedSymbol> {
        self.per_frame
            .pop_front()
            .or_else(|| self.repeat.clone())
            .unwrap_or_default()
    }
}

/// Records what it is shown and asks to quit after `quit_after` frames
#[derive(Default)]
struct RecordingDisplay {
    shown: Vec<(RgbImage, Overlay)>,
    quit_after: Option<usize>,
    fail_show: bool,
}

impl DisplaySink for RecordingDisplay {
    fn show(&mut self, frame: &RgbImage, overlay: &Overlay) -> Result<(), ScanError> {
        if self.fail_show {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal gone").into());
        }
        self.shown.push((frame.clone(), overlay.clone()));
        Ok(())
    }

    fn poll_quit(&mut self, _timeout: Duration) -> Result<bool, ScanError> {
        Ok(self.quit_after == Some(self.shown.len()))
    }
}

fn hello() -> DetectedSymbol {
    DetectedSymbol::new(
        Symbology::QrCode,
        b"HELLO".to_vec(),
        vec![
            Point::new(20, 30),
            Point::new(60, 30),
            Point::new(60, 70),
            Point::new(20, 70),
        ],
    )
}

fn scanner(decoder: ScriptedDecoder) -> Scanner {
    Scanner::new(decoder, Annotator::default(), Duration::from_millis(1), 5)
}

#[test]
fn test_repeated_payload_logged_once() {
    let mut source = ScriptedSource::new(10);
    let mut display = RecordingDisplay::default();
    let mut log: Vec<String> = Vec::new();

    let reason = scanner(ScriptedDecoder::repeating(vec![hello()]))
        .run(&mut source, &mut display, &mut log)
        .unwrap();

    assert!(matches!(reason, ExitReason::StreamEnded(CameraError::Read(_))));
    assert_eq!(log, vec!["Detected QRCODE: HELLO".to_string()]);
    assert_eq!(display.shown.len(), 10);

    // Drawn and labelled on the first frame only
    let (first, first_overlay) = &display.shown[0];
    assert_eq!(*first.get_pixel(40, 30), Rgb([0, 255, 0]));
    assert_eq!(first_overlay.labels.len(), 1);
    assert_eq!(first_overlay.labels[0].text, "HELLO (QRCODE)");
    assert_eq!((first_overlay.labels[0].x, first_overlay.labels[0].y), (20, 20));

    for (frame, overlay) in &display.shown[1..] {
        assert_eq!(*frame.get_pixel(40, 30), Rgb([0, 0, 0]));
        assert!(overlay.labels.is_empty());
        assert_eq!(overlay.seen_count, 1);
        assert_eq!(overlay.recent, vec!["Detected QRCODE: HELLO".to_string()]);
    }
}

#[test]
fn test_quit_key_stops_loop() {
    let mut source = ScriptedSource::new(100);
    let mut display = RecordingDisplay {
        quit_after: Some(3),
        ..Default::default()
    };
    let mut log: Vec<String> = Vec::new();

    let reason = scanner(ScriptedDecoder::sequence(Vec::new()))
        .run(&mut source, &mut display, &mut log)
        .unwrap();

    assert!(matches!(reason, ExitReason::QuitRequested));
    assert_eq!(display.shown.len(), 3);
    assert_eq!(source.reads, 3, "No frame should be read after quitting");
}

#[test]
fn test_read_failure_ends_without_error() {
    let mut source = ScriptedSource::new(0);
    let mut display = RecordingDisplay::default();
    let mut log: Vec<String> = Vec::new();

    let reason = scanner(ScriptedDecoder::sequence(Vec::new()))
        .run(&mut source, &mut display, &mut log)
        .expect("a read failure is a normal end of the session");

    assert!(matches!(reason, ExitReason::StreamEnded(_)));
    assert!(display.shown.is_empty());
    assert_eq!(source.reads, 1);
}

#[test]
fn test_display_error_is_returned() {
    let mut source = ScriptedSource::new(5);
    let mut display = RecordingDisplay {
        fail_show: true,
        ..Default::default()
    };
    let mut log: Vec<String> = Vec::new();

    let err = scanner(ScriptedDecoder::sequence(Vec::new()))
        .run(&mut source, &mut display, &mut log)
        .unwrap_err();

    assert!(matches!(err, ScanError::Display(_)));
}

#[test]
fn test_each_new_payload_logged_in_order() {
    let ean = DetectedSymbol::new(
        Symbology::Ean13,
        b"4006381333931".to_vec(),
        vec![Point::new(5, 5), Point::new(5, 15), Point::new(40, 15), Point::new(40, 5)],
    );
    let invalid = DetectedSymbol::new(Symbology::QrCode, vec![0xc3, 0x28], Vec::new());
    let frames = vec![
        vec![hello()],
        vec![invalid, hello(), ean.clone()],
        vec![ean.clone(), ean],
    ];

    let mut source = ScriptedSource::new(3);
    let mut display = RecordingDisplay::default();
    let mut log: Vec<String> = Vec::new();

    scanner(ScriptedDecoder::sequence(frames))
        .run(&mut source, &mut display, &mut log)
        .unwrap();

    assert_eq!(
        log,
        vec![
            "Detected QRCODE: HELLO".to_string(),
            "Detected EAN13: 4006381333931".to_string(),
        ]
    );
    assert_eq!(display.shown[2].1.seen_count, 2);
}

#[test]
fn test_duplicates_within_one_frame() {
    let mut source = ScriptedSource::new(1);
    let mut display = RecordingDisplay::default();
    let mut log: Vec<String> = Vec::new();

    scanner(ScriptedDecoder::sequence(vec![vec![hello(), hello()]]))
        .run(&mut source, &mut display, &mut log)
        .unwrap();

    assert_eq!(log.len(), 1);
    assert_eq!(display.shown[0].1.labels.len(), 1);
}

#[test]
fn test_open_failure_never_opens_display() {
    let mut display_opened = false;
    let mut log: Vec<String> = Vec::new();

    let result = run_session(
        &Config::default(),
        |config| -> Result<ScriptedSource, CameraError> {
            Err(CameraError::Open {
                index: config.camera_index,
                reason: "No such device".to_string(),
            })
        },
        |_| {
            display_opened = true;
            Ok(RecordingDisplay::default())
        },
        &mut log,
    );

    assert!(matches!(
        result,
        Err(ScanError::Camera(CameraError::Open { index: 0, .. }))
    ));
    assert!(!display_opened, "No viewer should appear when the camera is unusable");
    assert!(log.is_empty());
}

#[test]
fn test_session_runs_until_quit() {
    let mut log: Vec<String> = Vec::new();

    let result = run_session(
        &Config::default(),
        |_| Ok(ScriptedSource::new(10)),
        |_| {
            Ok(RecordingDisplay {
                quit_after: Some(2),
                ..Default::default()
            })
        },
        &mut log,
    );

    assert!(matches!(result, Ok(ExitReason::QuitRequested)));
}
