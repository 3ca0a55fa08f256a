// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based scan viewer
//!
//! Renders the annotated feed to the terminal using Unicode half-block
//! characters for improved vertical resolution, with the most recent
//! detections and a status bar underneath.

use crate::errors::ScanError;
use crate::frame_processor::Label;
use crate::scanner::{DisplaySink, Overlay};

use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
    },
};
use image::RgbImage;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};
use std::io::{self, Stdout, stdout};
use std::time::Duration;
use tracing::{info, warn};

/// Full-screen viewer on the controlling terminal
///
/// The terminal is put back into its normal state when the viewer is
/// dropped, whichever way the scan loop ended.
pub struct TerminalViewer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    quit_key: char,
    panel_lines: u16,
    label_color: Color,
}

impl TerminalViewer {
    /// Enter raw mode and the alternate screen and set the window title
    pub fn open(title: &str, quit_key: char, panel_lines: u16) -> io::Result<Self> {
        enable_raw_mode()?;

        let mut stdout = stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, SetTitle(title)) {
            let _ = restore_terminal();
            return Err(e);
        }

        let terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => terminal,
            Err(e) => {
                let _ = restore_terminal();
                return Err(e);
            }
        };

        info!(title, "Viewer opened");
        Ok(Self {
            terminal,
            quit_key,
            panel_lines,
            label_color: Color::Green,
        })
    }

    /// Colour used for labels drawn over the frame
    pub fn with_label_color(mut self, rgb: [u8; 3]) -> Self {
        self.label_color = Color::Rgb(rgb[0], rgb[1], rgb[2]);
        self
    }
}

impl DisplaySink for TerminalViewer {
    fn show(&mut self, frame: &RgbImage, overlay: &Overlay) -> Result<(), ScanError> {
        let status = status_message(self.quit_key, overlay.seen_count);
        let panel_lines = self.panel_lines;
        let label_color = self.label_color;

        self.terminal.draw(|f| {
            let (video_area, panel_area, status_area) = split_area(f.area(), panel_lines);

            f.render_widget(
                FrameWidget {
                    frame,
                    labels: &overlay.labels,
                    label_color,
                },
                video_area,
            );
            f.render_widget(
                DetectionPanel {
                    lines: &overlay.recent,
                },
                panel_area,
            );
            f.render_widget(StatusBar { message: &status }, status_area);
        })?;

        Ok(())
    }

    fn poll_quit(&mut self, timeout: Duration) -> Result<bool, ScanError> {
        if !event::poll(timeout)? {
            return Ok(false);
        }

        // Drain everything queued so a quit key behind resize or mouse
        // events is seen in this iteration
        let mut pending = vec![event::read()?];
        while event::poll(Duration::ZERO)? {
            pending.push(event::read()?);
        }
        Ok(quit_requested(&pending, self.quit_key))
    }
}

impl Drop for TerminalViewer {
    fn drop(&mut self) {
        if let Err(e) = restore_terminal() {
            warn!(error = %e, "Failed to restore terminal");
        }
        info!("Viewer closed");
    }
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen, Show)
}

/// True for the configured quit key, and for Ctrl+C since raw mode
/// swallows SIGINT
pub fn is_quit_key(key: &KeyEvent, quit_key: char) -> bool {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => true,
        KeyCode::Char(c) => c == quit_key && !key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// True if any key press among `events` is a quit key
fn quit_requested(events: &[Event], quit_key: char) -> bool {
    events.iter().any(|event| {
        matches!(event, Event::Key(key)
            if key.kind == KeyEventKind::Press && is_quit_key(key, quit_key))
    })
}

fn status_message(quit_key: char, seen: usize) -> String {
    let noun = if seen == 1 { "code" } else { "codes" };
    format!("'{}' quit | {} {} seen", quit_key, seen, noun)
}

/// Video on top, detection panel below it, status bar on the last line
fn split_area(area: Rect, panel_lines: u16) -> (Rect, Rect, Rect) {
    let status_height = area.height.min(1);
    let panel_height = panel_lines.min(area.height - status_height);
    let video_height = area.height - status_height - panel_height;

    let video = Rect {
        height: video_height,
        ..area
    };
    let panel = Rect {
        y: area.y + video_height,
        height: panel_height,
        ..area
    };
    let status = Rect {
        y: area.y + video_height + panel_height,
        height: status_height,
        ..area
    };
    (video, panel, status)
}

/// Where a frame lands inside a widget area
///
/// Each terminal cell shows two vertically stacked pixels: the upper one as
/// the foreground of `▀`, the lower one as the background.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FrameLayout {
    x_offset: u16,
    y_offset: u16,
    width: u16,
    height: u16,
    x_scale: f64,
    y_scale: f64,
}

impl FrameLayout {
    /// Fit a frame into `area` keeping its aspect ratio, centred
    fn fit(frame_width: u32, frame_height: u32, area: Rect) -> Option<Self> {
        if frame_width == 0 || frame_height == 0 || area.width == 0 || area.height == 0 {
            return None;
        }

        let frame_aspect = frame_width as f64 / frame_height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (width, height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            ((h * frame_aspect) as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            (w as u16, (w / frame_aspect / 2.0) as u16)
        };
        if width == 0 || height == 0 {
            return None;
        }

        Some(Self {
            x_offset: area.x + (area.width.saturating_sub(width)) / 2,
            y_offset: area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
            x_scale: frame_width as f64 / width as f64,
            y_scale: frame_height as f64 / (height * 2) as f64,
        })
    }

    /// Source pixel for column `tx` and half-row `half_row`
    fn source_pixel(&self, tx: u16, half_row: u32) -> (u32, u32) {
        (
            (tx as f64 * self.x_scale) as u32,
            (half_row as f64 * self.y_scale) as u32,
        )
    }

    /// Cell containing frame pixel `(x, y)`, clamped into the layout
    fn cell_for(&self, x: i32, y: i32) -> (u16, u16) {
        let tx = (x.max(0) as f64 / self.x_scale) as u16;
        let ty = (y.max(0) as f64 / self.y_scale / 2.0) as u16;
        (
            self.x_offset + tx.min(self.width - 1),
            self.y_offset + ty.min(self.height - 1),
        )
    }
}

/// Renders a frame with half-block characters and its labels on top
struct FrameWidget<'a> {
    frame: &'a RgbImage,
    labels: &'a [Label],
    label_color: Color,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(layout) = FrameLayout::fit(self.frame.width(), self.frame.height(), area) else {
            let msg = "Waiting for camera...";
            if area.width > 0 && area.height > 0 {
                let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
                let y = area.y + area.height / 2;
                buf.set_stringn(x, y, msg, area.width as usize, Style::default());
            }
            return;
        };

        for ty in 0..layout.height {
            for tx in 0..layout.width {
                let (src_x, src_y_top) = layout.source_pixel(tx, ty as u32 * 2);
                let (_, src_y_bottom) = layout.source_pixel(tx, ty as u32 * 2 + 1);

                if let Some(cell) = buf.cell_mut((layout.x_offset + tx, layout.y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(self.frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(self.frame, src_x, src_y_bottom));
                }
            }
        }

        let style = Style::default().fg(self.label_color).bg(Color::Black);
        let right_edge = area.x + area.width;
        for label in self.labels {
            let (x, y) = layout.cell_for(label.x, label.y);
            buf.set_stringn(x, y, &label.text, (right_edge - x) as usize, style);
        }
    }
}

fn sample_pixel(frame: &RgbImage, x: u32, y: u32) -> Color {
    let x = x.min(frame.width() - 1);
    let y = y.min(frame.height() - 1);
    let [r, g, b] = frame.get_pixel(x, y).0;
    Color::Rgb(r, g, b)
}

/// Most recent detection lines, newest at the bottom
struct DetectionPanel<'a> {
    lines: &'a [String],
}

impl Widget for DetectionPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let visible = self.lines.len().min(area.height as usize);
        let skip = self.lines.len() - visible;
        let style = Style::default().fg(Color::Green);

        for (row, line) in self.lines[skip..].iter().enumerate() {
            buf.set_stringn(area.x, area.y + row as u16, line, area.width as usize, style);
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        buf.set_stringn(
            area.x,
            area.y,
            self.message,
            area.width as usize,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
