#![forbid(unsafe_code)]

//! Output seams between effect drivers and the host.
//!
//! Drivers never touch the DOM. Canvas effects draw through [`Surface`],
//! element-style effects (counters, glow, tilt, glitch, typewriter) through
//! [`ElementSink`], and the terminal through [`TerminalSink`]. Each driver owns
//! its sink exclusively.
//!
//! The `Recording*` types capture calls for tests and headless runs.

use folio_core::geometry::{Point, Viewport};

use crate::terminal::LineStyle;
use crate::tilt::CardRect;

/// A 2D drawing surface owned by one canvas effect.
pub trait Surface {
    /// Match the backing store to the viewport.
    fn resize(&mut self, viewport: Viewport);

    /// Show or hide the surface element.
    fn set_visible(&mut self, visible: bool);

    /// Clear to transparent.
    fn clear(&mut self);

    /// Paint the background at `alpha` over the previous frame (trail effect).
    fn fade(&mut self, alpha: f64);

    /// Filled circle. `glow` requests a soft shadow.
    fn circle(&mut self, center: Point, radius: f64, alpha: f64, glow: bool);

    /// Stroke from `from` to `to`.
    fn line(&mut self, from: Point, to: Point, alpha: f64, width: f64);

    /// A single glyph with its top-left at `at`.
    fn glyph(&mut self, at: Point, ch: char, size: f64, brightness: f64);

    /// Full-width horizontal band.
    fn band(&mut self, y: f64, height: f64, alpha: f64);
}

/// CSS transform applied to an element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Transform {
    #[default]
    Identity,
    Translate(Point),
    /// Rotation in degrees around X and Y, plus uniform scale.
    Tilt { rotate_x: f64, rotate_y: f64, scale: f64 },
}

/// Style/text updates on a single host element.
///
/// Every method defaults to a no-op so sinks implement only what they back.
pub trait ElementSink {
    fn set_visible(&mut self, _visible: bool) {}
    fn set_text(&mut self, _text: &str) {}
    fn set_transform(&mut self, _transform: Transform) {}
    /// Fill fraction in [0, 1] (skill bars).
    fn set_progress(&mut self, _fraction: f64) {}
    fn set_opacity(&mut self, _opacity: f64) {}
    /// Current layout box in viewport coordinates, if the host can measure it.
    fn bounds(&self) -> Option<CardRect> {
        None
    }
}

/// Line-oriented output for the simulated terminal.
pub trait TerminalSink {
    fn push_line(&mut self, text: &str, style: LineStyle, blink: bool);
    fn update_last_line(&mut self, text: &str);
    fn set_cursor(&mut self, visible: bool);
    fn clear(&mut self);
}

impl<T: Surface + ?Sized> Surface for Box<T> {
    fn resize(&mut self, viewport: Viewport) {
        (**self).resize(viewport);
    }
    fn set_visible(&mut self, visible: bool) {
        (**self).set_visible(visible);
    }
    fn clear(&mut self) {
        (**self).clear();
    }
    fn fade(&mut self, alpha: f64) {
        (**self).fade(alpha);
    }
    fn circle(&mut self, center: Point, radius: f64, alpha: f64, glow: bool) {
        (**self).circle(center, radius, alpha, glow);
    }
    fn line(&mut self, from: Point, to: Point, alpha: f64, width: f64) {
        (**self).line(from, to, alpha, width);
    }
    fn glyph(&mut self, at: Point, ch: char, size: f64, brightness: f64) {
        (**self).glyph(at, ch, size, brightness);
    }
    fn band(&mut self, y: f64, height: f64, alpha: f64) {
        (**self).band(y, height, alpha);
    }
}

impl<T: ElementSink + ?Sized> ElementSink for Box<T> {
    fn set_visible(&mut self, visible: bool) {
        (**self).set_visible(visible);
    }
    fn set_text(&mut self, text: &str) {
        (**self).set_text(text);
    }
    fn set_transform(&mut self, transform: Transform) {
        (**self).set_transform(transform);
    }
    fn set_progress(&mut self, fraction: f64) {
        (**self).set_progress(fraction);
    }
    fn set_opacity(&mut self, opacity: f64) {
        (**self).set_opacity(opacity);
    }
    fn bounds(&self) -> Option<CardRect> {
        (**self).bounds()
    }
}

impl<T: TerminalSink + ?Sized> TerminalSink for Box<T> {
    fn push_line(&mut self, text: &str, style: LineStyle, blink: bool) {
        (**self).push_line(text, style, blink);
    }
    fn update_last_line(&mut self, text: &str) {
        (**self).update_last_line(text);
    }
    fn set_cursor(&mut self, visible: bool) {
        (**self).set_cursor(visible);
    }
    fn clear(&mut self) {
        (**self).clear();
    }
}

impl<T: ElementSink + ?Sized> ElementSink for &mut T {
    fn set_visible(&mut self, visible: bool) {
        (**self).set_visible(visible);
    }
    fn set_text(&mut self, text: &str) {
        (**self).set_text(text);
    }
    fn set_transform(&mut self, transform: Transform) {
        (**self).set_transform(transform);
    }
    fn set_progress(&mut self, fraction: f64) {
        (**self).set_progress(fraction);
    }
    fn set_opacity(&mut self, opacity: f64) {
        (**self).set_opacity(opacity);
    }
    fn bounds(&self) -> Option<CardRect> {
        (**self).bounds()
    }
}

impl<T: TerminalSink + ?Sized> TerminalSink for &mut T {
    fn push_line(&mut self, text: &str, style: LineStyle, blink: bool) {
        (**self).push_line(text, style, blink);
    }
    fn update_last_line(&mut self, text: &str) {
        (**self).update_last_line(text);
    }
    fn set_cursor(&mut self, visible: bool) {
        (**self).set_cursor(visible);
    }
    fn clear(&mut self) {
        (**self).clear();
    }
}

/// One recorded [`Surface`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    Fade(f64),
    Circle { center: Point, radius: f64, alpha: f64, glow: bool },
    Line { from: Point, to: Point, alpha: f64, width: f64 },
    Glyph { at: Point, ch: char, brightness: f64 },
    Band { y: f64, height: f64, alpha: f64 },
}

/// [`Surface`] that records every call.
///
/// Operations accumulate until [`take_ops`](Self::take_ops); `clear` is
/// recorded like any other op so frames can be split on it.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    ops: Vec<DrawOp>,
    visible: bool,
    viewport: Viewport,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            visible: true,
            viewport: Viewport::default(),
        }
    }

    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Line ops recorded since the last `Clear`.
    #[must_use]
    pub fn lines_in_last_frame(&self) -> usize {
        self.last_frame()
            .iter()
            .filter(|op| matches!(op, DrawOp::Line { .. }))
            .count()
    }

    /// Ops recorded since the last `Clear` (or all, if none).
    #[must_use]
    pub fn last_frame(&self) -> &[DrawOp] {
        match self.ops.iter().rposition(|op| *op == DrawOp::Clear) {
            Some(idx) => &self.ops[idx + 1..],
            None => &self.ops,
        }
    }
}

impl Surface for RecordingSurface {
    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn clear(&mut self) {
        self.ops.push(DrawOp::Clear);
    }

    fn fade(&mut self, alpha: f64) {
        self.ops.push(DrawOp::Fade(alpha));
    }

    fn circle(&mut self, center: Point, radius: f64, alpha: f64, glow: bool) {
        self.ops.push(DrawOp::Circle {
            center,
            radius,
            alpha,
            glow,
        });
    }

    fn line(&mut self, from: Point, to: Point, alpha: f64, width: f64) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            alpha,
            width,
        });
    }

    fn glyph(&mut self, at: Point, ch: char, _size: f64, brightness: f64) {
        self.ops.push(DrawOp::Glyph { at, ch, brightness });
    }

    fn band(&mut self, y: f64, height: f64, alpha: f64) {
        self.ops.push(DrawOp::Band { y, height, alpha });
    }
}

/// [`ElementSink`] that keeps the latest value of each property.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingElement {
    pub visible: bool,
    pub text: String,
    pub transform: Transform,
    pub progress: f64,
    pub opacity: f64,
    /// Number of `set_text` calls.
    pub text_writes: usize,
    /// Reported layout box.
    pub bounds: Option<CardRect>,
}

impl Default for RecordingElement {
    fn default() -> Self {
        Self {
            visible: true,
            text: String::new(),
            transform: Transform::Identity,
            progress: 0.0,
            opacity: 1.0,
            text_writes: 0,
            bounds: None,
        }
    }
}

impl ElementSink for RecordingElement {
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
    fn set_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
        self.text_writes += 1;
    }
    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }
    fn set_progress(&mut self, fraction: f64) {
        self.progress = fraction;
    }
    fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity;
    }
    fn bounds(&self) -> Option<CardRect> {
        self.bounds
    }
}

/// A line as seen by [`RecordingTerminal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLine {
    pub text: String,
    pub style: LineStyle,
    pub blink: bool,
}

/// [`TerminalSink`] that keeps the rendered transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingTerminal {
    pub lines: Vec<RecordedLine>,
    pub cursor_visible: bool,
    /// Number of sink calls of any kind.
    pub writes: usize,
}

impl RecordingTerminal {
    /// Transcript text, one entry per line.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }
}

impl TerminalSink for RecordingTerminal {
    fn push_line(&mut self, text: &str, style: LineStyle, blink: bool) {
        self.writes += 1;
        self.lines.push(RecordedLine {
            text: text.to_owned(),
            style,
            blink,
        });
    }

    fn update_last_line(&mut self, text: &str) {
        self.writes += 1;
        if let Some(last) = self.lines.last_mut() {
            last.text.clear();
            last.text.push_str(text);
        }
    }

    fn set_cursor(&mut self, visible: bool) {
        self.writes += 1;
        self.cursor_visible = visible;
    }

    fn clear(&mut self) {
        self.writes += 1;
        self.lines.clear();
    }
}
