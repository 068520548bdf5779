#![forbid(unsafe_code)]

//! Simulated terminal.
//!
//! Plays a script of [`TerminalLine`]s into a [`TerminalSink`]. Each line
//! waits for its own delay; command lines are typed one character at a time,
//! everything else appears at once. After the last line the cursor blinks
//! until the driver is cancelled.
//!
//! Scripts can come from host JSON:
//!
//! ```json
//! [
//!   { "text": "whoami", "style": "command" },
//!   { "text": "guest", "delay_ms": 200 },
//!   { "text": "ready", "style": "success", "blink": true }
//! ]
//! ```

use std::time::Duration;

use folio_core::capability::CapabilityProfile;
use folio_core::clock::FrameTick;
use serde::Deserialize;

use crate::effect::{Effect, InertReason, Mount, catch_up, gate};
use crate::resolver::{EffectKind, EffectParams, RenderMode};
use crate::surface::TerminalSink;

/// Delay before a line when the script does not give one.
pub const DEFAULT_LINE_DELAY_MS: u64 = 400;
/// Per-character interval when typing a command.
pub const TYPE_INTERVAL: Duration = Duration::from_millis(35);
/// Cursor half-period once the script is done.
pub const CURSOR_BLINK: Duration = Duration::from_millis(530);

/// How a line is styled by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    /// Prompted input; typed out.
    Command,
    #[default]
    Output,
    Success,
    Warning,
    Error,
    Comment,
}

impl LineStyle {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Output => "output",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Comment => "comment",
        }
    }
}

fn default_delay_ms() -> u64 {
    DEFAULT_LINE_DELAY_MS
}

/// One scripted line. Every field is explicit; absent JSON fields take the
/// documented defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TerminalLine {
    pub text: String,
    #[serde(default)]
    pub style: LineStyle,
    /// Wait before this line appears, measured from the previous line.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default)]
    pub blink: bool,
}

impl TerminalLine {
    #[must_use]
    pub fn new(text: impl Into<String>, style: LineStyle) -> Self {
        Self {
            text: text.into(),
            style,
            delay_ms: DEFAULT_LINE_DELAY_MS,
            blink: false,
        }
    }

    #[must_use]
    pub fn command(text: impl Into<String>) -> Self {
        Self::new(text, LineStyle::Command)
    }

    #[must_use]
    pub fn output(text: impl Into<String>) -> Self {
        Self::new(text, LineStyle::Output)
    }

    #[must_use]
    pub fn with_style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    #[must_use]
    pub fn blinking(mut self) -> Self {
        self.blink = true;
        self
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Script used when the host supplies none.
#[must_use]
pub fn default_script() -> Vec<TerminalLine> {
    vec![
        TerminalLine::command("whoami").with_delay_ms(300),
        TerminalLine::output("guest@folio"),
        TerminalLine::command("cat skills.txt"),
        TerminalLine::output("rust  systems  web  graphics").with_delay_ms(250),
        TerminalLine::command("./deploy --prod"),
        TerminalLine::output("building...").with_style(LineStyle::Comment),
        TerminalLine::output("deployed").with_style(LineStyle::Success).blinking(),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Waiting for `line`'s delay.
    Waiting { line: usize },
    /// Typing `line`; `typed` characters shown so far.
    Typing { line: usize, typed: usize },
    /// Script finished; cursor blinking.
    Done,
}

#[derive(Debug)]
pub struct Terminal<T: TerminalSink> {
    sink: T,
    script: Vec<TerminalLine>,
    progress: Progress,
    next_at: Option<Duration>,
    cursor_on: bool,
}

impl<T: TerminalSink> Terminal<T> {
    pub fn mount(
        profile: &CapabilityProfile,
        sink: Option<T>,
        script: Vec<TerminalLine>,
    ) -> Mount<Self> {
        let params = EffectParams::resolve(profile, EffectKind::Terminal);
        Self::with_params(params, profile.prefers_reduced_motion, sink, script)
    }

    pub fn with_params(
        params: EffectParams,
        reduced_motion: bool,
        sink: Option<T>,
        script: Vec<TerminalLine>,
    ) -> Mount<Self> {
        let mut sink = match gate(&params, sink, reduced_motion, |s| s.clear()) {
            Ok(sink) => sink,
            Err(reason) => return Mount::Inert(reason),
        };
        if script.is_empty() {
            return Mount::Inert(InertReason::NoContent);
        }
        if params.mode == RenderMode::Static {
            sink.clear();
            for line in &script {
                sink.push_line(&line.text, line.style, line.blink);
            }
            sink.set_cursor(true);
            return Mount::Inert(InertReason::StaticOnly);
        }
        sink.clear();
        sink.set_cursor(false);
        Mount::Active(Self {
            sink,
            script,
            progress: Progress::Waiting { line: 0 },
            next_at: None,
            cursor_on: false,
        })
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    #[must_use]
    pub fn sink(&self) -> &T {
        &self.sink
    }

    fn finish_line(&mut self, line: usize) -> Duration {
        match self.script.get(line + 1) {
            Some(next) => {
                self.progress = Progress::Waiting { line: line + 1 };
                next.delay()
            }
            None => {
                tracing::debug!(lines = self.script.len(), "terminal script complete");
                self.progress = Progress::Done;
                self.cursor_on = true;
                self.sink.set_cursor(true);
                CURSOR_BLINK
            }
        }
    }

    fn step(&mut self) -> Duration {
        match self.progress {
            Progress::Waiting { line } => {
                let entry = &self.script[line];
                if entry.style == LineStyle::Command && !entry.text.is_empty() {
                    self.sink.push_line("", entry.style, entry.blink);
                    self.progress = Progress::Typing { line, typed: 0 };
                    TYPE_INTERVAL
                } else {
                    self.sink.push_line(&entry.text, entry.style, entry.blink);
                    self.finish_line(line)
                }
            }
            Progress::Typing { line, typed } => {
                let typed = typed + 1;
                let entry = &self.script[line];
                let shown: String = entry.text.chars().take(typed).collect();
                self.sink.update_last_line(&shown);
                if typed >= entry.text.chars().count() {
                    self.finish_line(line)
                } else {
                    self.progress = Progress::Typing { line, typed };
                    TYPE_INTERVAL
                }
            }
            Progress::Done => {
                self.cursor_on = !self.cursor_on;
                self.sink.set_cursor(self.cursor_on);
                CURSOR_BLINK
            }
        }
    }
}

impl<T: TerminalSink> Effect for Terminal<T> {
    fn kind(&self) -> EffectKind {
        EffectKind::Terminal
    }

    fn draw(&mut self, tick: FrameTick) {
        let first_delay = self.script[0].delay();
        let due = *self.next_at.get_or_insert(tick.now + first_delay);
        self.next_at = Some(catch_up(due, tick.now, || self.step()));
    }
}
