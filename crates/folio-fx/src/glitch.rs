#![forbid(unsafe_code)]

//! Glitch text.
//!
//! A fixed string that occasionally corrupts for a short burst. Outside of a
//! burst the element holds the original text; when the effect is inert the
//! element is never touched, so the plain text stays as authored.

use std::time::Duration;

use folio_core::capability::CapabilityProfile;
use folio_core::clock::FrameTick;
use folio_core::rng::XorShift;

use crate::effect::{Effect, InertReason, Mount, gate};
use crate::resolver::{EffectKind, EffectParams};
use crate::surface::ElementSink;

/// Default share of characters replaced during a burst.
pub const DEFAULT_INTENSITY: f64 = 0.3;

const BURST_MIN_MS: f64 = 120.0;
const BURST_MAX_MS: f64 = 300.0;
const GAP_MIN_MS: f64 = 2000.0;
const GAP_MAX_MS: f64 = 5000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlitchState {
    /// Showing the original text until `until`.
    Idle { until: Duration },
    /// Corrupting until `until`.
    Burst { until: Duration },
}

/// Glitch driver over an [`ElementSink`].
#[derive(Debug)]
pub struct GlitchText<T: ElementSink> {
    sink: T,
    original: Vec<char>,
    intensity: f64,
    state: Option<GlitchState>,
    rng: XorShift,
    bursts: u64,
}

impl<T: ElementSink> GlitchText<T> {
    pub fn mount(
        profile: &CapabilityProfile,
        sink: Option<T>,
        text: &str,
        rng: XorShift,
    ) -> Mount<Self> {
        let params = EffectParams::resolve(profile, EffectKind::GlitchText);
        Self::with_params(params, profile.prefers_reduced_motion, sink, text, rng)
    }

    pub fn with_params(
        params: EffectParams,
        reduced_motion: bool,
        sink: Option<T>,
        text: &str,
        rng: XorShift,
    ) -> Mount<Self> {
        // Disabled glitch leaves the element alone rather than hiding it.
        let sink = match gate(&params, sink, reduced_motion, |_| {}) {
            Ok(sink) => sink,
            Err(reason) => return Mount::Inert(reason),
        };
        if text.trim().is_empty() {
            return Mount::Inert(InertReason::NoContent);
        }
        Mount::Active(Self {
            sink,
            original: text.chars().collect(),
            intensity: DEFAULT_INTENSITY,
            state: None,
            rng,
            bursts: 0,
        })
    }

    #[must_use]
    pub fn with_intensity(mut self, intensity: f64) -> Self {
        if intensity.is_finite() {
            self.intensity = intensity.clamp(0.0, 1.0);
        }
        self
    }

    #[must_use]
    pub fn state(&self) -> Option<GlitchState> {
        self.state
    }

    #[must_use]
    pub fn bursts(&self) -> u64 {
        self.bursts
    }

    #[must_use]
    pub fn sink(&self) -> &T {
        &self.sink
    }

    #[must_use]
    pub fn original(&self) -> String {
        self.original.iter().collect()
    }

    fn span(&mut self, lo_ms: f64, hi_ms: f64) -> Duration {
        Duration::from_secs_f64(self.rng.range(lo_ms, hi_ms) / 1000.0)
    }

    fn corrupted(&mut self) -> String {
        let intensity = self.intensity;
        let mut out = String::with_capacity(self.original.len());
        for i in 0..self.original.len() {
            let ch = self.original[i];
            if !ch.is_whitespace() && self.rng.chance(intensity) {
                out.push(char::from(33 + self.rng.index(94) as u8));
            } else {
                out.push(ch);
            }
        }
        out
    }

    fn restore(&mut self) {
        let text = self.original();
        self.sink.set_text(&text);
    }
}

impl<T: ElementSink> Effect for GlitchText<T> {
    fn kind(&self) -> EffectKind {
        EffectKind::GlitchText
    }

    fn draw(&mut self, tick: FrameTick) {
        let now = tick.now;
        match self.state {
            None => {
                let gap = self.span(GAP_MIN_MS, GAP_MAX_MS);
                self.state = Some(GlitchState::Idle { until: now + gap });
            }
            Some(GlitchState::Idle { until }) if now >= until => {
                let burst = self.span(BURST_MIN_MS, BURST_MAX_MS);
                self.state = Some(GlitchState::Burst { until: now + burst });
                self.bursts += 1;
                let text = self.corrupted();
                self.sink.set_text(&text);
            }
            Some(GlitchState::Idle { .. }) => {}
            Some(GlitchState::Burst { until }) if now >= until => {
                self.restore();
                let gap = self.span(GAP_MIN_MS, GAP_MAX_MS);
                self.state = Some(GlitchState::Idle { until: now + gap });
            }
            Some(GlitchState::Burst { .. }) => {
                let text = self.corrupted();
                self.sink.set_text(&text);
            }
        }
    }
}
