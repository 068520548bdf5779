#![forbid(unsafe_code)]

//! Stat counters and skill bars.
//!
//! [`CountUp`] eases a number from zero to its target; [`SkillBar`] fills a bar
//! to a percentage. Both hold at zero until [`Effect::reveal`] reports their
//! element in view, then finish on their own. Under reduced motion both jump
//! straight to the final value.

use std::time::Duration;

use folio_core::capability::CapabilityProfile;
use folio_core::clock::FrameTick;
use folio_core::easing::ease_out_cubic;

use crate::effect::{Effect, InertReason, Mount, Timeline, gate};
use crate::resolver::{EffectKind, EffectParams, RenderMode};
use crate::surface::ElementSink;

pub const DEFAULT_DURATION: Duration = Duration::from_millis(2000);

/// Target value and formatting for a counter.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterSpec {
    pub target: f64,
    pub decimals: usize,
    pub suffix: String,
    pub duration: Duration,
}

impl CounterSpec {
    #[must_use]
    pub fn new(target: f64) -> Self {
        Self {
            target,
            decimals: 0,
            suffix: String::new(),
            duration: DEFAULT_DURATION,
        }
    }

    #[must_use]
    pub fn decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }

    #[must_use]
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn format(&self, value: f64) -> String {
        format!("{value:.prec$}{}", self.suffix, prec = self.decimals)
    }
}

/// Count-up number.
#[derive(Debug)]
pub struct CountUp<T: ElementSink> {
    sink: T,
    spec: CounterSpec,
    timeline: Timeline,
    value: f64,
}

impl<T: ElementSink> CountUp<T> {
    pub fn mount(profile: &CapabilityProfile, sink: Option<T>, spec: CounterSpec) -> Mount<Self> {
        let params = EffectParams::resolve(profile, EffectKind::Counter);
        let mut sink = match gate(&params, sink, profile.prefers_reduced_motion, |_| {}) {
            Ok(sink) => sink,
            Err(reason) => return Mount::Inert(reason),
        };
        if !spec.target.is_finite() {
            return Mount::Inert(InertReason::NoContent);
        }
        if params.mode == RenderMode::Static {
            sink.set_text(&spec.format(spec.target));
            return Mount::Inert(InertReason::StaticOnly);
        }
        sink.set_text(&spec.format(0.0));
        Mount::Active(Self {
            sink,
            spec,
            timeline: Timeline::default(),
            value: 0.0,
        })
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub fn sink(&self) -> &T {
        &self.sink
    }
}

impl<T: ElementSink> Effect for CountUp<T> {
    fn kind(&self) -> EffectKind {
        EffectKind::Counter
    }

    fn draw(&mut self, tick: FrameTick) {
        if self.timeline.is_done() {
            return;
        }
        let Some(t) = self.timeline.progress(tick.now, self.spec.duration) else {
            return;
        };
        self.value = if self.timeline.is_done() {
            self.spec.target
        } else {
            self.spec.target * ease_out_cubic(t)
        };
        self.sink.set_text(&self.spec.format(self.value));
    }

    fn reveal(&mut self) {
        self.timeline.arm();
    }

    fn is_finished(&self) -> bool {
        self.timeline.is_done()
    }
}

/// Skill bar filling to `percent`.
#[derive(Debug)]
pub struct SkillBar<T: ElementSink> {
    sink: T,
    fraction: f64,
    duration: Duration,
    timeline: Timeline,
}

impl<T: ElementSink> SkillBar<T> {
    pub fn mount(profile: &CapabilityProfile, sink: Option<T>, percent: f64) -> Mount<Self> {
        let params = EffectParams::resolve(profile, EffectKind::Counter);
        let mut sink = match gate(&params, sink, profile.prefers_reduced_motion, |_| {}) {
            Ok(sink) => sink,
            Err(reason) => return Mount::Inert(reason),
        };
        let fraction = if percent.is_finite() {
            (percent / 100.0).clamp(0.0, 1.0)
        } else {
            0.0
        };
        if params.mode == RenderMode::Static {
            sink.set_progress(fraction);
            return Mount::Inert(InertReason::StaticOnly);
        }
        sink.set_progress(0.0);
        Mount::Active(Self {
            sink,
            fraction,
            duration: Duration::from_millis(1500),
            timeline: Timeline::default(),
        })
    }

    #[must_use]
    pub fn sink(&self) -> &T {
        &self.sink
    }
}

impl<T: ElementSink> Effect for SkillBar<T> {
    fn kind(&self) -> EffectKind {
        EffectKind::Counter
    }

    fn draw(&mut self, tick: FrameTick) {
        if self.timeline.is_done() {
            return;
        }
        if let Some(t) = self.timeline.progress(tick.now, self.duration) {
            self.sink.set_progress(self.fraction * ease_out_cubic(t));
        }
    }

    fn reveal(&mut self) {
        self.timeline.arm();
    }

    fn is_finished(&self) -> bool {
        self.timeline.is_done()
    }
}
