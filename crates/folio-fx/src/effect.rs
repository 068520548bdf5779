#![forbid(unsafe_code)]

//! The common driver contract.

use std::fmt;
use std::time::Duration;

use folio_core::clock::FrameTick;
use folio_core::geometry::{Point, Viewport};

use crate::resolver::{EffectKind, EffectParams, RenderMode};

/// Pointer input routed to interactive effects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Mouse move or touch move, in viewport coordinates.
    Move(Point),
    /// Pointer left the page or the touch ended.
    Leave,
}

/// A visual effect driven by the scheduler.
pub trait Effect {
    fn kind(&self) -> EffectKind;

    /// One frame. Must return promptly; all drivers share one thread.
    fn draw(&mut self, tick: FrameTick);

    /// Viewport changed. Geometry-based state is rebuilt, the tier is not.
    fn resize(&mut self, _viewport: Viewport) {}

    fn pointer(&mut self, _event: PointerEvent) {}

    /// The effect's element scrolled into view.
    fn reveal(&mut self) {}

    /// Whether the effect has nothing left to animate.
    fn is_finished(&self) -> bool {
        false
    }
}

/// Why an effect did not activate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InertReason {
    /// The host element the effect draws into is absent.
    MissingAnchor,
    /// The device tier does not run this effect.
    LowTier,
    /// The user asked for reduced motion.
    ReducedMotion,
    /// Nothing to show (empty text, no phrases, empty script).
    NoContent,
    /// Content rendered once in its final state; nothing to animate.
    StaticOnly,
}

impl fmt::Display for InertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingAnchor => "missing anchor",
            Self::LowTier => "low tier",
            Self::ReducedMotion => "reduced motion",
            Self::NoContent => "no content",
            Self::StaticOnly => "static only",
        })
    }
}

/// Outcome of mounting a driver.
#[derive(Debug)]
pub enum Mount<E> {
    Active(E),
    Inert(InertReason),
}

impl<E> Mount<E> {
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    #[must_use]
    pub fn active(self) -> Option<E> {
        match self {
            Self::Active(e) => Some(e),
            Self::Inert(_) => None,
        }
    }

    #[must_use]
    pub fn inert_reason(&self) -> Option<InertReason> {
        match self {
            Self::Active(_) => None,
            Self::Inert(reason) => Some(*reason),
        }
    }

    pub fn map<F, U>(self, f: F) -> Mount<U>
    where
        F: FnOnce(E) -> U,
    {
        match self {
            Self::Active(e) => Mount::Active(f(e)),
            Self::Inert(reason) => Mount::Inert(reason),
        }
    }
}

/// Start/elapsed bookkeeping for one-shot animations that wait until their
/// element is revealed.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Timeline {
    armed: bool,
    start: Option<Duration>,
    done: bool,
}

impl Timeline {
    pub(crate) fn arm(&mut self) {
        self.armed = true;
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.armed
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done
    }

    /// Progress in [0, 1] at `now`, or `None` until armed. The first armed
    /// frame is time zero.
    pub(crate) fn progress(&mut self, now: Duration, duration: Duration) -> Option<f64> {
        if !self.armed {
            return None;
        }
        let start = *self.start.get_or_insert(now);
        if duration.is_zero() {
            self.done = true;
            return Some(1.0);
        }
        let t = (now.saturating_sub(start).as_secs_f64() / duration.as_secs_f64()).min(1.0);
        if t >= 1.0 {
            self.done = true;
        }
        Some(t)
    }
}

/// Most script steps replayed in one frame after a stall.
pub const MAX_CATCH_UP_STEPS: usize = 8;

const MIN_STEP: Duration = Duration::from_millis(1);

/// Replay steps that fell due by `now`, returning the next due time.
///
/// `step` advances the script and returns the delay until the following
/// step. At most [`MAX_CATCH_UP_STEPS`] run per call; any older backlog is
/// dropped and the schedule restarts from `now`.
pub(crate) fn catch_up(mut due: Duration, now: Duration, mut step: impl FnMut() -> Duration) -> Duration {
    let mut steps = 0;
    while due <= now {
        if steps == MAX_CATCH_UP_STEPS {
            return now + MIN_STEP;
        }
        due += step().max(MIN_STEP);
        steps += 1;
    }
    due
}

/// Decide whether a driver for `params` may activate.
///
/// Missing sinks are silent. Disabled effects get their sink hidden through
/// `hide`. `reduced_motion` picks the reported reason.
pub(crate) fn gate<S>(
    params: &EffectParams,
    sink: Option<S>,
    reduced_motion: bool,
    hide: impl FnOnce(&mut S),
) -> Result<S, InertReason> {
    let Some(mut sink) = sink else {
        tracing::debug!(effect = params.kind.as_str(), "anchor missing; effect inert");
        return Err(InertReason::MissingAnchor);
    };
    if params.mode == RenderMode::Off {
        hide(&mut sink);
        let reason = if reduced_motion {
            InertReason::ReducedMotion
        } else {
            InertReason::LowTier
        };
        tracing::debug!(effect = params.kind.as_str(), %reason, "effect disabled");
        return Err(reason);
    }
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{RecordingSurface, Surface};
    use folio_core::capability::CapabilityProfile;

    #[test]
    fn gate_hides_disabled_surfaces() {
        let params = EffectParams::resolve(&CapabilityProfile::low_end_phone(), EffectKind::MatrixRain);
        let mut hidden = false;
        let result = gate(&params, Some(RecordingSurface::new()), false, |s| {
            s.set_visible(false);
            hidden = !s.is_visible();
        });
        assert_eq!(result.err(), Some(InertReason::LowTier));
        assert!(hidden);
    }

    #[test]
    fn gate_missing_anchor_is_silent() {
        let params = EffectParams::resolve(&CapabilityProfile::workstation(), EffectKind::MatrixRain);
        let result = gate::<RecordingSurface>(&params, None, false, |_| {});
        assert_eq!(result.err(), Some(InertReason::MissingAnchor));
    }

    #[test]
    fn mount_helpers() {
        let m: Mount<u8> = Mount::Active(3);
        assert!(m.is_active());
        assert_eq!(m.map(|v| v * 2).active(), Some(6));
        let inert: Mount<u8> = Mount::Inert(InertReason::NoContent);
        assert_eq!(inert.inert_reason(), Some(InertReason::NoContent));
    }

    #[test]
    fn timeline_waits_until_armed() {
        let mut timeline = Timeline::default();
        let second = Duration::from_secs(1);
        assert_eq!(timeline.progress(Duration::ZERO, second), None);
        timeline.arm();
        assert_eq!(timeline.progress(Duration::from_secs(5), second), Some(0.0));
        assert_eq!(timeline.progress(Duration::from_millis(5_500), second), Some(0.5));
        assert!(!timeline.is_done());
        assert_eq!(timeline.progress(Duration::from_secs(9), second), Some(1.0));
        assert!(timeline.is_done());
    }

    #[test]
    fn catch_up_replays_due_steps() {
        let mut calls = 0;
        let next = catch_up(Duration::ZERO, Duration::from_millis(250), || {
            calls += 1;
            Duration::from_millis(100)
        });
        assert_eq!(calls, 3);
        assert_eq!(next, Duration::from_millis(300));
    }

    #[test]
    fn catch_up_is_bounded_after_long_stall() {
        let mut calls = 0;
        let now = Duration::from_secs(24 * 3600);
        let next = catch_up(Duration::ZERO, now, || {
            calls += 1;
            Duration::ZERO
        });
        assert_eq!(calls, MAX_CATCH_UP_STEPS);
        assert!(next > now);
    }
}
