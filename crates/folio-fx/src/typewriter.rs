#![forbid(unsafe_code)]

//! Typewriter headline.
//!
//! Cycles through a list of phrases: types one character per
//! [`TypewriterTiming::type_interval`], holds the full phrase, deletes
//! faster than it typed, pauses, then moves on to the next phrase.
//!
//! Under reduced motion the first phrase is written once in full and nothing
//! is scheduled.

use std::time::Duration;

use folio_core::capability::CapabilityProfile;
use folio_core::clock::FrameTick;

use crate::effect::{Effect, InertReason, Mount, catch_up, gate};
use crate::resolver::{EffectKind, EffectParams, RenderMode};
use crate::surface::ElementSink;

/// Floor on a step delay so a zero timing cannot spin the catch-up loop.
/// Per-stage timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypewriterTiming {
    pub type_interval: Duration,
    pub hold: Duration,
    pub delete_interval: Duration,
    pub pause: Duration,
}

impl Default for TypewriterTiming {
    fn default() -> Self {
        Self {
            type_interval: Duration::from_millis(100),
            hold: Duration::from_millis(2000),
            delete_interval: Duration::from_millis(50),
            pause: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Typing,
    Holding,
    Deleting,
    Pausing,
}

#[derive(Debug)]
pub struct Typewriter<T: ElementSink> {
    sink: T,
    phrases: Vec<Vec<char>>,
    timing: TypewriterTiming,
    phrase: usize,
    visible: usize,
    stage: Stage,
    /// When the current step is due; `None` until the first draw.
    next_at: Option<Duration>,
    cycles: u64,
}

impl<T: ElementSink> Typewriter<T> {
    pub fn mount<P: AsRef<str>>(
        profile: &CapabilityProfile,
        sink: Option<T>,
        phrases: &[P],
    ) -> Mount<Self> {
        let params = EffectParams::resolve(profile, EffectKind::Typewriter);
        Self::with_params(params, profile.prefers_reduced_motion, sink, phrases)
    }

    pub fn with_params<P: AsRef<str>>(
        params: EffectParams,
        reduced_motion: bool,
        sink: Option<T>,
        phrases: &[P],
    ) -> Mount<Self> {
        let mut sink = match gate(&params, sink, reduced_motion, |s| s.set_visible(false)) {
            Ok(sink) => sink,
            Err(reason) => return Mount::Inert(reason),
        };
        let phrases: Vec<Vec<char>> = phrases
            .iter()
            .map(|p| p.as_ref().chars().collect::<Vec<_>>())
            .filter(|p| !p.is_empty())
            .collect();
        let Some(first) = phrases.first() else {
            return Mount::Inert(InertReason::NoContent);
        };
        if params.mode == RenderMode::Static {
            let text: String = first.iter().collect();
            sink.set_text(&text);
            return Mount::Inert(InertReason::StaticOnly);
        }
        Mount::Active(Self {
            sink,
            phrases,
            timing: TypewriterTiming::default(),
            phrase: 0,
            visible: 0,
            stage: Stage::Typing,
            next_at: None,
            cycles: 0,
        })
    }

    #[must_use]
    pub fn with_timing(mut self, timing: TypewriterTiming) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn phrase_index(&self) -> usize {
        self.phrase
    }

    /// Characters of the current phrase on screen.
    #[must_use]
    pub fn visible_chars(&self) -> usize {
        self.visible
    }

    /// Completed phrase cycles.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    #[must_use]
    pub fn sink(&self) -> &T {
        &self.sink
    }

    fn current_len(&self) -> usize {
        self.phrases[self.phrase].len()
    }

    fn render(&mut self) {
        let text: String = self.phrases[self.phrase][..self.visible].iter().collect();
        self.sink.set_text(&text);
    }

    /// Apply one step and return the delay until the next one.
    fn step(&mut self) -> Duration {
        match self.stage {
            Stage::Typing => {
                self.visible += 1;
                self.render();
                if self.visible >= self.current_len() {
                    self.stage = Stage::Holding;
                    self.timing.hold
                } else {
                    self.timing.type_interval
                }
            }
            Stage::Holding => {
                self.stage = Stage::Deleting;
                self.timing.delete_interval
            }
            Stage::Deleting => {
                self.visible = self.visible.saturating_sub(1);
                self.render();
                if self.visible == 0 {
                    self.stage = Stage::Pausing;
                    self.timing.pause
                } else {
                    self.timing.delete_interval
                }
            }
            Stage::Pausing => {
                self.phrase = (self.phrase + 1) % self.phrases.len();
                if self.phrase == 0 {
                    self.cycles += 1;
                }
                self.stage = Stage::Typing;
                self.timing.type_interval
            }
        }
    }
}

impl<T: ElementSink> Effect for Typewriter<T> {
    fn kind(&self) -> EffectKind {
        EffectKind::Typewriter
    }

    fn draw(&mut self, tick: FrameTick) {
        let due = *self.next_at.get_or_insert(tick.now);
        self.next_at = Some(catch_up(due, tick.now, || self.step()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::MAX_CATCH_UP_STEPS;
    use crate::surface::RecordingElement;
    use folio_core::capability::CapabilityProfileBuilder;

    fn at(ms: u64) -> FrameTick {
        FrameTick::new(Duration::from_millis(ms), Duration::ZERO, 0)
    }

    fn writer(phrases: &[&str]) -> Typewriter<RecordingElement> {
        Typewriter::mount(
            &CapabilityProfile::workstation(),
            Some(RecordingElement::default()),
            phrases,
        )
        .active()
        .expect("phrases present")
    }

    #[test]
    fn types_holds_deletes_and_advances() {
        let mut tw = writer(&["abc", "de"]);
        tw.draw(at(0));
        assert_eq!(tw.sink().text, "a");
        tw.draw(at(200));
        assert_eq!(tw.sink().text, "abc");
        assert_eq!(tw.stage(), Stage::Holding);

        // Hold 2000 ms from t=200, then deletion steps every 50 ms.
        tw.draw(at(2_199));
        assert_eq!(tw.stage(), Stage::Holding);
        tw.draw(at(2_200));
        assert_eq!(tw.stage(), Stage::Deleting);
        tw.draw(at(2_350));
        assert_eq!(tw.sink().text, "");
        assert_eq!(tw.stage(), Stage::Pausing);

        // 500 ms pause, then the next phrase starts typing.
        tw.draw(at(2_850));
        assert_eq!(tw.phrase_index(), 1);
        tw.draw(at(2_950));
        assert_eq!(tw.sink().text, "d");
    }

    #[test]
    fn long_stall_replays_a_bounded_number_of_steps() {
        let mut tw = writer(&["abc", "de"]);
        tw.draw(at(0));
        let before = tw.sink().text_writes;
        tw.draw(at(3_600_000));
        assert!(tw.sink().text_writes - before <= MAX_CATCH_UP_STEPS);

        // The schedule resumes from the late frame.
        let resumed = tw.sink().text_writes;
        for ms in (3_600_016..3_603_000).step_by(16) {
            tw.draw(at(ms));
        }
        assert!(tw.sink().text_writes > resumed);
    }

    #[test]
    fn wraps_to_first_phrase() {
        let mut tw = writer(&["x"]);
        for ms in (0..6_000).step_by(16) {
            tw.draw(at(ms));
        }
        assert!(tw.cycles() >= 1);
        assert_eq!(tw.phrase_index(), 0);
    }

    #[test]
    fn reduced_motion_shows_first_phrase() {
        let profile = CapabilityProfileBuilder::new().reduced_motion(true).build();
        let mut element = RecordingElement::default();
        let reason = Typewriter::with_params(
            EffectParams::resolve(&profile, EffectKind::Typewriter),
            true,
            Some(&mut element),
            &["Systems engineer", "Rustacean"],
        )
        .inert_reason();
        assert_eq!(reason, Some(InertReason::StaticOnly));
        assert_eq!(element.text, "Systems engineer");
    }

    #[test]
    fn empty_phrase_list_is_no_content() {
        let empty: [&str; 2] = ["", ""];
        let mount = Typewriter::mount(
            &CapabilityProfile::workstation(),
            Some(RecordingElement::default()),
            &empty,
        );
        assert_eq!(mount.inert_reason(), Some(InertReason::NoContent));
    }
}
