#![forbid(unsafe_code)]

//! Scroll reveal: an element starts transparent and lowered by [`RISE_PX`],
//! then fades and slides into place once it is reported in view.

use std::time::Duration;

use folio_core::capability::CapabilityProfile;
use folio_core::clock::FrameTick;
use folio_core::easing::ease_out_cubic;
use folio_core::geometry::Point;

use crate::effect::{Effect, InertReason, Mount, Timeline, gate};
use crate::resolver::{EffectKind, EffectParams, RenderMode};
use crate::surface::{ElementSink, Transform};

pub const RISE_PX: f64 = 30.0;
pub const REVEAL_DURATION: Duration = Duration::from_millis(600);

#[derive(Debug)]
pub struct Reveal<T: ElementSink> {
    sink: T,
    timeline: Timeline,
}

impl<T: ElementSink> Reveal<T> {
    pub fn mount(profile: &CapabilityProfile, sink: Option<T>) -> Mount<Self> {
        let params = EffectParams::resolve(profile, EffectKind::Reveal);
        let mut sink = match gate(&params, sink, profile.prefers_reduced_motion, |_| {}) {
            Ok(sink) => sink,
            Err(reason) => return Mount::Inert(reason),
        };
        if params.mode == RenderMode::Static {
            sink.set_opacity(1.0);
            sink.set_transform(Transform::Identity);
            return Mount::Inert(InertReason::StaticOnly);
        }
        sink.set_opacity(0.0);
        sink.set_transform(Transform::Translate(Point::new(0.0, RISE_PX)));
        Mount::Active(Self {
            sink,
            timeline: Timeline::default(),
        })
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.timeline.is_armed()
    }

    #[must_use]
    pub fn sink(&self) -> &T {
        &self.sink
    }
}

impl<T: ElementSink> Effect for Reveal<T> {
    fn kind(&self) -> EffectKind {
        EffectKind::Reveal
    }

    fn draw(&mut self, tick: FrameTick) {
        if self.timeline.is_done() {
            return;
        }
        let Some(t) = self.timeline.progress(tick.now, REVEAL_DURATION) else {
            return;
        };
        let eased = ease_out_cubic(t);
        self.sink.set_opacity(eased);
        self.sink.set_transform(if self.timeline.is_done() {
            Transform::Identity
        } else {
            Transform::Translate(Point::new(0.0, RISE_PX * (1.0 - eased)))
        });
    }

    fn reveal(&mut self) {
        self.timeline.arm();
    }

    fn is_finished(&self) -> bool {
        self.timeline.is_done()
    }
}
