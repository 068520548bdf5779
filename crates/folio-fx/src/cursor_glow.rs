#![forbid(unsafe_code)]

//! Cursor-follow glow: an element that eases toward the pointer.

use folio_core::capability::CapabilityProfile;
use folio_core::clock::FrameTick;
use folio_core::easing::frame_lerp_factor;
use folio_core::geometry::Point;

use crate::effect::{Effect, Mount, PointerEvent, gate};
use crate::resolver::{EffectKind, EffectParams};
use crate::surface::{ElementSink, Transform};

/// Fraction of the remaining distance covered per 60 fps frame.
pub const FOLLOW_RATE: f64 = 0.15;

#[derive(Debug)]
pub struct CursorGlow<T: ElementSink> {
    sink: T,
    position: Point,
    target: Option<Point>,
    shown: bool,
}

impl<T: ElementSink> CursorGlow<T> {
    pub fn mount(profile: &CapabilityProfile, sink: Option<T>) -> Mount<Self> {
        let params = EffectParams::resolve(profile, EffectKind::CursorGlow);
        match gate(&params, sink, profile.prefers_reduced_motion, |s| {
            s.set_visible(false);
        }) {
            Ok(mut sink) => {
                sink.set_opacity(0.0);
                Mount::Active(Self {
                    sink,
                    position: Point::default(),
                    target: None,
                    shown: false,
                })
            }
            Err(reason) => Mount::Inert(reason),
        }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    #[must_use]
    pub fn sink(&self) -> &T {
        &self.sink
    }
}

impl<T: ElementSink> Effect for CursorGlow<T> {
    fn kind(&self) -> EffectKind {
        EffectKind::CursorGlow
    }

    fn draw(&mut self, tick: FrameTick) {
        let Some(target) = self.target else {
            return;
        };
        let k = frame_lerp_factor(FOLLOW_RATE, tick.delta.as_secs_f64());
        self.position.x += (target.x - self.position.x) * k;
        self.position.y += (target.y - self.position.y) * k;
        self.sink.set_transform(Transform::Translate(self.position));
    }

    fn pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Move(p) => {
                // Jump on first sight so the glow does not fly in from the corner.
                if self.target.is_none() {
                    self.position = p;
                }
                self.target = Some(p);
                if !self.shown {
                    self.shown = true;
                    self.sink.set_opacity(1.0);
                }
            }
            PointerEvent::Leave => {
                self.shown = false;
                self.sink.set_opacity(0.0);
            }
        }
    }
}
