#![forbid(unsafe_code)]

//! 3D card tilt.
//!
//! Rotation follows the pointer's offset from the card centre, bounded by
//! [`MAX_TILT_DEG`]. The card eases back flat when the pointer leaves.
//!
//! The card box is re-measured through [`ElementSink::bounds`] on every
//! pointer event, so scrolling and reflow are tracked; sinks that cannot
//! measure keep the rect given at mount.

use folio_core::capability::CapabilityProfile;
use folio_core::clock::FrameTick;
use folio_core::easing::frame_lerp_factor;
use folio_core::geometry::Point;

use crate::effect::{Effect, Mount, PointerEvent, gate};
use crate::resolver::{EffectKind, EffectParams};
use crate::surface::{ElementSink, Transform};

pub const MAX_TILT_DEG: f64 = 10.0;
pub const HOVER_SCALE: f64 = 1.02;
const EASE_RATE: f64 = 0.2;
const SETTLE_EPSILON: f64 = 1e-3;

/// Card bounds in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CardRect {
    pub origin: Point,
    pub width: f64,
    pub height: f64,
}

impl CardRect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            width,
            height,
        }
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.origin.x
            && p.y >= self.origin.y
            && p.x <= self.origin.x + self.width
            && p.y <= self.origin.y + self.height
    }

    /// Offset from centre, each axis in [-1, 1].
    fn normalized(&self, p: Point) -> Point {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        if hw <= 0.0 || hh <= 0.0 {
            return Point::default();
        }
        Point::new(
            ((p.x - self.origin.x - hw) / hw).clamp(-1.0, 1.0),
            ((p.y - self.origin.y - hh) / hh).clamp(-1.0, 1.0),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pose {
    rotate_x: f64,
    rotate_y: f64,
    scale: f64,
}

impl Pose {
    const FLAT: Self = Self {
        rotate_x: 0.0,
        rotate_y: 0.0,
        scale: 1.0,
    };

    fn approach(&mut self, target: Self, k: f64) {
        self.rotate_x += (target.rotate_x - self.rotate_x) * k;
        self.rotate_y += (target.rotate_y - self.rotate_y) * k;
        self.scale += (target.scale - self.scale) * k;
    }

    fn near(&self, other: &Self) -> bool {
        (self.rotate_x - other.rotate_x).abs() < SETTLE_EPSILON
            && (self.rotate_y - other.rotate_y).abs() < SETTLE_EPSILON
            && (self.scale - other.scale).abs() < SETTLE_EPSILON
    }
}

#[derive(Debug)]
pub struct CardTilt<T: ElementSink> {
    sink: T,
    rect: CardRect,
    pose: Pose,
    target: Pose,
}

impl<T: ElementSink> CardTilt<T> {
    pub fn mount(profile: &CapabilityProfile, sink: Option<T>, rect: CardRect) -> Mount<Self> {
        let params = EffectParams::resolve(profile, EffectKind::CardTilt);
        match gate(&params, sink, profile.prefers_reduced_motion, |_| {}) {
            Ok(sink) => Mount::Active(Self {
                sink,
                rect,
                pose: Pose::FLAT,
                target: Pose::FLAT,
            }),
            Err(reason) => Mount::Inert(reason),
        }
    }

    #[must_use]
    pub fn rect(&self) -> CardRect {
        self.rect
    }

    /// Current `(rotate_x, rotate_y, scale)`.
    #[must_use]
    pub fn pose(&self) -> (f64, f64, f64) {
        (self.pose.rotate_x, self.pose.rotate_y, self.pose.scale)
    }

    #[must_use]
    pub fn sink(&self) -> &T {
        &self.sink
    }
}

impl<T: ElementSink> Effect for CardTilt<T> {
    fn kind(&self) -> EffectKind {
        EffectKind::CardTilt
    }

    fn draw(&mut self, tick: FrameTick) {
        if self.pose.near(&self.target) {
            if self.pose != self.target {
                self.pose = self.target;
                self.sink.set_transform(pose_transform(self.pose));
            }
            return;
        }
        let k = frame_lerp_factor(EASE_RATE, tick.delta.as_secs_f64());
        self.pose.approach(self.target, k);
        self.sink.set_transform(pose_transform(self.pose));
    }

    fn pointer(&mut self, event: PointerEvent) {
        if let Some(rect) = self.sink.bounds() {
            self.rect = rect;
        }
        self.target = match event {
            PointerEvent::Move(p) if self.rect.contains(p) => {
                let n = self.rect.normalized(p);
                Pose {
                    // Pointer above centre tips the top edge toward the viewer.
                    rotate_x: -n.y * MAX_TILT_DEG,
                    rotate_y: n.x * MAX_TILT_DEG,
                    scale: HOVER_SCALE,
                }
            }
            PointerEvent::Move(_) | PointerEvent::Leave => Pose::FLAT,
        };
    }
}

fn pose_transform(pose: Pose) -> Transform {
    if pose == Pose::FLAT {
        Transform::Identity
    } else {
        Transform::Tilt {
            rotate_x: pose.rotate_x,
            rotate_y: pose.rotate_y,
            scale: pose.scale,
        }
    }
}
