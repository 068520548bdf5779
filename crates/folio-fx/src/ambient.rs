#![forbid(unsafe_code)]

//! Ambient background particles.
//!
//! Slow drifting dots that wrap around the viewport edges and twinkle. No
//! connections and no pointer interaction, so cost is linear in count.

use std::f64::consts::TAU;

use folio_core::capability::CapabilityProfile;
use folio_core::clock::FrameTick;
use folio_core::geometry::{Point, Viewport};
use folio_core::rng::XorShift;

use crate::effect::{Effect, Mount, gate};
use crate::resolver::{EffectFeatures, EffectKind, EffectParams};
use crate::surface::Surface;

/// Twinkle angular speed, radians per second.
const TWINKLE_RATE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mote {
    pub pos: Point,
    pub vel: Point,
    pub radius: f64,
    pub phase: f64,
}

/// Ambient particle driver.
#[derive(Debug)]
pub struct AmbientParticles<S: Surface> {
    surface: S,
    params: EffectParams,
    viewport: Viewport,
    motes: Vec<Mote>,
    rng: XorShift,
}

impl<S: Surface> AmbientParticles<S> {
    pub fn mount(
        profile: &CapabilityProfile,
        surface: Option<S>,
        viewport: Viewport,
        rng: XorShift,
    ) -> Mount<Self> {
        let params = EffectParams::resolve(profile, EffectKind::AmbientParticles);
        Self::with_params(params, profile.prefers_reduced_motion, surface, viewport, rng)
    }

    pub fn with_params(
        params: EffectParams,
        reduced_motion: bool,
        surface: Option<S>,
        viewport: Viewport,
        rng: XorShift,
    ) -> Mount<Self> {
        match gate(&params, surface, reduced_motion, |s| s.set_visible(false)) {
            Ok(surface) => {
                let mut ambient = Self {
                    surface,
                    params,
                    viewport: Viewport::default(),
                    motes: Vec::new(),
                    rng,
                };
                ambient.resize(viewport);
                Mount::Active(ambient)
            }
            Err(reason) => Mount::Inert(reason),
        }
    }

    #[must_use]
    pub fn motes(&self) -> &[Mote] {
        &self.motes
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn spawn(&mut self) -> Mote {
        let cap = self.params.speed_cap.max(0.05);
        Mote {
            pos: Point::new(
                self.rng.range(0.0, self.viewport.width),
                self.rng.range(0.0, self.viewport.height),
            ),
            vel: Point::new(self.rng.range(-cap, cap) * 0.5, -self.rng.range(0.1, cap)),
            radius: self.rng.range(0.5, 2.0),
            phase: self.rng.range(0.0, TAU),
        }
    }
}

fn wrap(v: f64, max: f64) -> f64 {
    if max <= 0.0 {
        0.0
    } else if v < 0.0 {
        v + max
    } else if v > max {
        v - max
    } else {
        v
    }
}

impl<S: Surface> Effect for AmbientParticles<S> {
    fn kind(&self) -> EffectKind {
        EffectKind::AmbientParticles
    }

    fn draw(&mut self, tick: FrameTick) {
        let (w, h) = (self.viewport.width, self.viewport.height);
        let glow = self.params.features.contains(EffectFeatures::GLOW);
        let t = tick.seconds();
        self.surface.clear();
        for mote in &mut self.motes {
            mote.pos.x = wrap(mote.pos.x + mote.vel.x, w);
            mote.pos.y = wrap(mote.pos.y + mote.vel.y, h);
            let alpha = 0.3 + 0.7 * (0.5 + 0.5 * (t * TWINKLE_RATE + mote.phase).sin());
            self.surface.circle(mote.pos, mote.radius, alpha, glow);
        }
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.surface.resize(viewport);
        let count = viewport.density_count(self.params.density_divisor, self.params.max_items);
        self.motes.clear();
        for _ in 0..count {
            let mote = self.spawn();
            self.motes.push(mote);
        }
    }
}
