#![forbid(unsafe_code)]

//! CRT scanline sweep: one soft band moving down the viewport with a
//! flickering opacity.

use folio_core::capability::CapabilityProfile;
use folio_core::clock::FrameTick;
use folio_core::geometry::Viewport;
use folio_core::rng::XorShift;

use crate::effect::{Effect, Mount, gate};
use crate::resolver::{EffectKind, EffectParams};
use crate::surface::Surface;

pub const BAND_HEIGHT: f64 = 4.0;
/// Sweep speed in px per second.
pub const SWEEP_SPEED: f64 = 120.0;
pub const MIN_ALPHA: f64 = 0.03;
pub const MAX_ALPHA: f64 = 0.08;

#[derive(Debug)]
pub struct Scanlines<S: Surface> {
    surface: S,
    viewport: Viewport,
    rng: XorShift,
    y: f64,
}

impl<S: Surface> Scanlines<S> {
    pub fn mount(
        profile: &CapabilityProfile,
        surface: Option<S>,
        viewport: Viewport,
        rng: XorShift,
    ) -> Mount<Self> {
        let params = EffectParams::resolve(profile, EffectKind::Scanlines);
        match gate(&params, surface, profile.prefers_reduced_motion, |s| {
            s.set_visible(false);
        }) {
            Ok(mut surface) => {
                surface.resize(viewport);
                Mount::Active(Self {
                    surface,
                    viewport,
                    rng,
                    y: 0.0,
                })
            }
            Err(reason) => Mount::Inert(reason),
        }
    }

    #[must_use]
    pub fn band_y(&self) -> f64 {
        self.y
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }
}

impl<S: Surface> Effect for Scanlines<S> {
    fn kind(&self) -> EffectKind {
        EffectKind::Scanlines
    }

    fn draw(&mut self, tick: FrameTick) {
        let span = self.viewport.height + BAND_HEIGHT;
        if span > 0.0 {
            self.y = (self.y + SWEEP_SPEED * tick.delta.as_secs_f64()) % span;
        }
        let alpha = self.rng.range(MIN_ALPHA, MAX_ALPHA);
        self.surface.clear();
        self.surface.band(self.y - BAND_HEIGHT, BAND_HEIGHT, alpha);
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.surface.resize(viewport);
        self.y = 0.0;
    }
}
