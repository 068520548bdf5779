#![forbid(unsafe_code)]

//! Matrix digital rain.
//!
//! One drop per glyph column. Each frame the canvas is faded slightly
//! (leaving trails), every column paints a random glyph at its drop row, and
//! the drop moves down one row. Once a drop is below the viewport it restarts
//! at the top with probability [`RESET_CHANCE`] per frame, which staggers the
//! columns naturally.

use folio_core::capability::CapabilityProfile;
use folio_core::clock::FrameTick;
use folio_core::geometry::{Point, Viewport};
use folio_core::rng::XorShift;

use crate::effect::{Effect, Mount, gate};
use crate::resolver::{EffectKind, EffectParams};
use crate::surface::Surface;

/// Per-frame probability that an off-screen drop restarts at the top.
pub const RESET_CHANCE: f64 = 0.025;

/// Trail fade alpha applied before each frame.
const TRAIL_FADE: f64 = 0.05;

/// Half-width katakana, digits and Latin capitals.
pub const MATRIX_GLYPHS: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'ｱ', 'ｲ', 'ｳ', 'ｴ', 'ｵ', 'ｶ', 'ｷ', 'ｸ',
    'ｹ', 'ｺ', 'ｻ', 'ｼ', 'ｽ', 'ｾ', 'ｿ', 'ﾀ', 'ﾁ', 'ﾂ', 'ﾃ', 'ﾄ', 'ﾅ', 'ﾆ', 'ﾇ', 'ﾈ', 'ﾉ', 'ﾊ',
    'ﾋ', 'ﾌ', 'ﾍ', 'ﾎ', 'ﾏ', 'ﾐ', 'ﾑ', 'ﾒ', 'ﾓ', 'ﾔ', 'ﾕ', 'ﾖ', 'ﾗ', 'ﾘ', 'ﾙ', 'ﾚ', 'ﾛ', 'ﾜ',
    'ﾝ', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q',
    'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Matrix rain driver over a [`Surface`].
#[derive(Debug)]
pub struct MatrixRain<S: Surface> {
    surface: S,
    params: EffectParams,
    viewport: Viewport,
    /// Drop row per column; may be negative while waiting above the top.
    drops: Vec<f64>,
    rng: XorShift,
    resets: u64,
}

impl<S: Surface> MatrixRain<S> {
    pub fn mount(
        profile: &CapabilityProfile,
        surface: Option<S>,
        viewport: Viewport,
        rng: XorShift,
    ) -> Mount<Self> {
        let params = EffectParams::resolve(profile, EffectKind::MatrixRain);
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
                let mut rain = Self {
                    surface,
                    params,
                    viewport: Viewport::default(),
                    drops: Vec::new(),
                    rng,
                    resets: 0,
                };
                rain.resize(viewport);
                Mount::Active(rain)
            }
            Err(reason) => Mount::Inert(reason),
        }
    }

    fn cell(&self) -> f64 {
        if self.params.cell_size > 0.0 {
            self.params.cell_size
        } else {
            16.0
        }
    }

    /// Column count for the current viewport.
    #[must_use]
    pub fn column_count(&self) -> usize {
        if self.viewport.is_empty() {
            return 0;
        }
        let columns = (self.viewport.width / self.cell()).floor() as usize;
        columns.min(self.params.max_items)
    }

    fn rows(&self) -> f64 {
        self.viewport.height / self.cell()
    }

    #[must_use]
    pub fn drops(&self) -> &[f64] {
        &self.drops
    }

    /// Drops restarted so far.
    #[must_use]
    pub fn resets(&self) -> u64 {
        self.resets
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn glyph(&mut self) -> char {
        MATRIX_GLYPHS[self.rng.index(MATRIX_GLYPHS.len())]
    }

    fn advance(&mut self) {
        let cell = self.cell();
        let height = self.viewport.height;
        for i in 0..self.drops.len() {
            let row = self.drops[i];
            if row >= 0.0 {
                let ch = self.glyph();
                let at = Point::new(i as f64 * cell, row * cell);
                self.surface.glyph(at, ch, cell, 1.0);
            }
            if row * cell > height && self.rng.chance(RESET_CHANCE) {
                self.drops[i] = 0.0;
                self.resets += 1;
            } else {
                self.drops[i] = row + 1.0;
            }
        }
    }
}

impl<S: Surface> Effect for MatrixRain<S> {
    fn kind(&self) -> EffectKind {
        EffectKind::MatrixRain
    }

    fn draw(&mut self, _tick: FrameTick) {
        self.surface.fade(TRAIL_FADE);
        self.advance();
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.surface.resize(viewport);
        let columns = self.column_count();
        let rows = self.rows();
        self.drops.clear();
        for _ in 0..columns {
            let start = -self.rng.range(0.0, rows.max(1.0)).floor();
            self.drops.push(start);
        }
        tracing::debug!(columns, width = viewport.width, "matrix rain columns rebuilt");
    }
}
