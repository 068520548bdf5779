#![forbid(unsafe_code)]

//! Decorative node graph.
//!
//! A fixed constellation of nodes, each joined to up to [`NEIGHBOURS`] of its
//! nearest peers within the resolved link distance. Nodes stay put; a pulse
//! of brightness runs along the edge list once per [`PULSE_PERIOD`]. The
//! layout is rebuilt on resize.

use std::f64::consts::TAU;
use std::time::Duration;

use folio_core::capability::CapabilityProfile;
use folio_core::clock::FrameTick;
use folio_core::geometry::{Point, Viewport};
use folio_core::rng::XorShift;

use crate::effect::{Effect, Mount, gate};
use crate::resolver::{EffectFeatures, EffectKind, EffectParams};
use crate::surface::Surface;

pub const NEIGHBOURS: usize = 2;
pub const NODE_RADIUS: f64 = 3.0;
pub const PULSE_PERIOD: Duration = Duration::from_millis(4000);
const NODE_ALPHA: f64 = 0.8;
const EDGE_MIN_ALPHA: f64 = 0.1;
const EDGE_PULSE_ALPHA: f64 = 0.3;
/// Margin kept clear along each viewport edge.
const INSET: f64 = 24.0;

#[derive(Debug)]
pub struct NodeGraph<S: Surface> {
    surface: S,
    params: EffectParams,
    viewport: Viewport,
    rng: XorShift,
    nodes: Vec<Point>,
    edges: Vec<(usize, usize)>,
}

impl<S: Surface> NodeGraph<S> {
    pub fn mount(
        profile: &CapabilityProfile,
        surface: Option<S>,
        viewport: Viewport,
        rng: XorShift,
    ) -> Mount<Self> {
        let params = EffectParams::resolve(profile, EffectKind::Graph);
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
                let mut graph = Self {
                    surface,
                    params,
                    viewport: Viewport::default(),
                    rng,
                    nodes: Vec::new(),
                    edges: Vec::new(),
                };
                graph.resize(viewport);
                Mount::Active(graph)
            }
            Err(reason) => Mount::Inert(reason),
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[Point] {
        &self.nodes
    }

    /// Edges as index pairs, lower index first, each listed once.
    #[must_use]
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn layout(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        if self.viewport.is_empty() {
            return;
        }
        let span = |len: f64| {
            if len > 2.0 * INSET {
                (INSET, len - INSET)
            } else {
                (0.0, len)
            }
        };
        let (x0, x1) = span(self.viewport.width);
        let (y0, y1) = span(self.viewport.height);
        for _ in 0..self.params.max_items {
            let p = Point::new(self.rng.range(x0, x1), self.rng.range(y0, y1));
            self.nodes.push(p);
        }

        let limit = self.params.connection_distance;
        let mut nearest: Vec<(f64, usize)> = Vec::with_capacity(self.nodes.len());
        for (i, a) in self.nodes.iter().enumerate() {
            nearest.clear();
            nearest.extend(
                self.nodes
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(j, b)| (a.distance(*b), j))
                    .filter(|(d, _)| *d <= limit),
            );
            nearest.sort_by(|l, r| l.0.total_cmp(&r.0));
            for &(_, j) in nearest.iter().take(NEIGHBOURS) {
                self.edges.push((i.min(j), i.max(j)));
            }
        }
        self.edges.sort_unstable();
        self.edges.dedup();
    }
}

impl<S: Surface> Effect for NodeGraph<S> {
    fn kind(&self) -> EffectKind {
        EffectKind::Graph
    }

    fn draw(&mut self, tick: FrameTick) {
        self.surface.clear();
        let phase = (tick.now.as_secs_f64() / PULSE_PERIOD.as_secs_f64()).fract();
        let count = self.edges.len().max(1) as f64;
        for (k, &(a, b)) in self.edges.iter().enumerate() {
            let wave = 0.5 + 0.5 * (TAU * (phase + k as f64 / count)).sin();
            let alpha = EDGE_MIN_ALPHA + EDGE_PULSE_ALPHA * wave;
            self.surface.line(self.nodes[a], self.nodes[b], alpha, 1.0);
        }
        let glow = self.params.features.contains(EffectFeatures::SHADOWS);
        for &p in &self.nodes {
            self.surface.circle(p, NODE_RADIUS, NODE_ALPHA, glow);
        }
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.surface.resize(viewport);
        self.layout();
    }
}
