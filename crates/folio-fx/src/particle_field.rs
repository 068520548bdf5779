#![forbid(unsafe_code)]

//! Neural-network particle field.
//!
//! Nodes drift across the viewport, bounce off its edges, get pushed away
//! from the pointer, and are joined by lines when close to each other.
//!
//! # Per-frame update
//!
//! For every node, in order:
//! 1. pointer repulsion: inside the influence radius `R`, add an impulse of
//!    `(R - d) / R * REPULSION_STRENGTH` pointing away from the pointer;
//! 2. damping back toward cruising speed after a push;
//! 3. speed clamp to `speed_cap`;
//! 4. advance position by velocity;
//! 5. reflect the velocity component at each crossed edge and clamp the
//!    position into bounds.
//!
//! Reflection preserves speed, so the cap from step 3 holds after every
//! frame no matter how many impulses accumulate.
//!
//! # Connections
//!
//! Every unordered pair closer than `connection_distance` gets a line whose
//! opacity falls off linearly with distance. This is O(n²) per frame, which
//! is why the resolver caps node counts per tier.

use folio_core::capability::CapabilityProfile;
use folio_core::clock::FrameTick;
use folio_core::geometry::{Point, Viewport};
use folio_core::rng::XorShift;

use crate::effect::{Effect, Mount, PointerEvent, gate};
use crate::resolver::{EffectFeatures, EffectKind, EffectParams};
use crate::surface::Surface;

/// Scale of the pointer impulse at zero distance.
pub const REPULSION_STRENGTH: f64 = 0.6;
/// Initial per-axis velocity bound.
const INITIAL_SPEED: f64 = 0.5;
/// Fastest speed a node can start with.
const CRUISE_SPEED: f64 = INITIAL_SPEED * std::f64::consts::SQRT_2;
/// Velocity multiplier applied while a node is faster than cruising speed.
const DAMPING: f64 = 0.98;
const LINK_MAX_ALPHA: f64 = 0.35;
const POINTER_LINK_MAX_ALPHA: f64 = 0.5;
const LINK_WIDTH: f64 = 0.8;

/// One node of the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub pos: Point,
    pub vel: Point,
    pub radius: f64,
}

impl Node {
    #[must_use]
    pub fn new(pos: Point, vel: Point, radius: f64) -> Self {
        Self { pos, vel, radius }
    }

    #[inline]
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.vel.length()
    }
}

/// Draw statistics for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldFrame {
    pub nodes: usize,
    pub links: usize,
    pub pointer_links: usize,
}

/// Particle field driver over a [`Surface`].
#[derive(Debug)]
pub struct ParticleField<S: Surface> {
    surface: S,
    params: EffectParams,
    viewport: Viewport,
    nodes: Vec<Node>,
    pointer: Point,
    rng: XorShift,
    last_frame: FieldFrame,
}

impl<S: Surface> ParticleField<S> {
    /// Mount for `profile`. `surface` is `None` when the canvas is absent.
    pub fn mount(
        profile: &CapabilityProfile,
        surface: Option<S>,
        viewport: Viewport,
        rng: XorShift,
    ) -> Mount<Self> {
        let params = EffectParams::resolve(profile, EffectKind::ParticleField);
        Self::with_params(params, profile.prefers_reduced_motion, surface, viewport, rng)
    }

    /// Mount with explicitly resolved parameters.
    pub fn with_params(
        params: EffectParams,
        reduced_motion: bool,
        surface: Option<S>,
        viewport: Viewport,
        rng: XorShift,
    ) -> Mount<Self> {
        match gate(&params, surface, reduced_motion, |s| s.set_visible(false)) {
            Ok(surface) => {
                let mut field = Self {
                    surface,
                    params,
                    viewport: Viewport::default(),
                    nodes: Vec::new(),
                    pointer: Point::FAR_AWAY,
                    rng,
                    last_frame: FieldFrame::default(),
                };
                field.resize(viewport);
                Mount::Active(field)
            }
            Err(reason) => Mount::Inert(reason),
        }
    }

    /// Field with caller-provided nodes; no randomness involved.
    pub fn from_nodes(params: EffectParams, surface: S, viewport: Viewport, nodes: Vec<Node>) -> Self {
        let mut surface = surface;
        surface.resize(viewport);
        Self {
            surface,
            params,
            viewport,
            nodes,
            pointer: Point::FAR_AWAY,
            rng: XorShift::default(),
            last_frame: FieldFrame::default(),
        }
    }

    /// Node count for the current viewport.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.viewport
            .density_count(self.params.density_divisor, self.params.max_items)
    }

    fn regenerate(&mut self) {
        let count = self.target_count();
        let (w, h) = (self.viewport.width, self.viewport.height);
        self.nodes.clear();
        self.nodes.reserve(count);
        for _ in 0..count {
            let pos = Point::new(self.rng.range(0.0, w), self.rng.range(0.0, h));
            let vel = Point::new(
                self.rng.range(-INITIAL_SPEED, INITIAL_SPEED),
                self.rng.range(-INITIAL_SPEED, INITIAL_SPEED),
            );
            let radius = self.rng.range(1.0, 2.5);
            self.nodes.push(Node::new(pos, vel, radius));
        }
        tracing::debug!(
            nodes = count,
            width = w,
            height = h,
            "particle field regenerated"
        );
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn params(&self) -> &EffectParams {
        &self.params
    }

    #[must_use]
    pub fn pointer_position(&self) -> Point {
        self.pointer
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[must_use]
    pub fn last_frame(&self) -> FieldFrame {
        self.last_frame
    }

    fn pointer_active(&self) -> bool {
        self.params
            .features
            .intersects(EffectFeatures::POINTER_REPULSION | EffectFeatures::POINTER_LINES)
    }

    /// Advance physics by one frame without drawing.
    pub fn step(&mut self) {
        let repel = self
            .params
            .features
            .contains(EffectFeatures::POINTER_REPULSION);
        let radius = self.params.influence_radius;
        let cap = self.params.speed_cap;
        let pointer = self.pointer;
        let (w, h) = (self.viewport.width, self.viewport.height);

        for node in &mut self.nodes {
            if repel && radius > 0.0 {
                let dx = node.pos.x - pointer.x;
                let dy = node.pos.y - pointer.y;
                let d = dx.hypot(dy);
                if d < radius && d > 0.0 {
                    let force = (radius - d) / radius * REPULSION_STRENGTH;
                    node.vel.x += dx / d * force;
                    node.vel.y += dy / d * force;
                }
            }

            let speed = node.speed();
            if speed > CRUISE_SPEED {
                node.vel.x *= DAMPING;
                node.vel.y *= DAMPING;
            }

            let speed = node.speed();
            if cap > 0.0 && speed > cap {
                let k = cap / speed;
                node.vel.x *= k;
                node.vel.y *= k;
            }

            node.pos.x += node.vel.x;
            node.pos.y += node.vel.y;

            if node.pos.x < 0.0 {
                node.vel.x = node.vel.x.abs();
            } else if node.pos.x > w {
                node.vel.x = -node.vel.x.abs();
            }
            if node.pos.y < 0.0 {
                node.vel.y = node.vel.y.abs();
            } else if node.pos.y > h {
                node.vel.y = -node.vel.y.abs();
            }
            node.pos = self.viewport.clamp(node.pos);
        }
    }

    /// Draw the current state.
    pub fn render(&mut self) -> FieldFrame {
        let threshold = self.params.connection_distance;
        let glow = self.params.features.contains(EffectFeatures::SHADOWS);
        let pointer_lines = self.params.features.contains(EffectFeatures::POINTER_LINES);
        let radius = self.params.influence_radius;
        let mut frame = FieldFrame {
            nodes: self.nodes.len(),
            ..FieldFrame::default()
        };

        self.surface.clear();

        if threshold > 0.0 {
            for (i, a) in self.nodes.iter().enumerate() {
                for b in &self.nodes[i + 1..] {
                    let d = a.pos.distance(b.pos);
                    if d < threshold {
                        let alpha = (1.0 - d / threshold) * LINK_MAX_ALPHA;
                        self.surface.line(a.pos, b.pos, alpha, LINK_WIDTH);
                        frame.links += 1;
                    }
                }
            }
        }

        if pointer_lines && radius > 0.0 {
            for node in &self.nodes {
                let d = node.pos.distance(self.pointer);
                if d < radius {
                    let alpha = (1.0 - d / radius) * POINTER_LINK_MAX_ALPHA;
                    self.surface.line(node.pos, self.pointer, alpha, LINK_WIDTH);
                    frame.pointer_links += 1;
                }
            }
        }

        for node in &self.nodes {
            self.surface.circle(node.pos, node.radius, 0.8, glow);
        }

        self.last_frame = frame;
        frame
    }
}

impl<S: Surface> Effect for ParticleField<S> {
    fn kind(&self) -> EffectKind {
        EffectKind::ParticleField
    }

    fn draw(&mut self, _tick: FrameTick) {
        self.step();
        self.render();
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.surface.resize(viewport);
        self.regenerate();
    }

    fn pointer(&mut self, event: PointerEvent) {
        if !self.pointer_active() {
            return;
        }
        self.pointer = match event {
            PointerEvent::Move(p) => p,
            PointerEvent::Leave => Point::FAR_AWAY,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::InertReason;
    use crate::surface::RecordingSurface;
    use folio_core::capability::CapabilityProfileBuilder;
    use std::time::Duration;

    fn high_params() -> EffectParams {
        EffectParams::resolve(&CapabilityProfile::workstation(), EffectKind::ParticleField)
    }

    fn tick() -> FrameTick {
        FrameTick::new(Duration::ZERO, Duration::ZERO, 0)
    }

    fn still(x: f64, y: f64) -> Node {
        Node::new(Point::new(x, y), Point::default(), 2.0)
    }

    #[test]
    fn high_tier_node_count_for_1024x768() {
        let field = ParticleField::mount(
            &CapabilityProfile::workstation(),
            Some(RecordingSurface::new()),
            Viewport::new(1024.0, 768.0),
            XorShift::new(1),
        )
        .active()
        .expect("high tier mounts");
        assert_eq!(field.nodes().len(), 65);
        assert_eq!(field.target_count(), 65);
    }

    #[test]
    fn count_is_capped() {
        let field = ParticleField::mount(
            &CapabilityProfile::workstation(),
            Some(RecordingSurface::new()),
            Viewport::new(3840.0, 2160.0),
            XorShift::new(1),
        )
        .active()
        .expect("mounts");
        assert_eq!(field.nodes().len(), 90);
    }

    #[test]
    fn nodes_start_inside_viewport() {
        let vp = Viewport::new(800.0, 600.0);
        let field = ParticleField::mount(
            &CapabilityProfile::workstation(),
            Some(RecordingSurface::new()),
            vp,
            XorShift::new(5),
        )
        .active()
        .expect("mounts");
        assert!(field.nodes().iter().all(|n| vp.contains(n.pos)));
    }

    #[test]
    fn low_tier_hides_canvas() {
        let mount = ParticleField::mount(
            &CapabilityProfile::low_end_phone(),
            Some(RecordingSurface::new()),
            Viewport::new(390.0, 800.0),
            XorShift::new(1),
        );
        assert_eq!(mount.inert_reason(), Some(InertReason::LowTier));
    }

    #[test]
    fn reduced_motion_reports_reason() {
        let profile = CapabilityProfileBuilder::new()
            .cores(16)
            .memory_gb(16.0)
            .reduced_motion(true)
            .build();
        let mount = ParticleField::mount(
            &profile,
            Some(RecordingSurface::new()),
            Viewport::new(1024.0, 768.0),
            XorShift::new(1),
        );
        assert_eq!(mount.inert_reason(), Some(InertReason::ReducedMotion));
    }

    #[test]
    fn close_static_pair_links_every_frame() {
        let mut field = ParticleField::from_nodes(
            high_params(),
            RecordingSurface::new(),
            Viewport::new(500.0, 500.0),
            vec![still(100.0, 100.0), still(150.0, 100.0)],
        );
        for _ in 0..5 {
            field.draw(tick());
            assert_eq!(field.last_frame().links, 1);
            assert_eq!(field.surface().lines_in_last_frame(), 1);
        }
    }

    #[test]
    fn distant_static_pair_never_links() {
        let mut field = ParticleField::from_nodes(
            high_params(),
            RecordingSurface::new(),
            Viewport::new(500.0, 500.0),
            vec![still(10.0, 10.0), still(400.0, 400.0)],
        );
        for _ in 0..5 {
            field.draw(tick());
            assert_eq!(field.last_frame().links, 0);
        }
    }

    #[test]
    fn link_opacity_falls_with_distance() {
        let mut near = ParticleField::from_nodes(
            high_params(),
            RecordingSurface::new(),
            Viewport::new(500.0, 500.0),
            vec![still(100.0, 100.0), still(110.0, 100.0)],
        );
        let mut far = ParticleField::from_nodes(
            high_params(),
            RecordingSurface::new(),
            Viewport::new(500.0, 500.0),
            vec![still(100.0, 100.0), still(230.0, 100.0)],
        );
        near.render();
        far.render();
        let alpha = |s: &RecordingSurface| {
            s.last_frame()
                .iter()
                .find_map(|op| match op {
                    crate::surface::DrawOp::Line { alpha, .. } => Some(*alpha),
                    _ => None,
                })
                .unwrap_or(0.0)
        };
        assert!(alpha(near.surface()) > alpha(far.surface()));
    }

    #[test]
    fn pointer_pushes_nearby_nodes_away() {
        let mut field = ParticleField::from_nodes(
            high_params(),
            RecordingSurface::new(),
            Viewport::new(500.0, 500.0),
            vec![still(200.0, 200.0), still(450.0, 450.0)],
        );
        field.pointer(PointerEvent::Move(Point::new(190.0, 200.0)));
        field.step();
        assert!(field.nodes()[0].vel.x > 0.0);
        assert_eq!(field.nodes()[0].vel.y, 0.0);
        assert_eq!(field.nodes()[1].vel, Point::default());
    }

    #[test]
    fn pointer_leave_resets_to_sentinel() {
        let mut field = ParticleField::from_nodes(
            high_params(),
            RecordingSurface::new(),
            Viewport::new(500.0, 500.0),
            vec![still(200.0, 200.0)],
        );
        field.pointer(PointerEvent::Move(Point::new(200.0, 210.0)));
        field.pointer(PointerEvent::Leave);
        assert_eq!(field.pointer_position(), Point::FAR_AWAY);
        field.step();
        assert_eq!(field.nodes()[0].vel, Point::default());
    }

    #[test]
    fn speed_stays_capped_under_constant_push() {
        let mut field = ParticleField::from_nodes(
            high_params(),
            RecordingSurface::new(),
            Viewport::new(500.0, 500.0),
            vec![still(250.0, 250.0)],
        );
        for i in 0..500 {
            let node = field.nodes()[0].pos;
            let offset = if i % 2 == 0 { 1.0 } else { -1.0 };
            field.pointer(PointerEvent::Move(Point::new(node.x + offset, node.y + offset)));
            field.step();
            assert!(field.nodes()[0].speed() <= PARTICLE_CAP_EPS);
        }
    }

    const PARTICLE_CAP_EPS: f64 = crate::resolver::PARTICLE_SPEED_CAP + 1e-9;

    #[test]
    fn edges_reflect_and_clamp() {
        let mut field = ParticleField::from_nodes(
            high_params(),
            RecordingSurface::new(),
            Viewport::new(100.0, 100.0),
            vec![Node::new(Point::new(99.5, 0.5), Point::new(1.0, -1.0), 2.0)],
        );
        field.step();
        let node = field.nodes()[0];
        assert_eq!(node.pos, Point::new(100.0, 0.0));
        assert!(node.vel.x < 0.0);
        assert!(node.vel.y > 0.0);
    }

    #[test]
    fn resize_regenerates_deterministic_count() {
        let mut field = ParticleField::mount(
            &CapabilityProfile::workstation(),
            Some(RecordingSurface::new()),
            Viewport::new(1024.0, 768.0),
            XorShift::new(3),
        )
        .active()
        .expect("mounts");
        field.resize(Viewport::new(1280.0, 720.0));
        let first = field.nodes().len();
        field.resize(Viewport::new(1280.0, 720.0));
        assert_eq!(field.nodes().len(), first);
        assert_eq!(first, 76);
        assert_eq!(field.surface().viewport(), Viewport::new(1280.0, 720.0));
    }

    #[test]
    fn mobile_ignores_pointer() {
        let tablet = CapabilityProfileBuilder::new()
            .cores(8)
            .memory_gb(8.0)
            .viewport_width(700.0)
            .build();
        let params = EffectParams::resolve(&tablet, EffectKind::ParticleField);
        let mut field = ParticleField::from_nodes(
            params,
            RecordingSurface::new(),
            Viewport::new(700.0, 900.0),
            vec![still(100.0, 100.0)],
        );
        field.pointer(PointerEvent::Move(Point::new(101.0, 100.0)));
        assert_eq!(field.pointer_position(), Point::FAR_AWAY);
    }
}
