#![forbid(unsafe_code)]

//! Host-driven page runtime.
//!
//! [`FolioPage`] owns the scheduler and the orchestrator, and routes host
//! events to every running effect. The host drives it:
//!
//! ```text
//! page = FolioPage::new(profile, viewport, config)
//! id = page.attach(Anchor::...)     // for each element present on the page
//! page.start(now)                    // immediate phase
//! every animation frame: page.frame(now)
//! on idle callback:      page.idle()
//! element scrolled in:   page.reveal(id)
//! on resize / pointer:   page.resize(..) / page.pointer(..)
//! on unload:             page.destroy()
//! ```
//!
//! Effects are placed in phases as follows:
//!
//! | Phase | Effects |
//! |-------|---------|
//! | immediate | typewriter, terminal, cursor glow |
//! | deferred | matrix rain, neural particle field, ambient particles, glitch text |
//! | idle | scroll reveal, counters, skill bars, card tilt, node graph, scanlines |
//!
//! Reveal elements, counters and skill bars hold their initial state until
//! [`FolioPage::reveal`] reports them in view. Reports that arrive before the
//! idle phase mounts them are kept and applied at mount.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use folio_core::capability::{CapabilityProfile, HostSignals, Tier};
use folio_core::clock::{DeterministicClock, HostClock};
use folio_core::geometry::Viewport;
use folio_core::rng::XorShift;
use folio_fx::ambient::AmbientParticles;
use folio_fx::counter::{CountUp, CounterSpec, SkillBar};
use folio_fx::cursor_glow::CursorGlow;
use folio_fx::effect::{Effect, InertReason, Mount, PointerEvent};
use folio_fx::glitch::GlitchText;
use folio_fx::graph::NodeGraph;
use folio_fx::matrix_rain::MatrixRain;
use folio_fx::particle_field::ParticleField;
use folio_fx::resolver::{EffectKind, EffectParams};
use folio_fx::reveal::Reveal;
use folio_fx::scanlines::Scanlines;
use folio_fx::surface::{ElementSink, Surface, TerminalSink};
use folio_fx::terminal::Terminal;
use folio_fx::tilt::{CardRect, CardTilt};
use folio_fx::typewriter::Typewriter;
use folio_runtime::orchestrator::{InitContext, Orchestrator, Phase, PollReport};
use folio_runtime::scheduler::{ScheduleHandle, Scheduler, TickReport};

use crate::config::FxConfig;

/// A host element an effect can bind to.
pub enum Anchor {
    /// Canvas for matrix rain.
    MatrixCanvas(Box<dyn Surface>),
    /// Canvas for the neural-network particle field.
    NeuralCanvas(Box<dyn Surface>),
    /// Canvas for ambient particles.
    ParticlesCanvas(Box<dyn Surface>),
    ScanlinesCanvas(Box<dyn Surface>),
    /// Canvas for the decorative node graph.
    GraphCanvas(Box<dyn Surface>),
    GlitchText {
        sink: Box<dyn ElementSink>,
        text: String,
    },
    Typewriter(Box<dyn ElementSink>),
    Terminal(Box<dyn TerminalSink>),
    CursorGlow(Box<dyn ElementSink>),
    /// Element that fades and slides in when scrolled into view.
    Reveal(Box<dyn ElementSink>),
    Counter {
        sink: Box<dyn ElementSink>,
        spec: CounterSpec,
    },
    SkillBar {
        sink: Box<dyn ElementSink>,
        percent: f64,
    },
    Card {
        sink: Box<dyn ElementSink>,
        rect: CardRect,
    },
}

impl fmt::Debug for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MatrixCanvas(_) => "MatrixCanvas",
            Self::NeuralCanvas(_) => "NeuralCanvas",
            Self::ParticlesCanvas(_) => "ParticlesCanvas",
            Self::ScanlinesCanvas(_) => "ScanlinesCanvas",
            Self::GraphCanvas(_) => "GraphCanvas",
            Self::GlitchText { .. } => "GlitchText",
            Self::Typewriter(_) => "Typewriter",
            Self::Terminal(_) => "Terminal",
            Self::CursorGlow(_) => "CursorGlow",
            Self::Reveal(_) => "Reveal",
            Self::Counter { .. } => "Counter",
            Self::SkillBar { .. } => "SkillBar",
            Self::Card { .. } => "Card",
        };
        f.write_str(name)
    }
}

/// Handle for an attached anchor; the host uses it to report visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnchorId(u32);

impl AnchorId {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Page-level performance observations reported by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PerfSignal {
    /// Largest contentful paint, host milliseconds.
    LargestContentfulPaint { at_ms: f64 },
    /// The host has no performance observer.
    ObserverUnsupported,
}

/// Anchors waiting for their phase. Single-slot anchors are replaced by a
/// later attach; list anchors accumulate.
#[derive(Default)]
struct Anchors {
    matrix: Option<Box<dyn Surface>>,
    neural: Option<Box<dyn Surface>>,
    particles: Option<Box<dyn Surface>>,
    scanlines: Option<Box<dyn Surface>>,
    graph: Option<Box<dyn Surface>>,
    glitch: Option<(Box<dyn ElementSink>, String)>,
    typewriter: Option<Box<dyn ElementSink>>,
    terminal: Option<Box<dyn TerminalSink>>,
    cursor_glow: Option<Box<dyn ElementSink>>,
    reveals: Vec<(AnchorId, Box<dyn ElementSink>)>,
    counters: Vec<(AnchorId, Box<dyn ElementSink>, CounterSpec)>,
    skill_bars: Vec<(AnchorId, Box<dyn ElementSink>, f64)>,
    cards: Vec<(Box<dyn ElementSink>, CardRect)>,
}

type SharedEffect = Rc<RefCell<dyn Effect>>;

struct Live {
    kind: EffectKind,
    anchor: Option<AnchorId>,
    effect: SharedEffect,
    handle: ScheduleHandle,
}

/// Running and inert effects, shared with phase initializers.
#[derive(Default)]
struct Registry {
    live: Vec<Live>,
    inert: Vec<(EffectKind, InertReason)>,
}

/// Everything a phase initializer needs, cloned into each closure.
#[derive(Clone)]
struct Env {
    profile: CapabilityProfile,
    viewport: Rc<Cell<Viewport>>,
    anchors: Rc<RefCell<Anchors>>,
    registry: Rc<RefCell<Registry>>,
    /// Anchors reported in view.
    revealed: Rc<RefCell<BTreeSet<AnchorId>>>,
    config: Rc<FxConfig>,
}

impl Env {
    fn params(&self, kind: EffectKind) -> EffectParams {
        EffectParams::resolve(&self.profile, kind).with_density_scale(self.config.density_scale)
    }

    fn rng(&self, kind: EffectKind, salt: u64) -> XorShift {
        let index = EffectKind::ALL.iter().position(|k| *k == kind).unwrap_or(0) as u64;
        XorShift::new(self.config.seed).fork((index << 32) | salt)
    }

    fn reduced(&self) -> bool {
        self.profile.prefers_reduced_motion
    }

    fn install<E: Effect + 'static>(
        &self,
        ctx: &mut InitContext<'_>,
        kind: EffectKind,
        mount: Mount<E>,
    ) {
        self.install_anchored(ctx, kind, None, mount);
    }

    /// Schedule an active driver, or record why it is inert. A driver whose
    /// anchor was already reported in view is revealed before its first frame.
    fn install_anchored<E: Effect + 'static>(
        &self,
        ctx: &mut InitContext<'_>,
        kind: EffectKind,
        anchor: Option<AnchorId>,
        mount: Mount<E>,
    ) {
        match mount {
            Mount::Active(mut effect) => {
                if anchor.is_some_and(|id| self.revealed.borrow().contains(&id)) {
                    effect.reveal();
                }
                let fps = self.params(kind).target_fps;
                let shared: SharedEffect = Rc::new(RefCell::new(effect));
                let driver = Rc::clone(&shared);
                let handle = ctx.register(fps, move |tick| driver.borrow_mut().draw(tick));
                self.registry.borrow_mut().live.push(Live {
                    kind,
                    anchor,
                    effect: shared,
                    handle,
                });
            }
            Mount::Inert(reason) => {
                if reason != InertReason::MissingAnchor {
                    tracing::debug!(effect = kind.as_str(), %reason, "effect inert");
                }
                self.registry.borrow_mut().inert.push((kind, reason));
            }
        }
    }
}

/// What one [`FolioPage::frame`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Effects whose phase opened this frame.
    pub started: PollReport,
    pub tick: TickReport,
    /// Effects that completed and were unscheduled.
    pub finished: usize,
}

/// One portfolio page worth of effects.
pub struct FolioPage {
    env: Env,
    scheduler: Scheduler,
    orchestrator: Orchestrator,
    /// Host time, clamped monotonic.
    clock: DeterministicClock,
    next_anchor: u32,
    started: bool,
    destroyed: bool,
}

impl FolioPage {
    /// Page for an already-classified profile.
    #[must_use]
    pub fn new(profile: CapabilityProfile, viewport: Viewport, config: FxConfig) -> Self {
        let orchestrator = Orchestrator::new(config.phase_timing());
        tracing::info!(
            tier = %profile.tier,
            reduced_motion = profile.prefers_reduced_motion,
            width = viewport.width,
            height = viewport.height,
            "folio page created"
        );
        Self {
            env: Env {
                profile,
                viewport: Rc::new(Cell::new(viewport)),
                anchors: Rc::new(RefCell::new(Anchors::default())),
                registry: Rc::new(RefCell::new(Registry::default())),
                revealed: Rc::new(RefCell::new(BTreeSet::new())),
                config: Rc::new(config),
            },
            scheduler: Scheduler::new(),
            orchestrator,
            clock: DeterministicClock::new(),
            next_anchor: 0,
            started: false,
            destroyed: false,
        }
    }

    /// Page for raw host signals, classified once per session.
    ///
    /// Natively, `FOLIO_FORCE_TIER` pins the tier; `config.force_tier` wins
    /// over it when both are set.
    #[must_use]
    pub fn from_signals(signals: HostSignals, viewport: Viewport, config: FxConfig) -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        let signals = signals.with_env_override();
        let signals = pin_configured_tier(signals, config.force_tier);
        let profile = *CapabilityProfile::session(&signals);
        Self::new(profile, viewport, config)
    }

    #[must_use]
    pub fn profile(&self) -> &CapabilityProfile {
        &self.env.profile
    }

    #[must_use]
    pub fn tier(&self) -> Tier {
        self.env.profile.tier
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.env.viewport.get()
    }

    /// Bind a host element. Anchors attached after their phase has run are
    /// ignored.
    pub fn attach(&mut self, anchor: Anchor) -> AnchorId {
        let id = AnchorId(self.next_anchor);
        self.next_anchor = self.next_anchor.saturating_add(1);
        if self.destroyed {
            return id;
        }
        tracing::trace!(anchor = ?anchor, id = id.0, "anchor attached");
        let mut anchors = self.env.anchors.borrow_mut();
        match anchor {
            Anchor::MatrixCanvas(s) => anchors.matrix = Some(s),
            Anchor::NeuralCanvas(s) => anchors.neural = Some(s),
            Anchor::ParticlesCanvas(s) => anchors.particles = Some(s),
            Anchor::ScanlinesCanvas(s) => anchors.scanlines = Some(s),
            Anchor::GraphCanvas(s) => anchors.graph = Some(s),
            Anchor::GlitchText { sink, text } => anchors.glitch = Some((sink, text)),
            Anchor::Typewriter(s) => anchors.typewriter = Some(s),
            Anchor::Terminal(s) => anchors.terminal = Some(s),
            Anchor::CursorGlow(s) => anchors.cursor_glow = Some(s),
            Anchor::Reveal(s) => anchors.reveals.push((id, s)),
            Anchor::Counter { sink, spec } => anchors.counters.push((id, sink, spec)),
            Anchor::SkillBar { sink, percent } => anchors.skill_bars.push((id, sink, percent)),
            Anchor::Card { sink, rect } => anchors.cards.push((sink, rect)),
        }
        id
    }

    /// Queue every effect and run the immediate phase. Only the first call
    /// has an effect.
    pub fn start(&mut self, now: Duration) -> PollReport {
        if self.started || self.destroyed {
            return PollReport::default();
        }
        self.started = true;
        self.clock.set(now);
        self.enqueue_all();
        self.orchestrator.start(self.clock.now_mono(), &mut self.scheduler)
    }

    fn enqueue_all(&mut self) {
        let o = &mut self.orchestrator;

        let env = self.env.clone();
        o.enqueue(Phase::Immediate, "typewriter", move |ctx| {
            let sink = env.anchors.borrow_mut().typewriter.take();
            let mount = Typewriter::mount(&env.profile, sink, env.config.typewriter_phrases.as_slice());
            env.install(ctx, EffectKind::Typewriter, mount);
        });

        let env = self.env.clone();
        o.enqueue(Phase::Immediate, "terminal", move |ctx| {
            let sink = env.anchors.borrow_mut().terminal.take();
            let mount = Terminal::mount(&env.profile, sink, env.config.terminal_script.clone());
            env.install(ctx, EffectKind::Terminal, mount);
        });

        let env = self.env.clone();
        o.enqueue(Phase::Immediate, "cursor-glow", move |ctx| {
            let sink = env.anchors.borrow_mut().cursor_glow.take();
            let mount = CursorGlow::mount(&env.profile, sink);
            env.install(ctx, EffectKind::CursorGlow, mount);
        });

        let env = self.env.clone();
        o.enqueue(Phase::Deferred, "matrix-rain", move |ctx| {
            let surface = env.anchors.borrow_mut().matrix.take();
            let mount = MatrixRain::with_params(
                env.params(EffectKind::MatrixRain),
                env.reduced(),
                surface,
                env.viewport.get(),
                env.rng(EffectKind::MatrixRain, 0),
            );
            env.install(ctx, EffectKind::MatrixRain, mount);
        });

        let env = self.env.clone();
        o.enqueue(Phase::Deferred, "neural-network", move |ctx| {
            let surface = env.anchors.borrow_mut().neural.take();
            let mount = ParticleField::with_params(
                env.params(EffectKind::ParticleField),
                env.reduced(),
                surface,
                env.viewport.get(),
                env.rng(EffectKind::ParticleField, 0),
            );
            env.install(ctx, EffectKind::ParticleField, mount);
        });

        let env = self.env.clone();
        o.enqueue(Phase::Deferred, "ambient-particles", move |ctx| {
            let surface = env.anchors.borrow_mut().particles.take();
            let mount = AmbientParticles::with_params(
                env.params(EffectKind::AmbientParticles),
                env.reduced(),
                surface,
                env.viewport.get(),
                env.rng(EffectKind::AmbientParticles, 0),
            );
            env.install(ctx, EffectKind::AmbientParticles, mount);
        });

        let env = self.env.clone();
        o.enqueue(Phase::Deferred, "glitch-text", move |ctx| {
            let anchor = env.anchors.borrow_mut().glitch.take();
            let (sink, text) = match anchor {
                Some((sink, text)) => (Some(sink), text),
                None => (None, String::new()),
            };
            let rng = env.rng(EffectKind::GlitchText, 0);
            let mount = GlitchText::mount(&env.profile, sink, &text, rng);
            env.install(ctx, EffectKind::GlitchText, mount);
        });

        let env = self.env.clone();
        o.enqueue(Phase::Idle, "scroll-reveal", move |ctx| {
            let reveals = std::mem::take(&mut env.anchors.borrow_mut().reveals);
            for (id, sink) in reveals {
                let mount = Reveal::mount(&env.profile, Some(sink));
                env.install_anchored(ctx, EffectKind::Reveal, Some(id), mount);
            }
        });

        let env = self.env.clone();
        o.enqueue(Phase::Idle, "counters", move |ctx| {
            let counters = std::mem::take(&mut env.anchors.borrow_mut().counters);
            for (id, sink, spec) in counters {
                let mount = CountUp::mount(&env.profile, Some(sink), spec);
                env.install_anchored(ctx, EffectKind::Counter, Some(id), mount);
            }
            let bars = std::mem::take(&mut env.anchors.borrow_mut().skill_bars);
            for (id, sink, percent) in bars {
                let mount = SkillBar::mount(&env.profile, Some(sink), percent);
                env.install_anchored(ctx, EffectKind::Counter, Some(id), mount);
            }
        });

        let env = self.env.clone();
        o.enqueue(Phase::Idle, "card-tilt", move |ctx| {
            let cards = std::mem::take(&mut env.anchors.borrow_mut().cards);
            for (sink, rect) in cards {
                let mount = CardTilt::mount(&env.profile, Some(sink), rect);
                env.install(ctx, EffectKind::CardTilt, mount);
            }
        });

        let env = self.env.clone();
        o.enqueue(Phase::Idle, "graph", move |ctx| {
            let surface = env.anchors.borrow_mut().graph.take();
            let mount = NodeGraph::with_params(
                env.params(EffectKind::Graph),
                env.reduced(),
                surface,
                env.viewport.get(),
                env.rng(EffectKind::Graph, 0),
            );
            env.install(ctx, EffectKind::Graph, mount);
        });

        let env = self.env.clone();
        o.enqueue(Phase::Idle, "scanlines", move |ctx| {
            let surface = env.anchors.borrow_mut().scanlines.take();
            let mount = Scanlines::mount(
                &env.profile,
                surface,
                env.viewport.get(),
                env.rng(EffectKind::Scanlines, 0),
            );
            env.install(ctx, EffectKind::Scanlines, mount);
        });
    }

    /// One native animation frame at host time `now`. A timestamp earlier
    /// than the last one is treated as no time passing.
    pub fn frame(&mut self, now: Duration) -> FrameReport {
        if !self.started || self.destroyed {
            return FrameReport::default();
        }
        self.clock.set(now);
        let now = self.clock.now_mono();
        let started = self.orchestrator.poll(now, &mut self.scheduler);
        let tick = self.scheduler.tick(now);

        let mut finished = 0;
        self.env.registry.borrow_mut().live.retain(|live| {
            if live.effect.borrow().is_finished() {
                live.handle.cancel();
                finished += 1;
                tracing::debug!(effect = live.kind.as_str(), "effect finished");
                false
            } else {
                !live.handle.is_cancelled()
            }
        });

        FrameReport {
            started,
            tick,
            finished,
        }
    }

    /// The host reported idle time.
    pub fn idle(&mut self) {
        self.orchestrator.notify_idle();
    }

    /// The element behind `id` scrolled into view. Repeated reports are
    /// ignored.
    pub fn reveal(&mut self, id: AnchorId) {
        if self.destroyed || !self.env.revealed.borrow_mut().insert(id) {
            return;
        }
        tracing::trace!(id = id.0, "anchor revealed");
        for live in &self.env.registry.borrow().live {
            if live.anchor == Some(id) {
                live.effect.borrow_mut().reveal();
            }
        }
    }

    /// Report every anchor attached so far as in view, for hosts without
    /// an intersection observer.
    pub fn reveal_all(&mut self) {
        for raw in 0..self.next_anchor {
            self.reveal(AnchorId(raw));
        }
    }

    /// Viewport changed. Drivers rebuild geometry; the tier stays.
    pub fn resize(&mut self, viewport: Viewport) {
        if self.destroyed || viewport == self.env.viewport.get() {
            return;
        }
        self.env.viewport.set(viewport);
        tracing::debug!(width = viewport.width, height = viewport.height, "viewport resized");
        for live in &self.env.registry.borrow().live {
            live.effect.borrow_mut().resize(viewport);
        }
    }

    /// Route a pointer event to every running effect.
    pub fn pointer(&mut self, event: PointerEvent) {
        if self.destroyed {
            return;
        }
        for live in &self.env.registry.borrow().live {
            live.effect.borrow_mut().pointer(event);
        }
    }

    /// Record a performance observation. Logged only.
    pub fn performance_signal(&self, signal: PerfSignal) {
        match signal {
            PerfSignal::LargestContentfulPaint { at_ms } => {
                tracing::info!(lcp_ms = at_ms, tier = %self.env.profile.tier, "largest contentful paint");
            }
            PerfSignal::ObserverUnsupported => {
                tracing::debug!("performance observer unsupported");
            }
        }
    }

    /// Cancel every schedule and drop all drivers. Returns how many
    /// schedules were cancelled. Idempotent.
    pub fn destroy(&mut self) -> usize {
        let cancelled = self.orchestrator.teardown(&mut self.scheduler);
        if !self.destroyed {
            self.destroyed = true;
            let mut registry = self.env.registry.borrow_mut();
            registry.live.clear();
            *self.env.anchors.borrow_mut() = Anchors::default();
        }
        cancelled
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Kinds of the effects currently scheduled, in start order.
    #[must_use]
    pub fn active_effects(&self) -> Vec<EffectKind> {
        self.env.registry.borrow().live.iter().map(|l| l.kind).collect()
    }

    /// Effects that did not start, with the reason.
    #[must_use]
    pub fn inert_effects(&self) -> Vec<(EffectKind, InertReason)> {
        self.env.registry.borrow().inert.clone()
    }

    /// Schedules not yet cancelled.
    #[must_use]
    pub fn live_handle_count(&self) -> usize {
        self.orchestrator.live_handle_count()
    }

    /// Schedules created by this page and still retained (zero after
    /// [`destroy`](Self::destroy)).
    #[must_use]
    pub fn handle_count(&self) -> usize {
        self.orchestrator.handles().len()
    }

    #[must_use]
    pub fn is_phase_open(&self, phase: Phase) -> bool {
        self.orchestrator.is_open(phase)
    }
}

/// `tier` from configuration overrides any tier already pinned.
fn pin_configured_tier(signals: HostSignals, tier: Option<Tier>) -> HostSignals {
    match tier {
        Some(tier) => signals.force_tier(Some(tier)),
        None => signals,
    }
}

impl fmt::Debug for FolioPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FolioPage")
            .field("tier", &self.env.profile.tier)
            .field("viewport", &self.env.viewport.get())
            .field("now", &self.clock.now_mono())
            .field("started", &self.started)
            .field("destroyed", &self.destroyed)
            .field("active", &self.active_effects())
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn configured_tier_beats_environment_override() {
        let from_env = HostSignals::new(1920.0).with_tier_override(Some("low"));
        assert_eq!(
            pin_configured_tier(from_env.clone(), Some(Tier::High)).forced_tier,
            Some(Tier::High)
        );
        assert_eq!(pin_configured_tier(from_env, None).forced_tier, Some(Tier::Low));
        assert_eq!(pin_configured_tier(HostSignals::new(1920.0), None).forced_tier, None);
    }

    #[test]
    fn anchor_ids_are_sequential() {
        let mut page = FolioPage::new(
            CapabilityProfile::workstation(),
            Viewport::new(1280.0, 800.0),
            FxConfig::default(),
        );
        let a = page.attach(Anchor::Reveal(Box::new(folio_fx::surface::RecordingElement::default())));
        let b = page.attach(Anchor::Reveal(Box::new(folio_fx::surface::RecordingElement::default())));
        assert_eq!((a.get(), b.get()), (0, 1));
        assert_eq!(AnchorId::from_raw(1), b);
    }
}
