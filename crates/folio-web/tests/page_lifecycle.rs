//! End-to-end lifecycle tests for `FolioPage` with recording sinks.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use folio_core::capability::{CapabilityProfile, CapabilityProfileBuilder, Tier};
use folio_core::geometry::{Point, Viewport};
use folio_fx::counter::CounterSpec;
use folio_fx::effect::{InertReason, PointerEvent};
use folio_fx::resolver::EffectKind;
use folio_fx::surface::{
    ElementSink, RecordingElement, RecordingSurface, RecordingTerminal, Surface, TerminalSink,
    Transform,
};
use folio_fx::terminal::{LineStyle, TerminalLine};
use folio_fx::tilt::CardRect;
use folio_runtime::orchestrator::Phase;
use folio_web::{Anchor, AnchorId, FolioPage, FxConfig};
use pretty_assertions::assert_eq;

/// Recorder the test keeps a handle to after the page takes ownership.
#[derive(Default)]
struct Shared<T>(Rc<RefCell<T>>);

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> Shared<T> {
    fn get(&self) -> std::cell::Ref<'_, T> {
        self.0.borrow()
    }
}

impl Surface for Shared<RecordingSurface> {
    fn resize(&mut self, viewport: Viewport) {
        self.0.borrow_mut().resize(viewport);
    }
    fn set_visible(&mut self, visible: bool) {
        self.0.borrow_mut().set_visible(visible);
    }
    fn clear(&mut self) {
        self.0.borrow_mut().clear();
    }
    fn fade(&mut self, alpha: f64) {
        self.0.borrow_mut().fade(alpha);
    }
    fn circle(&mut self, center: Point, radius: f64, alpha: f64, glow: bool) {
        self.0.borrow_mut().circle(center, radius, alpha, glow);
    }
    fn line(&mut self, from: Point, to: Point, alpha: f64, width: f64) {
        self.0.borrow_mut().line(from, to, alpha, width);
    }
    fn glyph(&mut self, at: Point, ch: char, size: f64, brightness: f64) {
        self.0.borrow_mut().glyph(at, ch, size, brightness);
    }
    fn band(&mut self, y: f64, height: f64, alpha: f64) {
        self.0.borrow_mut().band(y, height, alpha);
    }
}

impl ElementSink for Shared<RecordingElement> {
    fn set_visible(&mut self, visible: bool) {
        self.0.borrow_mut().set_visible(visible);
    }
    fn set_text(&mut self, text: &str) {
        self.0.borrow_mut().set_text(text);
    }
    fn set_transform(&mut self, transform: Transform) {
        self.0.borrow_mut().set_transform(transform);
    }
    fn set_progress(&mut self, fraction: f64) {
        self.0.borrow_mut().set_progress(fraction);
    }
    fn set_opacity(&mut self, opacity: f64) {
        self.0.borrow_mut().set_opacity(opacity);
    }
    fn bounds(&self) -> Option<CardRect> {
        self.0.borrow().bounds()
    }
}

impl TerminalSink for Shared<RecordingTerminal> {
    fn push_line(&mut self, text: &str, style: LineStyle, blink: bool) {
        self.0.borrow_mut().push_line(text, style, blink);
    }
    fn update_last_line(&mut self, text: &str) {
        self.0.borrow_mut().update_last_line(text);
    }
    fn set_cursor(&mut self, visible: bool) {
        self.0.borrow_mut().set_cursor(visible);
    }
    fn clear(&mut self) {
        TerminalSink::clear(&mut *self.0.borrow_mut());
    }
}

#[derive(Default)]
struct Fixture {
    matrix: Shared<RecordingSurface>,
    neural: Shared<RecordingSurface>,
    particles: Shared<RecordingSurface>,
    scanlines: Shared<RecordingSurface>,
    graph: Shared<RecordingSurface>,
    glitch: Shared<RecordingElement>,
    typewriter: Shared<RecordingElement>,
    terminal: Shared<RecordingTerminal>,
    glow: Shared<RecordingElement>,
    reveal: Shared<RecordingElement>,
    counter: Shared<RecordingElement>,
    bar: Shared<RecordingElement>,
    card: Shared<RecordingElement>,
}

/// Ids of the anchors that wait to be scrolled into view.
struct Watched {
    reveal: AnchorId,
    counter: AnchorId,
    bar: AnchorId,
}

impl Fixture {
    fn canvases(&self) -> [&Shared<RecordingSurface>; 5] {
        [&self.matrix, &self.neural, &self.particles, &self.scanlines, &self.graph]
    }

    fn attach_all(&self, page: &mut FolioPage) -> Watched {
        page.attach(Anchor::MatrixCanvas(Box::new(self.matrix.clone())));
        page.attach(Anchor::NeuralCanvas(Box::new(self.neural.clone())));
        page.attach(Anchor::ParticlesCanvas(Box::new(self.particles.clone())));
        page.attach(Anchor::ScanlinesCanvas(Box::new(self.scanlines.clone())));
        page.attach(Anchor::GraphCanvas(Box::new(self.graph.clone())));
        page.attach(Anchor::GlitchText {
            sink: Box::new(self.glitch.clone()),
            text: "ACCESS GRANTED".into(),
        });
        page.attach(Anchor::Typewriter(Box::new(self.typewriter.clone())));
        page.attach(Anchor::Terminal(Box::new(self.terminal.clone())));
        page.attach(Anchor::CursorGlow(Box::new(self.glow.clone())));
        let reveal = page.attach(Anchor::Reveal(Box::new(self.reveal.clone())));
        let counter = page.attach(Anchor::Counter {
            sink: Box::new(self.counter.clone()),
            spec: CounterSpec::new(120.0).suffix("+").duration(Duration::from_millis(1000)),
        });
        let bar = page.attach(Anchor::SkillBar {
            sink: Box::new(self.bar.clone()),
            percent: 90.0,
        });
        page.attach(Anchor::Card {
            sink: Box::new(self.card.clone()),
            rect: CardRect::new(0.0, 0.0, 300.0, 200.0),
        });
        Watched { reveal, counter, bar }
    }
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn config() -> FxConfig {
    FxConfig {
        seed: 42,
        typewriter_phrases: vec!["Systems".into(), "Rust".into()],
        terminal_script: vec![
            TerminalLine::command("whoami").with_delay_ms(50),
            TerminalLine::output("guest").with_delay_ms(50),
        ],
        ..FxConfig::default()
    }
}

fn desktop() -> Viewport {
    Viewport::new(1920.0, 1080.0)
}

/// Drive frames at ~60 Hz from `from` to `to` inclusive.
fn run(page: &mut FolioPage, from: u64, to: u64) {
    let mut t = from;
    while t <= to {
        page.frame(ms(t));
        t += 16;
    }
}

#[test]
fn phases_open_in_order() {
    let fx = Fixture::default();
    let mut page = FolioPage::new(CapabilityProfile::workstation(), desktop(), config());
    fx.attach_all(&mut page);

    let started = page.start(ms(0));
    let labels: Vec<_> = started.ran.iter().map(|(p, l)| (*p, *l)).collect();
    assert_eq!(
        labels,
        vec![
            (Phase::Immediate, "typewriter"),
            (Phase::Immediate, "terminal"),
            (Phase::Immediate, "cursor-glow"),
        ]
    );
    assert!(!page.is_phase_open(Phase::Deferred));

    assert!(page.frame(ms(199)).started.is_empty());
    let deferred = page.frame(ms(200)).started;
    assert_eq!(
        deferred.ran.iter().map(|(_, l)| *l).collect::<Vec<_>>(),
        vec!["matrix-rain", "neural-network", "ambient-particles", "glitch-text"]
    );
    assert!(page.frame(ms(499)).started.is_empty());
    let idle = page.frame(ms(500)).started;
    assert!(idle.ran.iter().all(|(p, _)| *p == Phase::Idle));
    assert_eq!(
        idle.ran.iter().map(|(_, l)| *l).collect::<Vec<_>>(),
        vec!["scroll-reveal", "counters", "card-tilt", "graph", "scanlines"]
    );

    let active = page.active_effects();
    for kind in [
        EffectKind::Typewriter,
        EffectKind::Terminal,
        EffectKind::CursorGlow,
        EffectKind::MatrixRain,
        EffectKind::ParticleField,
        EffectKind::AmbientParticles,
        EffectKind::GlitchText,
        EffectKind::Reveal,
        EffectKind::Counter,
        EffectKind::CardTilt,
        EffectKind::Graph,
        EffectKind::Scanlines,
    ] {
        assert!(active.contains(&kind), "{kind:?} not active");
    }
}

#[test]
fn early_idle_signal_waits_for_deferred() {
    let fx = Fixture::default();
    let mut page = FolioPage::new(
        CapabilityProfile::workstation(),
        desktop(),
        FxConfig {
            idle_supported: true,
            ..config()
        },
    );
    fx.attach_all(&mut page);
    page.start(ms(0));
    page.idle();
    assert!(page.frame(ms(50)).started.is_empty());
    let report = page.frame(ms(200)).started;
    let phases: Vec<_> = report.ran.iter().map(|(p, _)| *p).collect();
    let first_idle = phases.iter().position(|p| *p == Phase::Idle).expect("idle ran");
    assert!(phases[..first_idle].iter().all(|p| *p == Phase::Deferred));
    assert!(!phases[..first_idle].is_empty());
}

#[test]
fn reduced_motion_schedules_nothing() {
    let profile = CapabilityProfileBuilder::new()
        .cores(16)
        .memory_gb(16.0)
        .viewport_width(1920.0)
        .reduced_motion(true)
        .build();
    let fx = Fixture::default();
    let mut page = FolioPage::new(profile, desktop(), config());
    fx.attach_all(&mut page);
    page.start(ms(0));
    run(&mut page, 0, 3_000);

    assert_eq!(page.handle_count(), 0);
    assert_eq!(page.live_handle_count(), 0);
    assert!(page.active_effects().is_empty());
    for canvas in fx.canvases() {
        assert!(!canvas.get().is_visible());
        assert!(canvas.get().ops().is_empty());
    }
    // Content is still delivered, in its final state.
    assert_eq!(fx.typewriter.get().text, "Systems");
    assert_eq!(fx.terminal.get().texts(), vec!["whoami", "guest"]);
    assert_eq!(fx.counter.get().text, "120+");
    assert!((fx.bar.get().progress - 0.9).abs() < 1e-12);
    assert_eq!(fx.reveal.get().opacity, 1.0);
    assert_eq!(fx.reveal.get().transform, Transform::Identity);
    assert!(
        page.inert_effects()
            .contains(&(EffectKind::MatrixRain, InertReason::ReducedMotion))
    );
}

#[test]
fn low_tier_keeps_content_and_hides_canvases() {
    let fx = Fixture::default();
    let mut page = FolioPage::new(
        CapabilityProfile::low_end_phone(),
        Viewport::new(390.0, 844.0),
        config(),
    );
    assert_eq!(page.tier(), Tier::Low);
    fx.attach_all(&mut page);
    page.start(ms(0));
    run(&mut page, 0, 1_000);

    for canvas in fx.canvases() {
        assert!(!canvas.get().is_visible());
    }
    let active = page.active_effects();
    assert!(active.contains(&EffectKind::Typewriter));
    assert!(active.contains(&EffectKind::Terminal));
    assert!(!active.contains(&EffectKind::CursorGlow));
    assert!(!active.contains(&EffectKind::ParticleField));
    assert!(fx.typewriter.get().text_writes > 0);
}

#[test]
fn destroy_cancels_every_handle() {
    let fx = Fixture::default();
    let mut page = FolioPage::new(CapabilityProfile::workstation(), desktop(), config());
    fx.attach_all(&mut page);
    page.start(ms(0));
    run(&mut page, 0, 600);

    let live = page.live_handle_count();
    assert!(live >= 8, "expected most effects live, got {live}");
    assert_eq!(page.destroy(), live);
    assert_eq!(page.live_handle_count(), 0);
    assert!(page.active_effects().is_empty());

    let ops_before = fx.neural.get().ops().len();
    let report = page.frame(ms(700));
    assert_eq!(report.tick.fired, 0);
    assert_eq!(fx.neural.get().ops().len(), ops_before);
    assert_eq!(page.destroy(), 0);
}

#[test]
fn finished_counters_are_unscheduled() {
    let fx = Fixture::default();
    let mut page = FolioPage::new(CapabilityProfile::mid_laptop(), desktop(), config());
    fx.attach_all(&mut page);
    page.start(ms(0));
    page.reveal_all();

    let mut finished = 0;
    let mut t = 0;
    while t <= 3_000 {
        finished += page.frame(ms(t)).finished;
        t += 16;
    }
    // One reveal, one counter and one skill bar.
    assert_eq!(finished, 3);
    assert!(!page.active_effects().contains(&EffectKind::Counter));
    assert!(!page.active_effects().contains(&EffectKind::Reveal));
    assert_eq!(fx.reveal.get().opacity, 1.0);
    assert_eq!(fx.counter.get().text, "120+");
    assert!((fx.bar.get().progress - 0.9).abs() < 1e-12);
}

#[test]
fn counters_wait_for_their_reveal() {
    let fx = Fixture::default();
    let mut page = FolioPage::new(CapabilityProfile::workstation(), desktop(), config());
    let ids = fx.attach_all(&mut page);
    page.start(ms(0));
    run(&mut page, 0, 3_000);

    assert!(page.active_effects().contains(&EffectKind::Counter));
    assert_eq!(fx.counter.get().text, "0+");
    assert_eq!(fx.bar.get().progress, 0.0);
    assert_eq!(fx.reveal.get().opacity, 0.0);

    page.reveal(ids.counter);
    run(&mut page, 3_008, 4_500);
    assert_eq!(fx.counter.get().text, "120+");
    assert_eq!(fx.bar.get().progress, 0.0);
    assert_eq!(fx.reveal.get().opacity, 0.0);

    page.reveal(ids.bar);
    page.reveal(ids.reveal);
    run(&mut page, 4_508, 6_500);
    assert!((fx.bar.get().progress - 0.9).abs() < 1e-12);
    assert_eq!(fx.reveal.get().opacity, 1.0);
}

#[test]
fn reveal_before_idle_phase_is_kept() {
    let fx = Fixture::default();
    let mut page = FolioPage::new(CapabilityProfile::workstation(), desktop(), config());
    let ids = fx.attach_all(&mut page);
    page.start(ms(0));
    page.reveal(ids.bar);
    run(&mut page, 0, 2_500);

    assert!(page.is_phase_open(Phase::Idle));
    assert!((fx.bar.get().progress - 0.9).abs() < 1e-12);
    assert_eq!(fx.counter.get().text, "0+");
}

#[test]
fn resize_rebuilds_canvas_geometry_without_retiering() {
    let fx = Fixture::default();
    let mut page = FolioPage::new(CapabilityProfile::workstation(), desktop(), config());
    fx.attach_all(&mut page);
    page.start(ms(0));
    run(&mut page, 0, 250);

    let small = Viewport::new(600.0, 400.0);
    page.resize(small);
    assert_eq!(fx.neural.get().viewport(), small);
    assert_eq!(fx.matrix.get().viewport(), small);
    run(&mut page, 266, 600);
    page.resize(Viewport::new(500.0, 300.0));
    assert_eq!(fx.graph.get().viewport(), Viewport::new(500.0, 300.0));
    assert_eq!(page.tier(), Tier::High);
    assert_eq!(page.viewport(), small);
}

#[test]
fn pointer_reaches_interactive_effects() {
    let fx = Fixture::default();
    let mut page = FolioPage::new(CapabilityProfile::workstation(), desktop(), config());
    fx.attach_all(&mut page);
    page.start(ms(0));
    run(&mut page, 0, 600);

    page.pointer(PointerEvent::Move(Point::new(150.0, 20.0)));
    run(&mut page, 616, 1_500);
    assert_eq!(fx.glow.get().opacity, 1.0);
    assert!(matches!(fx.glow.get().transform, Transform::Translate(_)));
    assert!(matches!(fx.card.get().transform, Transform::Tilt { .. }));

    page.pointer(PointerEvent::Leave);
    assert_eq!(fx.glow.get().opacity, 0.0);
}

#[test]
fn tilt_tracks_card_after_scroll() {
    let fx = Fixture::default();
    let mut page = FolioPage::new(CapabilityProfile::workstation(), desktop(), config());
    fx.attach_all(&mut page);
    page.start(ms(0));
    run(&mut page, 0, 600);

    // The card scrolled from y=0 down to y=1000 after it was attached.
    fx.card.0.borrow_mut().bounds = Some(CardRect::new(0.0, 1_000.0, 300.0, 200.0));
    page.pointer(PointerEvent::Move(Point::new(150.0, 100.0)));
    run(&mut page, 616, 1_500);
    assert_eq!(fx.card.get().transform, Transform::Identity);

    page.pointer(PointerEvent::Move(Point::new(300.0, 1_000.0)));
    run(&mut page, 1_516, 2_500);
    assert!(matches!(fx.card.get().transform, Transform::Tilt { .. }));
}

#[test]
fn missing_anchors_are_silent() {
    let mut page = FolioPage::new(CapabilityProfile::workstation(), desktop(), config());
    page.start(ms(0));
    run(&mut page, 0, 600);
    assert!(page.active_effects().is_empty());
    assert!(
        page.inert_effects()
            .iter()
            .all(|(_, reason)| *reason == InertReason::MissingAnchor)
    );
}

#[test]
fn frames_before_start_do_nothing() {
    let fx = Fixture::default();
    let mut page = FolioPage::new(CapabilityProfile::workstation(), desktop(), config());
    fx.attach_all(&mut page);
    let report = page.frame(ms(1_000));
    assert!(report.started.is_empty());
    assert_eq!(report.tick.fired, 0);
    assert_eq!(fx.typewriter.get().text_writes, 0);
}

#[test]
fn stale_timestamps_do_not_rewind() {
    let fx = Fixture::default();
    let mut page = FolioPage::new(CapabilityProfile::workstation(), desktop(), config());
    fx.attach_all(&mut page);
    page.start(ms(0));
    run(&mut page, 0, 300);

    let writes = fx.typewriter.get().text_writes;
    let report = page.frame(ms(100));
    assert_eq!(report.tick.fired, 0);
    assert!(report.started.is_empty());
    assert_eq!(fx.typewriter.get().text_writes, writes);
}
