#![forbid(unsafe_code)]

//! Headless page run with recording sinks and JSON logs.
//!
//! Useful for checking tier decisions and phase timing on a given machine:
//!
//! ```sh
//! RUST_LOG=debug FOLIO_FORCE_TIER=mid \
//!     cargo run -p folio-web --features tracing-json --bin folio-headless [config.json]
//! ```
//!
//! `FOLIO_HEADLESS_MS` sets the simulated run length (default 5000 ms).

use std::time::Duration;

use folio_core::capability::HostSignals;
use folio_core::error::FolioError;
use folio_core::geometry::Viewport;
use folio_core::logging::init_json_subscriber;
use folio_fx::counter::CounterSpec;
use folio_fx::surface::{RecordingElement, RecordingSurface, RecordingTerminal};
use folio_fx::tilt::CardRect;
use folio_web::{Anchor, FolioPage, FxConfig};

const FRAME: Duration = Duration::from_millis(16);
const DEFAULT_RUN: Duration = Duration::from_millis(5000);
/// When every watched element is reported in view.
const REVEAL_AT: Duration = Duration::from_millis(1000);

fn attach_recorders(page: &mut FolioPage) {
    page.attach(Anchor::MatrixCanvas(Box::new(RecordingSurface::new())));
    page.attach(Anchor::NeuralCanvas(Box::new(RecordingSurface::new())));
    page.attach(Anchor::ParticlesCanvas(Box::new(RecordingSurface::new())));
    page.attach(Anchor::ScanlinesCanvas(Box::new(RecordingSurface::new())));
    page.attach(Anchor::GraphCanvas(Box::new(RecordingSurface::new())));
    page.attach(Anchor::GlitchText {
        sink: Box::new(RecordingElement::default()),
        text: "folio".into(),
    });
    page.attach(Anchor::Typewriter(Box::new(RecordingElement::default())));
    page.attach(Anchor::Terminal(Box::new(RecordingTerminal::default())));
    page.attach(Anchor::CursorGlow(Box::new(RecordingElement::default())));
    page.attach(Anchor::Reveal(Box::new(RecordingElement::default())));
    page.attach(Anchor::Counter {
        sink: Box::new(RecordingElement::default()),
        spec: CounterSpec::new(100.0).suffix("+"),
    });
    page.attach(Anchor::SkillBar {
        sink: Box::new(RecordingElement::default()),
        percent: 80.0,
    });
    page.attach(Anchor::Card {
        sink: Box::new(RecordingElement::default()),
        rect: CardRect::new(100.0, 600.0, 360.0, 240.0),
    });
}

fn main() -> Result<(), FolioError> {
    init_json_subscriber();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .map_err(|err| FolioError::Config(format!("{path}: {err}")))?;
            FxConfig::from_json(&json)?
        }
        None => FxConfig::default(),
    };
    let run_for = std::env::var("FOLIO_HEADLESS_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map_or(DEFAULT_RUN, Duration::from_millis);

    let viewport = Viewport::new(1920.0, 1080.0);
    let cores = std::thread::available_parallelism().map_or(1, |n| u32::try_from(n.get()).unwrap_or(u32::MAX));
    let signals = HostSignals::new(viewport.width).cores(cores);
    let mut page = FolioPage::from_signals(signals, viewport, config);
    attach_recorders(&mut page);

    page.start(Duration::ZERO);
    let (mut fired, mut finished, mut revealed) = (0, 0, false);
    let mut now = Duration::ZERO;
    while now <= run_for {
        if !revealed && now >= REVEAL_AT {
            page.reveal_all();
            revealed = true;
        }
        let report = page.frame(now);
        fired += report.tick.fired;
        finished += report.finished;
        now += FRAME;
    }

    tracing::info!(
        tier = %page.tier(),
        active = page.active_effects().len(),
        inert = page.inert_effects().len(),
        fired,
        finished,
        "headless run complete"
    );
    let cancelled = page.destroy();
    tracing::info!(cancelled, "page destroyed");
    Ok(())
}
