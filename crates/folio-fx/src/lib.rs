#![forbid(unsafe_code)]

//! Effect drivers for folio.
//!
//! # Role in folio
//! `folio-fx` turns a [`CapabilityProfile`](folio_core::CapabilityProfile) into
//! running effects. [`resolver`] is the only place that branches on tier;
//! every driver mounts from resolved [`EffectParams`] and draws through one of
//! the sink traits in [`surface`].
//!
//! # Drivers
//!
//! | Module | Sink | Phase |
//! |--------|------|-------|
//! | [`typewriter`] | [`ElementSink`] | immediate |
//! | [`terminal`] | [`TerminalSink`] | immediate |
//! | [`cursor_glow`] | [`ElementSink`] | immediate |
//! | [`matrix_rain`] | [`Surface`] | deferred |
//! | [`particle_field`] | [`Surface`] | deferred |
//! | [`ambient`] | [`Surface`] | deferred |
//! | [`glitch`] | [`ElementSink`] | deferred |
//! | [`reveal`] | [`ElementSink`] | idle |
//! | [`counter`] | [`ElementSink`] | idle |
//! | [`tilt`] | [`ElementSink`] | idle |
//! | [`graph`] | [`Surface`] | idle |
//! | [`scanlines`] | [`Surface`] | idle |

pub mod ambient;
pub mod counter;
pub mod cursor_glow;
pub mod effect;
pub mod glitch;
pub mod graph;
pub mod matrix_rain;
pub mod particle_field;
pub mod resolver;
pub mod reveal;
pub mod scanlines;
pub mod surface;
pub mod terminal;
pub mod tilt;
pub mod typewriter;

pub use ambient::AmbientParticles;
pub use counter::{CountUp, CounterSpec, SkillBar};
pub use cursor_glow::CursorGlow;
pub use effect::{Effect, InertReason, Mount, PointerEvent};
pub use glitch::GlitchText;
pub use graph::NodeGraph;
pub use matrix_rain::MatrixRain;
pub use particle_field::ParticleField;
pub use resolver::{EffectFeatures, EffectKind, EffectParams, RenderMode};
pub use reveal::Reveal;
pub use scanlines::Scanlines;
pub use surface::{
    DrawOp, ElementSink, RecordingElement, RecordingSurface, RecordingTerminal, Surface,
    TerminalSink, Transform,
};
pub use terminal::{LineStyle, Terminal, TerminalLine};
pub use tilt::{CardRect, CardTilt};
pub use typewriter::Typewriter;
