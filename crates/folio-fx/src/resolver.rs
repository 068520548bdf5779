#![forbid(unsafe_code)]

//! Effect configuration resolver.
//!
//! All tier-dependent branching lives here. [`EffectParams::resolve`] maps a
//! [`CapabilityProfile`] and an [`EffectKind`] to a fully resolved parameter
//! set; drivers read only that.
//!
//! # Particle field table
//!
//! | Tier | fps | px² per node | max nodes | link distance | pointer |
//! |------|-----|--------------|-----------|---------------|---------|
//! | High | 60 | 12 000 | 90 | 140 | lines + repulsion (desktop) |
//! | Mid | 30 | 18 000 | 40 | 110 | repulsion (desktop) |
//! | Low | off | | | | |
//!
//! # Node graph table
//!
//! | Tier | fps | nodes | link distance | glow |
//! |------|-----|-------|---------------|------|
//! | High | 30 | 24 | 220 | yes |
//! | Mid | 15 | 14 | 200 | no |
//! | Low | off | | | |

use bitflags::bitflags;
use folio_core::capability::{CapabilityProfile, Tier};

/// Velocity magnitude cap for particle-field nodes, px per frame.
pub const PARTICLE_SPEED_CAP: f64 = 1.4;

/// Every effect folio knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    ParticleField,
    AmbientParticles,
    MatrixRain,
    GlitchText,
    Scanlines,
    Typewriter,
    Terminal,
    CursorGlow,
    Counter,
    CardTilt,
    Reveal,
    Graph,
}

impl EffectKind {
    pub const ALL: [EffectKind; 12] = [
        EffectKind::ParticleField,
        EffectKind::AmbientParticles,
        EffectKind::MatrixRain,
        EffectKind::GlitchText,
        EffectKind::Scanlines,
        EffectKind::Typewriter,
        EffectKind::Terminal,
        EffectKind::CursorGlow,
        EffectKind::Counter,
        EffectKind::CardTilt,
        EffectKind::Reveal,
        EffectKind::Graph,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParticleField => "particle-field",
            Self::AmbientParticles => "ambient-particles",
            Self::MatrixRain => "matrix-rain",
            Self::GlitchText => "glitch-text",
            Self::Scanlines => "scanlines",
            Self::Typewriter => "typewriter",
            Self::Terminal => "terminal",
            Self::CursorGlow => "cursor-glow",
            Self::Counter => "counter",
            Self::CardTilt => "card-tilt",
            Self::Reveal => "reveal",
            Self::Graph => "graph",
        }
    }

    /// Content effects degrade to a static rendering instead of disappearing.
    #[must_use]
    pub const fn carries_content(self) -> bool {
        matches!(
            self,
            Self::Typewriter | Self::Terminal | Self::Counter | Self::Reveal
        )
    }
}

bitflags! {
    /// Optional fidelity features.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EffectFeatures: u8 {
        /// Soft shadows/glow on drawn shapes.
        const SHADOWS = 0b0001;
        /// Lines from nearby items to the pointer.
        const POINTER_LINES = 0b0010;
        /// Pointer pushes items away.
        const POINTER_REPULSION = 0b0100;
        /// Additive glow on ambient dots.
        const GLOW = 0b1000;
    }
}

/// How an effect renders for a given profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    /// Inert; its element is hidden.
    #[default]
    Off,
    /// Final state shown once, nothing scheduled.
    Static,
    /// Fully animated.
    Animated,
}

/// Resolved parameters for one effect on one device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    pub kind: EffectKind,
    pub mode: RenderMode,
    pub target_fps: u32,
    /// Square pixels per item.
    pub density_divisor: f64,
    pub max_items: usize,
    /// Cell size for grid effects (matrix rain glyph size).
    pub cell_size: f64,
    pub connection_distance: f64,
    pub influence_radius: f64,
    pub speed_cap: f64,
    pub features: EffectFeatures,
}

impl EffectParams {
    const fn off(kind: EffectKind) -> Self {
        Self {
            kind,
            mode: RenderMode::Off,
            target_fps: 0,
            density_divisor: 0.0,
            max_items: 0,
            cell_size: 0.0,
            connection_distance: 0.0,
            influence_radius: 0.0,
            speed_cap: 0.0,
            features: EffectFeatures::empty(),
        }
    }

    const fn animated(kind: EffectKind, target_fps: u32) -> Self {
        Self {
            mode: RenderMode::Animated,
            target_fps,
            ..Self::off(kind)
        }
    }

    /// Resolve the parameters for `kind` on `profile`.
    #[must_use]
    pub fn resolve(profile: &CapabilityProfile, kind: EffectKind) -> Self {
        let reduced = profile.prefers_reduced_motion;
        let desktop = !profile.is_mobile_viewport;

        if kind.carries_content() {
            if reduced {
                return Self {
                    mode: RenderMode::Static,
                    ..Self::off(kind)
                };
            }
            let fps = if profile.tier == Tier::Low { 20 } else { 30 };
            return Self::animated(kind, fps);
        }

        if reduced {
            return Self::off(kind);
        }

        match (kind, profile.tier) {
            (_, Tier::Low) => Self::off(kind),

            (EffectKind::ParticleField, Tier::High) => {
                let mut features = EffectFeatures::SHADOWS;
                if desktop {
                    features |= EffectFeatures::POINTER_LINES | EffectFeatures::POINTER_REPULSION;
                }
                Self {
                    density_divisor: 12_000.0,
                    max_items: 90,
                    connection_distance: 140.0,
                    influence_radius: 150.0,
                    speed_cap: PARTICLE_SPEED_CAP,
                    features,
                    ..Self::animated(kind, 60)
                }
            }
            (EffectKind::ParticleField, Tier::Mid) => Self {
                density_divisor: 18_000.0,
                max_items: 40,
                connection_distance: 110.0,
                influence_radius: 120.0,
                speed_cap: PARTICLE_SPEED_CAP,
                features: if desktop {
                    EffectFeatures::POINTER_REPULSION
                } else {
                    EffectFeatures::empty()
                },
                ..Self::animated(kind, 30)
            },

            (EffectKind::AmbientParticles, Tier::High) => Self {
                density_divisor: 25_000.0,
                max_items: 60,
                speed_cap: 0.6,
                features: EffectFeatures::GLOW,
                ..Self::animated(kind, 30)
            },
            (EffectKind::AmbientParticles, Tier::Mid) => Self {
                density_divisor: 40_000.0,
                max_items: 25,
                speed_cap: 0.4,
                ..Self::animated(kind, 20)
            },

            (EffectKind::MatrixRain, Tier::High) => Self {
                cell_size: 14.0,
                max_items: 200,
                ..Self::animated(kind, 24)
            },
            (EffectKind::MatrixRain, Tier::Mid) => Self {
                cell_size: 18.0,
                max_items: 80,
                ..Self::animated(kind, 15)
            },

            (EffectKind::GlitchText, Tier::High) => Self::animated(kind, 12),
            (EffectKind::GlitchText, Tier::Mid) => Self::animated(kind, 8),

            (EffectKind::Graph, Tier::High) => Self {
                max_items: 24,
                connection_distance: 220.0,
                features: EffectFeatures::SHADOWS,
                ..Self::animated(kind, 30)
            },
            (EffectKind::Graph, Tier::Mid) => Self {
                max_items: 14,
                connection_distance: 200.0,
                ..Self::animated(kind, 15)
            },

            (EffectKind::Scanlines, Tier::High) => Self::animated(kind, 30),
            (EffectKind::Scanlines, Tier::Mid) => Self::off(kind),

            (EffectKind::CursorGlow | EffectKind::CardTilt, _) if !desktop => Self::off(kind),
            (EffectKind::CursorGlow | EffectKind::CardTilt, Tier::High) => Self::animated(kind, 60),
            (EffectKind::CursorGlow | EffectKind::CardTilt, Tier::Mid) => Self::animated(kind, 30),

            (
                EffectKind::Typewriter | EffectKind::Terminal | EffectKind::Counter | EffectKind::Reveal,
                _,
            ) => Self::animated(kind, 30),
        }
    }

    /// Scale item density. `scale > 1` packs more items (up to `max_items`).
    #[must_use]
    pub fn with_density_scale(mut self, scale: f64) -> Self {
        if scale.is_finite() && scale > 0.0 && self.density_divisor > 0.0 {
            self.density_divisor /= scale;
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.mode != RenderMode::Off
    }

    #[inline]
    #[must_use]
    pub fn is_animated(&self) -> bool {
        self.mode == RenderMode::Animated
    }
}
