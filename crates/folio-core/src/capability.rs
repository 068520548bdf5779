#![forbid(unsafe_code)]

//! Device capability detection and performance tiers.
//!
//! The host reports a handful of environment signals once per session
//! ([`HostSignals`]); [`CapabilityProfile::detect`] classifies them into a
//! discrete [`Tier`] that every effect consults (through the resolver in
//! `folio-fx`) to pick density, cadence and feature flags.
//!
//! # Classification
//!
//! Evaluated in order, first match wins:
//!
//! | Tier | Condition |
//! |------|-----------|
//! | `Low` | reduced motion, OR cores <= 2, OR memory < 2 GB, OR (width < 768 AND cores <= 4) |
//! | `Mid` | cores <= 4, OR memory < 4 GB, OR width < 768 |
//! | `High` | everything else |
//!
//! # Invariants
//!
//! 1. **Pure**: the tier is a function of the other profile fields only.
//! 2. **Session-stable**: [`CapabilityProfile::session`] classifies once and
//!    returns the cached value afterwards. Viewport resizes recompute driver
//!    geometry, never the tier.
//! 3. **Safe defaults**: missing or nonsensical signals fall back to
//!    2 cores / 1 GB, which lands in `Low`.
//!
//! # Example
//!
//! ```
//! use folio_core::capability::{CapabilityProfile, HostSignals, Tier};
//!
//! let signals = HostSignals::new(1440.0).cores(8).memory_gb(8.0);
//! assert_eq!(CapabilityProfile::detect(&signals).tier, Tier::High);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::Deserialize;

/// Logical core count assumed when the host cannot report one.
pub const DEFAULT_LOGICAL_CORES: u32 = 2;

/// Memory estimate (GB) assumed when the host cannot report one.
pub const DEFAULT_MEMORY_GB: f64 = 1.0;

/// Viewport widths strictly below this are treated as mobile.
pub const MOBILE_BREAKPOINT_PX: f64 = 768.0;

/// Environment variable that pins the tier on native harnesses.
pub const FORCE_TIER_ENV: &str = "FOLIO_FORCE_TIER";

/// Discrete performance classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Decorative motion disabled.
    Low,
    /// Reduced density and cadence.
    Mid,
    /// Full fidelity.
    High,
}

impl Tier {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = crate::FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "mid" | "medium" => Ok(Self::Mid),
            "high" => Ok(Self::High),
            other => Err(crate::FolioError::Config(format!("unknown tier `{other}`"))),
        }
    }
}

/// Raw environment signals reported by the host page.
///
/// `None` means the host could not report the value.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSignals {
    pub logical_cores: Option<u32>,
    pub device_memory_gb: Option<f64>,
    pub viewport_width: f64,
    pub prefers_reduced_motion: bool,
    /// Pins the resulting tier (configuration / env override).
    pub forced_tier: Option<Tier>,
}

impl HostSignals {
    /// Signals for a viewport of `viewport_width` with nothing else reported.
    #[must_use]
    pub fn new(viewport_width: f64) -> Self {
        Self {
            logical_cores: None,
            device_memory_gb: None,
            viewport_width,
            prefers_reduced_motion: false,
            forced_tier: None,
        }
    }

    #[must_use]
    pub fn cores(mut self, cores: u32) -> Self {
        self.logical_cores = Some(cores);
        self
    }

    #[must_use]
    pub fn memory_gb(mut self, gb: f64) -> Self {
        self.device_memory_gb = Some(gb);
        self
    }

    #[must_use]
    pub fn reduced_motion(mut self, enabled: bool) -> Self {
        self.prefers_reduced_motion = enabled;
        self
    }

    #[must_use]
    pub fn force_tier(mut self, tier: Option<Tier>) -> Self {
        self.forced_tier = tier;
        self
    }

    /// Apply the `FOLIO_FORCE_TIER` environment override, if set and valid.
    ///
    /// Invalid values are ignored.
    #[must_use]
    pub fn with_env_override(self) -> Self {
        let raw = std::env::var(FORCE_TIER_ENV).ok();
        self.with_tier_override(raw.as_deref())
    }

    /// Pin the tier from a raw override value such as `"mid"`.
    ///
    /// `None` and unparseable values leave the signals unchanged.
    #[must_use]
    pub fn with_tier_override(mut self, raw: Option<&str>) -> Self {
        if let Some(raw) = raw {
            match raw.parse::<Tier>() {
                Ok(tier) => self.forced_tier = Some(tier),
                Err(_err) => {
                    crate::debug!(value = %raw, "ignoring invalid tier override");
                }
            }
        }
        self
    }

    fn resolved_cores(&self) -> u32 {
        match self.logical_cores {
            Some(0) | None => DEFAULT_LOGICAL_CORES,
            Some(n) => n,
        }
    }

    fn resolved_memory(&self) -> f64 {
        match self.device_memory_gb {
            Some(gb) if gb.is_finite() && gb > 0.0 => gb,
            _ => DEFAULT_MEMORY_GB,
        }
    }

    fn resolved_width(&self) -> f64 {
        if self.viewport_width.is_finite() && self.viewport_width > 0.0 {
            self.viewport_width
        } else {
            0.0
        }
    }
}

/// Immutable per-session device classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapabilityProfile {
    pub tier: Tier,
    pub is_mobile_viewport: bool,
    pub prefers_reduced_motion: bool,
    pub logical_core_count: u32,
    pub estimated_memory_gb: f64,
}

static SESSION_PROFILE: OnceLock<CapabilityProfile> = OnceLock::new();

impl CapabilityProfile {
    /// Classify host signals. Pure; see the module docs for the rule table.
    #[must_use]
    pub fn detect(signals: &HostSignals) -> Self {
        let cores = signals.resolved_cores();
        let memory = signals.resolved_memory();
        let is_mobile = signals.resolved_width() < MOBILE_BREAKPOINT_PX;
        let reduced = signals.prefers_reduced_motion;

        let tier = signals
            .forced_tier
            .unwrap_or_else(|| classify(cores, memory, is_mobile, reduced));

        let profile = Self {
            tier,
            is_mobile_viewport: is_mobile,
            prefers_reduced_motion: reduced,
            logical_core_count: cores,
            estimated_memory_gb: memory,
        };
        crate::debug!(
            tier = %profile.tier,
            cores = cores,
            memory_gb = memory,
            mobile = is_mobile,
            reduced_motion = reduced,
            "capability profile detected"
        );
        profile
    }

    /// Session-wide profile: classified on first call, cached afterwards.
    ///
    /// Later calls ignore `signals` and return the cached value.
    pub fn session(signals: &HostSignals) -> &'static Self {
        SESSION_PROFILE.get_or_init(|| Self::detect(signals))
    }

    /// The cached session profile, if one has been detected.
    #[must_use]
    pub fn cached() -> Option<&'static Self> {
        SESSION_PROFILE.get()
    }

    /// Whether decorative motion may run at all.
    #[inline]
    #[must_use]
    pub fn allows_motion(&self) -> bool {
        self.tier != Tier::Low && !self.prefers_reduced_motion
    }

    /// Budget phone on a narrow viewport.
    #[must_use]
    pub fn low_end_phone() -> Self {
        CapabilityProfileBuilder::new()
            .cores(4)
            .memory_gb(2.0)
            .viewport_width(390.0)
            .build()
    }

    /// Four-core laptop.
    #[must_use]
    pub fn mid_laptop() -> Self {
        CapabilityProfileBuilder::new()
            .cores(4)
            .memory_gb(8.0)
            .viewport_width(1366.0)
            .build()
    }

    /// Desktop with plenty of headroom.
    #[must_use]
    pub fn workstation() -> Self {
        CapabilityProfileBuilder::new()
            .cores(16)
            .memory_gb(8.0)
            .viewport_width(1920.0)
            .build()
    }
}

fn classify(cores: u32, memory_gb: f64, is_mobile: bool, reduced_motion: bool) -> Tier {
    if reduced_motion || cores <= 2 || memory_gb < 2.0 || (is_mobile && cores <= 4) {
        Tier::Low
    } else if cores <= 4 || memory_gb < 4.0 || is_mobile {
        Tier::Mid
    } else {
        Tier::High
    }
}

/// Builder for simulated profiles in tests and demos.
///
/// Goes through the same classification as [`CapabilityProfile::detect`].
#[derive(Debug, Clone)]
pub struct CapabilityProfileBuilder {
    signals: HostSignals,
}

impl Default for CapabilityProfileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityProfileBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            signals: HostSignals::new(1280.0),
        }
    }

    #[must_use]
    pub fn cores(mut self, cores: u32) -> Self {
        self.signals.logical_cores = Some(cores);
        self
    }

    #[must_use]
    pub fn memory_gb(mut self, gb: f64) -> Self {
        self.signals.device_memory_gb = Some(gb);
        self
    }

    #[must_use]
    pub fn viewport_width(mut self, width: f64) -> Self {
        self.signals.viewport_width = width;
        self
    }

    #[must_use]
    pub fn reduced_motion(mut self, enabled: bool) -> Self {
        self.signals.prefers_reduced_motion = enabled;
        self
    }

    #[must_use]
    pub fn build(self) -> CapabilityProfile {
        CapabilityProfile::detect(&self.signals)
    }
}
