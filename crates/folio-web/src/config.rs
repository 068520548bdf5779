#![forbid(unsafe_code)]

//! Page configuration supplied by the host as JSON.
//!
//! Every field is optional; omitted fields take the defaults below. Unknown
//! fields are rejected so typos surface instead of silently doing nothing.

use std::time::Duration;

use folio_core::capability::Tier;
use folio_core::error::FolioError;
use folio_core::rng::DEFAULT_SEED;
use folio_fx::terminal::{TerminalLine, default_script};
use folio_runtime::orchestrator::{
    DEFAULT_DEFERRED_DELAY, DEFAULT_IDLE_DEADLINE, DEFAULT_IDLE_FALLBACK, PhaseTiming,
};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FxConfig {
    /// Seed for every randomised effect.
    pub seed: u64,
    /// Pin the tier instead of detecting it.
    pub force_tier: Option<Tier>,
    pub deferred_delay_ms: u64,
    pub idle_fallback_ms: u64,
    pub idle_deadline_ms: u64,
    /// Whether the host will report idle time.
    pub idle_supported: bool,
    /// Multiplier on item density for the particle effects.
    pub density_scale: f64,
    pub typewriter_phrases: Vec<String>,
    pub terminal_script: Vec<TerminalLine>,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            force_tier: None,
            deferred_delay_ms: DEFAULT_DEFERRED_DELAY.as_millis() as u64,
            idle_fallback_ms: DEFAULT_IDLE_FALLBACK.as_millis() as u64,
            idle_deadline_ms: DEFAULT_IDLE_DEADLINE.as_millis() as u64,
            idle_supported: false,
            density_scale: 1.0,
            typewriter_phrases: vec![
                "Systems Engineer".to_owned(),
                "Rust Developer".to_owned(),
                "Open Source Contributor".to_owned(),
            ],
            terminal_script: default_script(),
        }
    }
}

impl FxConfig {
    /// Parse and validate host JSON.
    pub fn from_json(json: &str) -> Result<Self, FolioError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no effect can run with.
    pub fn validate(&self) -> Result<(), FolioError> {
        if !self.density_scale.is_finite() || self.density_scale <= 0.0 {
            return Err(FolioError::Config(format!(
                "density_scale must be a positive number, got {}",
                self.density_scale
            )));
        }
        if self.idle_supported && self.idle_deadline_ms < self.deferred_delay_ms {
            return Err(FolioError::Config(format!(
                "idle_deadline_ms ({}) is shorter than deferred_delay_ms ({})",
                self.idle_deadline_ms, self.deferred_delay_ms
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn phase_timing(&self) -> PhaseTiming {
        PhaseTiming {
            deferred_delay: Duration::from_millis(self.deferred_delay_ms),
            idle_fallback: Duration::from_millis(self.idle_fallback_ms),
            idle_deadline: Duration::from_millis(self.idle_deadline_ms),
            idle_supported: self.idle_supported,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_fx::terminal::LineStyle;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(FxConfig::from_json("{}").expect("valid"), FxConfig::default());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = FxConfig::from_json(
            r#"{
                "seed": 7,
                "force_tier": "mid",
                "idle_supported": true,
                "terminal_script": [{"text": "ls", "style": "command"}]
            }"#,
        )
        .expect("valid");
        assert_eq!(config.seed, 7);
        assert_eq!(config.force_tier, Some(Tier::Mid));
        assert_eq!(config.density_scale, 1.0);
        assert_eq!(config.terminal_script.len(), 1);
        assert_eq!(config.terminal_script[0].style, LineStyle::Command);
        let timing = config.phase_timing();
        assert!(timing.idle_supported);
        assert_eq!(timing.deferred_delay, Duration::from_millis(200));
        assert_eq!(timing.idle_deadline, Duration::from_millis(2000));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = FxConfig::from_json("{ seed: ").expect_err("not json");
        assert!(matches!(err, FolioError::Config(_)));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = FxConfig::from_json(r#"{"densty_scale": 2.0}"#).expect_err("typo");
        assert!(err.to_string().contains("densty_scale"));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(FxConfig::from_json(r#"{"density_scale": 0}"#).is_err());
        assert!(FxConfig::from_json(r#"{"force_tier": "ultra"}"#).is_err());
        assert!(
            FxConfig::from_json(r#"{"idle_supported": true, "idle_deadline_ms": 100}"#).is_err()
        );
    }
}
