#![forbid(unsafe_code)]

//! Logging support.
//!
//! With the `tracing` feature `debug!` is re-exported from `tracing`; without
//! it a no-op macro of the same name keeps call sites compiling.
//! `tracing-json` adds [`init_json_subscriber`] for native harnesses.

#[cfg(feature = "tracing")]
pub use tracing::debug;

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// No-op debug macro when tracing is disabled.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }
}

/// Install a JSON `tracing` subscriber filtered by `RUST_LOG`.
///
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json_subscriber() -> bool {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .is_ok()
}

#[cfg(all(test, feature = "tracing-json"))]
mod tests {
    use super::*;

    #[test]
    fn json_subscriber_installs_once() {
        init_json_subscriber();
        assert!(!init_json_subscriber());
        debug!(target: "folio", tier = "high", "json logging ready");
    }
}
