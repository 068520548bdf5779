#![forbid(unsafe_code)]

//! Page runtime for folio.
//!
//! [`FolioPage`] is the host-facing entry point: it classifies the device
//! once, queues every effect into its lifecycle phase, and forwards frames,
//! resizes and pointer input. It runs natively (tests, headless harnesses)
//! and on wasm32, where [`FolioWeb`] binds it to the DOM.

pub mod config;
pub mod page;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use config::FxConfig;
pub use page::{Anchor, AnchorId, FolioPage, FrameReport, PerfSignal};

#[cfg(target_arch = "wasm32")]
pub use wasm::FolioWeb;

/// Native builds compile this crate as a stub so `cargo check --workspace` stays
/// green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct FolioWeb;

#[cfg(not(target_arch = "wasm32"))]
impl FolioWeb {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }
}
