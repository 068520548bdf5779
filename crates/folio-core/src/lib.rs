#![forbid(unsafe_code)]

//! Core: device capability tiers, host-driven time, geometry and errors.

pub mod capability;
pub mod clock;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod rng;

pub use capability::{CapabilityProfile, CapabilityProfileBuilder, HostSignals, Tier};
pub use clock::{DeterministicClock, FrameTick, HostClock};
pub use error::FolioError;
pub use geometry::{Point, Viewport};

#[cfg(feature = "tracing")]
pub use logging::debug;
