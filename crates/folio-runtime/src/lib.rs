#![forbid(unsafe_code)]

//! Runtime: rate-limited frame scheduling and the phased effect lifecycle.
//!
//! Both pieces are host-driven. The embedding page forwards its native
//! per-frame timestamp to [`Scheduler::tick`] and [`Orchestrator::poll`];
//! nothing here spawns threads or reads a clock.

pub mod orchestrator;
pub mod scheduler;

pub use orchestrator::{InitContext, Orchestrator, Phase, PhaseTiming, PollReport};
pub use scheduler::{ScheduleHandle, ScheduleId, Scheduler, TickReport, frame_interval};
