#![forbid(unsafe_code)]

//! Phased effect lifecycle.
//!
//! Effect construction is split into three phases so that expensive setup
//! never competes with first paint:
//!
//! | Phase | Opens | Typical work |
//! |-------|-------|--------------|
//! | [`Phase::Immediate`] | at [`Orchestrator::start`] | navigation, typewriter, terminal, cursor glow |
//! | [`Phase::Deferred`] | `deferred_delay` after start (200 ms) | canvas effects: matrix rain, particle field, glitch |
//! | [`Phase::Idle`] | host idle signal, or `idle_fallback` (500 ms) without one | counters, skill bars, tilt, scanlines |
//!
//! Phases open strictly in that order: an idle signal that arrives before the
//! deferred delay is remembered and honoured right after the deferred phase.
//! There is no barrier on animation progress; a later phase may start while
//! earlier effects are still warming up.
//!
//! Every [`ScheduleHandle`] created through an [`InitContext`] is retained,
//! and [`Orchestrator::teardown`] cancels all of them.

use std::fmt;
use std::time::Duration;

use folio_core::clock::FrameTick;

use crate::scheduler::{ScheduleHandle, Scheduler};

/// Delay before the deferred phase opens.
pub const DEFAULT_DEFERRED_DELAY: Duration = Duration::from_millis(200);
/// Idle phase fallback when the host has no idle-callback facility.
pub const DEFAULT_IDLE_FALLBACK: Duration = Duration::from_millis(500);
/// Upper bound on waiting for an idle signal when the host has one.
pub const DEFAULT_IDLE_DEADLINE: Duration = Duration::from_millis(2000);

/// Construction phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Immediate,
    Deferred,
    Idle,
}

impl Phase {
    /// All phases in opening order.
    pub const ALL: [Phase; 3] = [Phase::Immediate, Phase::Deferred, Phase::Idle];

    const fn index(self) -> usize {
        match self {
            Self::Immediate => 0,
            Self::Deferred => 1,
            Self::Idle => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Deferred => "deferred",
            Self::Idle => "idle",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase gate timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTiming {
    pub deferred_delay: Duration,
    pub idle_fallback: Duration,
    pub idle_deadline: Duration,
    /// Whether the host will call [`Orchestrator::notify_idle`].
    pub idle_supported: bool,
}

impl Default for PhaseTiming {
    fn default() -> Self {
        Self {
            deferred_delay: DEFAULT_DEFERRED_DELAY,
            idle_fallback: DEFAULT_IDLE_FALLBACK,
            idle_deadline: DEFAULT_IDLE_DEADLINE,
            idle_supported: false,
        }
    }
}

/// Handed to initializers while their phase runs.
pub struct InitContext<'a> {
    scheduler: &'a mut Scheduler,
    handles: &'a mut Vec<ScheduleHandle>,
    phase: Phase,
    now: Duration,
    label: &'static str,
}

impl InitContext<'_> {
    /// Register a draw callback; the orchestrator retains the handle.
    pub fn register<F>(&mut self, target_fps: u32, callback: F) -> ScheduleHandle
    where
        F: FnMut(FrameTick) + 'static,
    {
        let handle = self.scheduler.register(target_fps, callback);
        tracing::debug!(
            effect = self.label,
            phase = %self.phase,
            schedule_id = handle.id(),
            target_fps,
            "effect scheduled"
        );
        self.handles.push(handle.clone());
        handle
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Host time at which the phase ran.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }
}

type Initializer = Box<dyn FnOnce(&mut InitContext<'_>)>;

struct Pending {
    label: &'static str,
    init: Initializer,
}

/// Effects started by one [`Orchestrator::poll`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    /// `(phase, label)` in execution order.
    pub ran: Vec<(Phase, &'static str)>,
}

impl PollReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ran.is_empty()
    }
}

/// Decides when each queued effect initializer runs and owns teardown.
pub struct Orchestrator {
    timing: PhaseTiming,
    started_at: Option<Duration>,
    opened: usize,
    idle_signalled: bool,
    queues: [Vec<Pending>; 3],
    handles: Vec<ScheduleHandle>,
    torn_down: bool,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(PhaseTiming::default())
    }
}

impl Orchestrator {
    #[must_use]
    pub fn new(timing: PhaseTiming) -> Self {
        Self {
            timing,
            started_at: None,
            opened: 0,
            idle_signalled: false,
            queues: [Vec::new(), Vec::new(), Vec::new()],
            handles: Vec::new(),
            torn_down: false,
        }
    }

    #[must_use]
    pub fn timing(&self) -> PhaseTiming {
        self.timing
    }

    /// Queue an initializer for `phase`. Ignored after teardown.
    ///
    /// Enqueuing into a phase that has already opened runs it on the next poll.
    pub fn enqueue<F>(&mut self, phase: Phase, label: &'static str, init: F)
    where
        F: FnOnce(&mut InitContext<'_>) + 'static,
    {
        if self.torn_down {
            tracing::debug!(effect = label, "enqueue after teardown ignored");
            return;
        }
        self.queues[phase.index()].push(Pending {
            label,
            init: Box::new(init),
        });
    }

    /// Mark the page start and run the immediate phase.
    ///
    /// A second call is a no-op apart from polling.
    pub fn start(&mut self, now: Duration, scheduler: &mut Scheduler) -> PollReport {
        if self.started_at.is_none() && !self.torn_down {
            self.started_at = Some(now);
            tracing::info!(start = ?now, "lifecycle started");
        }
        self.poll(now, scheduler)
    }

    /// Record the host's idle callback.
    pub fn notify_idle(&mut self) {
        self.idle_signalled = true;
    }

    /// Open any phases whose gate has passed and run their queued initializers.
    pub fn poll(&mut self, now: Duration, scheduler: &mut Scheduler) -> PollReport {
        let mut report = PollReport::default();
        let Some(start) = self.started_at else {
            return report;
        };
        if self.torn_down {
            return report;
        }

        while self.opened < Phase::ALL.len() && self.gate_open(Phase::ALL[self.opened], start, now)
        {
            tracing::debug!(phase = %Phase::ALL[self.opened], "phase opened");
            self.opened += 1;
        }

        for phase in Phase::ALL.iter().take(self.opened).copied() {
            let pending = std::mem::take(&mut self.queues[phase.index()]);
            for Pending { label, init } in pending {
                let mut ctx = InitContext {
                    scheduler: &mut *scheduler,
                    handles: &mut self.handles,
                    phase,
                    now,
                    label,
                };
                init(&mut ctx);
                report.ran.push((phase, label));
            }
        }
        report
    }

    fn gate_open(&self, phase: Phase, start: Duration, now: Duration) -> bool {
        let elapsed = now.saturating_sub(start);
        match phase {
            Phase::Immediate => true,
            Phase::Deferred => elapsed >= self.timing.deferred_delay,
            Phase::Idle if self.timing.idle_supported => {
                self.idle_signalled || elapsed >= self.timing.idle_deadline
            }
            Phase::Idle => elapsed >= self.timing.idle_fallback,
        }
    }

    /// Whether `phase` has opened.
    #[must_use]
    pub fn is_open(&self, phase: Phase) -> bool {
        phase.index() < self.opened
    }

    /// Initializers still waiting, across all phases.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.queues.iter().map(Vec::len).sum()
    }

    /// Every handle created through this orchestrator.
    #[must_use]
    pub fn handles(&self) -> &[ScheduleHandle] {
        &self.handles
    }

    /// Handles not yet cancelled.
    #[must_use]
    pub fn live_handle_count(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_cancelled()).count()
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Cancel every retained handle and drop pending initializers.
    ///
    /// Returns the number of handles this call cancelled. Idempotent.
    pub fn teardown(&mut self, scheduler: &mut Scheduler) -> usize {
        let mut cancelled = 0;
        for handle in self.handles.drain(..) {
            if !handle.is_cancelled() {
                handle.cancel();
                cancelled += 1;
            }
        }
        let dropped = self.pending_count();
        for queue in &mut self.queues {
            queue.clear();
        }
        scheduler.prune();
        if !self.torn_down {
            tracing::info!(cancelled, dropped_pending = dropped, "lifecycle torn down");
        }
        self.torn_down = true;
        cancelled
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("timing", &self.timing)
            .field("started_at", &self.started_at)
            .field("opened", &self.opened)
            .field("idle_signalled", &self.idle_signalled)
            .field("pending", &self.pending_count())
            .field("handles", &self.handles.len())
            .field("torn_down", &self.torn_down)
            .finish()
    }
}
