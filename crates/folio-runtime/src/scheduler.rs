#![forbid(unsafe_code)]

//! Rate-limited frame scheduler.
//!
//! The host calls [`Scheduler::tick`] once per native display refresh. Each
//! registered callback runs at most at its own target frequency, independent
//! of the native rate:
//!
//! ```text
//! on tick(now):
//!   for entry in registration order:
//!     if entry.last is None or now - entry.last >= 1000/fps ms:
//!       invoke; entry.last = now
//! ```
//!
//! # Invariants
//!
//! 1. **Never faster than target**: two invocations of one entry are at least
//!    one interval apart. Drift is bounded by one native tick.
//! 2. **Registration order**: within one tick, entries fire in the order
//!    they were registered.
//! 3. **Cancellation is final**: once a [`ScheduleHandle`] is cancelled the
//!    callback is never invoked again and its entry is dropped on the next tick.
//!
//! Everything is single-threaded; handles share a flag with their entry via
//! `Rc<Cell<bool>>`.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use folio_core::clock::FrameTick;

/// Identifier for a scheduled callback, unique per scheduler.
pub type ScheduleId = u64;

/// Boxed draw callback.
pub type DrawCallback = Box<dyn FnMut(FrameTick)>;

/// Frame interval for a target frequency. `0` fps is treated as 1 fps.
#[must_use]
pub fn frame_interval(target_fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(target_fps.max(1)))
}

/// Caller-side handle to a scheduled callback.
///
/// Dropping the handle does not cancel the schedule; call [`cancel`](Self::cancel).
#[derive(Clone)]
pub struct ScheduleHandle {
    id: ScheduleId,
    target_fps: u32,
    cancelled: Rc<Cell<bool>>,
}

impl ScheduleHandle {
    #[must_use]
    pub fn id(&self) -> ScheduleId {
        self.id
    }

    #[must_use]
    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Stop the schedule. Idempotent.
    pub fn cancel(&self) {
        if !self.cancelled.replace(true) {
            tracing::debug!(schedule_id = self.id, "schedule cancelled");
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl fmt::Debug for ScheduleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleHandle")
            .field("id", &self.id)
            .field("target_fps", &self.target_fps)
            .field("cancelled", &self.cancelled.get())
            .finish()
    }
}

struct Entry {
    id: ScheduleId,
    interval: Duration,
    last: Option<Duration>,
    frame: u64,
    cancelled: Rc<Cell<bool>>,
    callback: DrawCallback,
}

/// Counts from one [`Scheduler::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Callbacks invoked this tick.
    pub fired: usize,
    /// Live callbacks skipped because their interval had not elapsed.
    pub skipped: usize,
    /// Cancelled entries dropped this tick.
    pub pruned: usize,
}

/// Drives draw callbacks at per-callback target frequencies.
#[derive(Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
    next_id: ScheduleId,
    ticks: u64,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` to run at most `target_fps` times per second.
    ///
    /// The first native tick after registration always invokes it.
    pub fn register<F>(&mut self, target_fps: u32, callback: F) -> ScheduleHandle
    where
        F: FnMut(FrameTick) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        let target_fps = target_fps.max(1);
        let cancelled = Rc::new(Cell::new(false));

        self.entries.push(Entry {
            id,
            interval: frame_interval(target_fps),
            last: None,
            frame: 0,
            cancelled: Rc::clone(&cancelled),
            callback: Box::new(callback),
        });
        tracing::debug!(schedule_id = id, target_fps, "schedule registered");

        ScheduleHandle {
            id,
            target_fps,
            cancelled,
        }
    }

    /// Process one native tick at host time `now`.
    pub fn tick(&mut self, now: Duration) -> TickReport {
        self.ticks += 1;
        let mut report = TickReport::default();

        report.pruned = self.prune();

        for entry in &mut self.entries {
            // A callback earlier in this tick may have cancelled a later one.
            if entry.cancelled.get() {
                continue;
            }
            let due = match entry.last {
                None => true,
                Some(last) => now.saturating_sub(last) >= entry.interval,
            };
            if !due {
                report.skipped += 1;
                continue;
            }
            let delta = entry.last.map_or(Duration::ZERO, |last| now.saturating_sub(last));
            let tick = FrameTick::new(now, delta, entry.frame);
            entry.last = Some(now);
            entry.frame += 1;
            (entry.callback)(tick);
            report.fired += 1;
        }

        tracing::trace!(
            tick = self.ticks,
            fired = report.fired,
            skipped = report.skipped,
            pruned = report.pruned,
            "scheduler tick"
        );
        report
    }

    /// Drop cancelled entries. Returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !e.cancelled.get());
        before - self.entries.len()
    }

    /// Number of registered, not-yet-cancelled callbacks.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.cancelled.get()).count()
    }

    /// Whether a schedule with `id` is still live.
    #[must_use]
    pub fn is_active(&self, id: ScheduleId) -> bool {
        self.entries
            .iter()
            .any(|e| e.id == id && !e.cancelled.get())
    }

    /// Native ticks processed so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Cancel and drop every schedule. Returns how many were live.
    pub fn cancel_all(&mut self) -> usize {
        let live = self.active_count();
        for entry in &self.entries {
            entry.cancelled.set(true);
        }
        self.entries.clear();
        tracing::debug!(cancelled = live, "all schedules cancelled");
        live
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("entries", &self.entries.len())
            .field("next_id", &self.next_id)
            .field("ticks", &self.ticks)
            .finish()
    }
}
