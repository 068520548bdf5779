//! Property-based invariant tests for the rate-limited scheduler.
//!
//! 1. Consecutive invocations are never closer than the target interval.
//! 2. On a steady native tick the invocation count matches the expected
//!    cadence within one tick.
//! 3. Cancelled schedules are never invoked again, whatever the tick pattern.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use folio_runtime::scheduler::{Scheduler, frame_interval};
use proptest::prelude::*;

const NATIVE_TICK: Duration = Duration::from_micros(16_667);

fn record(sched: &mut Scheduler, fps: u32) -> Rc<RefCell<Vec<Duration>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    sched.register(fps, move |tick| s.borrow_mut().push(tick.now));
    seen
}

#[test]
fn thirty_fps_on_sixty_hz_ticks() {
    let mut sched = Scheduler::new();
    let seen = record(&mut sched, 30);
    for i in 0..600u32 {
        sched.tick(NATIVE_TICK * i);
    }
    let seen = seen.borrow();
    for pair in seen.windows(2) {
        assert!(pair[1] - pair[0] >= frame_interval(30));
    }
    // 10 seconds of ticks: at most 30 per second.
    assert!(seen.len() <= 301, "fired {} times", seen.len());
    assert!(seen.len() >= 199, "fired {} times", seen.len());
}

#[test]
fn independent_cadences_do_not_interfere() {
    let mut sched = Scheduler::new();
    let fast = record(&mut sched, 60);
    let slow = record(&mut sched, 15);
    for i in 0..120u32 {
        sched.tick(NATIVE_TICK * i);
    }
    assert_eq!(fast.borrow().len(), 120);
    let slow_count = slow.borrow().len();
    assert!((29..=31).contains(&slow_count), "slow fired {slow_count} times");
}

fn tick_gaps() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(1u64..=50_000, 1..400)
}

proptest! {
    #[test]
    fn never_exceeds_target_rate(fps in 1u32..=144, gaps in tick_gaps()) {
        let mut sched = Scheduler::new();
        let seen = record(&mut sched, fps);
        let mut now = Duration::ZERO;
        for gap in gaps {
            now += Duration::from_micros(gap);
            sched.tick(now);
        }
        let interval = frame_interval(fps);
        for pair in seen.borrow().windows(2) {
            prop_assert!(pair[1] - pair[0] >= interval);
        }
    }

    #[test]
    fn drift_bounded_by_one_tick(fps in 1u32..=60, ticks in 10u32..=600) {
        let mut sched = Scheduler::new();
        let seen = record(&mut sched, fps);
        for i in 0..ticks {
            sched.tick(NATIVE_TICK * i);
        }
        let interval = frame_interval(fps);
        for pair in seen.borrow().windows(2) {
            prop_assert!(pair[1] - pair[0] < interval + NATIVE_TICK);
        }
    }

    #[test]
    fn cancellation_is_final(cancel_at in 0usize..50, gaps in tick_gaps()) {
        let mut sched = Scheduler::new();
        let count = Rc::new(RefCell::new(0usize));
        let c = Rc::clone(&count);
        let handle = sched.register(60, move |_| *c.borrow_mut() += 1);
        let mut now = Duration::ZERO;
        let mut at_cancel = None;
        for (i, gap) in gaps.into_iter().enumerate() {
            if i == cancel_at {
                handle.cancel();
                at_cancel = Some(*count.borrow());
            }
            now += Duration::from_micros(gap);
            sched.tick(now);
        }
        if let Some(n) = at_cancel {
            prop_assert_eq!(*count.borrow(), n);
            prop_assert_eq!(sched.active_count(), 0);
        }
    }
}
