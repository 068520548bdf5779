//! Property-based invariant tests for the canvas drivers.
//!
//! 1. Node speed never exceeds the cap, whatever the pointer does.
//! 2. Nodes stay inside the viewport.
//! 3. Item count depends only on the viewport area (resize is idempotent).
//! 4. Matrix rain keeps one drop per column across frames.

use std::time::Duration;

use folio_core::capability::CapabilityProfile;
use folio_core::clock::FrameTick;
use folio_core::geometry::{Point, Viewport};
use folio_core::rng::XorShift;
use folio_fx::particle_field::ParticleField;
use folio_fx::resolver::PARTICLE_SPEED_CAP;
use folio_fx::{Effect, MatrixRain, PointerEvent, RecordingSurface};
use proptest::prelude::*;

fn pointer_strategy() -> impl Strategy<Value = PointerEvent> {
    prop_oneof![
        4 => (-50.0f64..1100.0, -50.0f64..800.0).prop_map(|(x, y)| PointerEvent::Move(Point::new(x, y))),
        1 => Just(PointerEvent::Leave),
    ]
}

fn viewport_strategy() -> impl Strategy<Value = Viewport> {
    (0.0f64..2560.0, 0.0f64..1600.0).prop_map(|(w, h)| Viewport::new(w, h))
}

fn tick(frame: u64) -> FrameTick {
    FrameTick::new(Duration::from_millis(frame * 16), Duration::from_millis(16), frame)
}

proptest! {
    #[test]
    fn speed_never_exceeds_cap(
        seed in any::<u64>(),
        events in prop::collection::vec(pointer_strategy(), 1..60),
    ) {
        let vp = Viewport::new(1024.0, 768.0);
        let mut field = ParticleField::mount(
            &CapabilityProfile::workstation(),
            Some(RecordingSurface::new()),
            vp,
            XorShift::new(seed),
        )
        .active()
        .expect("high tier mounts");

        for (frame, event) in events.into_iter().enumerate() {
            field.pointer(event);
            field.draw(tick(frame as u64));
            for node in field.nodes() {
                prop_assert!(node.speed() <= PARTICLE_SPEED_CAP + 1e-9, "speed {}", node.speed());
                prop_assert!(vp.contains(node.pos), "escaped {:?}", node.pos);
            }
        }
    }

    #[test]
    fn resize_is_idempotent(seed in any::<u64>(), vp in viewport_strategy()) {
        let mut field = ParticleField::mount(
            &CapabilityProfile::workstation(),
            Some(RecordingSurface::new()),
            Viewport::new(800.0, 600.0),
            XorShift::new(seed),
        )
        .active()
        .expect("high tier mounts");

        field.resize(vp);
        let first = field.nodes().len();
        field.resize(vp);
        prop_assert_eq!(field.nodes().len(), first);
        prop_assert_eq!(first, vp.density_count(12_000.0, 90));
    }

    #[test]
    fn matrix_keeps_one_drop_per_column(seed in any::<u64>(), vp in viewport_strategy(), frames in 1usize..200) {
        let mut rain = MatrixRain::mount(
            &CapabilityProfile::workstation(),
            Some(RecordingSurface::new()),
            vp,
            XorShift::new(seed),
        )
        .active()
        .expect("high tier mounts");
        let columns = rain.column_count();
        for frame in 0..frames {
            rain.draw(tick(frame as u64));
        }
        prop_assert_eq!(rain.drops().len(), columns);
    }
}
