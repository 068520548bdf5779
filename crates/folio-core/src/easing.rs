#![forbid(unsafe_code)]

//! Easing curves mapping `t` in [0, 1] to [0, 1].

/// Cubic ease-out (fast start, slow end).
#[inline]
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Exponential smoothing factor for a per-frame lerp of `rate` at 60 fps,
/// corrected for an arbitrary frame delta in seconds.
#[inline]
pub fn frame_lerp_factor(rate: f64, delta_seconds: f64) -> f64 {
    let rate = rate.clamp(0.0, 1.0);
    if delta_seconds <= 0.0 {
        return rate;
    }
    1.0 - (1.0 - rate).powf(delta_seconds * 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_cubic(2.0), 1.0);
        assert_eq!(ease_out_cubic(-1.0), 0.0);
        assert!(ease_out_cubic(0.5) > 0.5);
    }

    #[test]
    fn lerp_factor_matches_rate_at_60fps() {
        assert!((frame_lerp_factor(0.1, 1.0 / 60.0) - 0.1).abs() < 1e-9);
        assert!(frame_lerp_factor(0.1, 2.0 / 60.0) > 0.1);
    }
}
