#![forbid(unsafe_code)]

//! Viewport and point primitives in CSS pixels.

/// Drawable viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Create a viewport. Negative or non-finite dimensions collapse to zero.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: sanitize(width),
            height: sanitize(height),
        }
    }

    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Clamp a point into `[0, width] x [0, height]`.
    #[inline]
    #[must_use]
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.width && p.y <= self.height
    }

    /// Number of items for this area at one item per `divisor` square pixels,
    /// capped at `max_items`.
    #[must_use]
    pub fn density_count(&self, divisor: f64, max_items: usize) -> usize {
        if self.is_empty() || divisor.is_nan() || divisor <= 0.0 {
            return 0;
        }
        let raw = (self.area() / divisor).floor();
        if raw >= max_items as f64 {
            max_items
        } else {
            raw as usize
        }
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

/// A 2D point or vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Position far outside any realistic viewport.
    ///
    /// Used as the "no pointer" marker so stale positions never influence items.
    pub const FAR_AWAY: Self = Self {
        x: -100_000.0,
        y: -100_000.0,
    };

    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[inline]
    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_count_floors_and_caps() {
        let vp = Viewport::new(1024.0, 768.0);
        assert_eq!(vp.density_count(12_000.0, 90), 65);
        assert_eq!(vp.density_count(12_000.0, 40), 40);
        assert_eq!(vp.density_count(0.0, 40), 0);
        assert_eq!(Viewport::new(0.0, 768.0).density_count(12_000.0, 90), 0);
    }

    #[test]
    fn invalid_dimensions_collapse() {
        let vp = Viewport::new(-5.0, f64::NAN);
        assert!(vp.is_empty());
        assert_eq!(vp.area(), 0.0);
    }

    #[test]
    fn clamp_and_contains() {
        let vp = Viewport::new(100.0, 50.0);
        assert_eq!(vp.clamp(Point::new(-3.0, 70.0)), Point::new(0.0, 50.0));
        assert!(vp.contains(Point::new(100.0, 0.0)));
        assert!(!vp.contains(Point::FAR_AWAY));
    }

    #[test]
    fn distance_is_euclidean() {
        assert_eq!(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0);
    }
}
