#![forbid(unsafe_code)]

//! Geometric primitives.

/// A rectangle in board pixel space, used for bar bounds and hit testing.
///
/// Origin at top-left; `x` grows right, `y` grows down.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    /// Left edge (inclusive).
    pub x: f64,
    /// Top edge (inclusive).
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl PixelRect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge (alias for x).
    #[inline]
    pub const fn left(&self) -> f64 {
        self.x
    }

    /// Top edge (alias for y).
    #[inline]
    pub const fn top(&self) -> f64 {
        self.y
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Grow the rectangle horizontally by `dx` and vertically by `dy` on
    /// each side. Negative values shrink it, never below zero size.
    #[must_use]
    pub fn inflate(&self, dx: f64, dy: f64) -> Self {
        let width = (self.width + 2.0 * dx).max(0.0);
        let height = (self.height + 2.0 * dy).max(0.0);
        Self {
            x: self.x - dx,
            y: self.y - dy,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let r = PixelRect::new(10.0, 20.0, 30.0, 5.0);
        assert!(r.contains(10.0, 20.0));
        assert!(r.contains(39.9, 24.9));
        assert!(!r.contains(40.0, 22.0));
        assert!(!r.contains(20.0, 25.0));
    }

    #[test]
    fn inflate_grows_each_side() {
        let r = PixelRect::new(10.0, 10.0, 20.0, 10.0).inflate(4.0, 0.0);
        assert_eq!(r, PixelRect::new(6.0, 10.0, 28.0, 10.0));
        assert!(r.contains(7.0, 12.0));
    }

    #[test]
    fn inflate_negative_never_inverts() {
        let r = PixelRect::new(0.0, 0.0, 4.0, 4.0).inflate(-5.0, -5.0);
        assert!(r.is_empty());
        assert_eq!(r.width, 0.0);
    }
}
