use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Sub};

/// A simple 2D vector in arena units (positions) or arena units per tick (velocities).
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    /// Creates a new Vec2.
    #[inline(always)]
    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    /// Euclidean length; does not overflow for large finite components.
    #[inline(always)]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    #[inline(always)]
    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    #[inline(always)]
    pub fn distance_squared(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    #[inline(always)]
    pub fn distance(self, other: Vec2) -> f32 {
        self.distance_squared(other).sqrt()
    }

    #[inline(always)]
    pub fn scale(self, scalar: f32) -> Self {
        Vec2 { x: self.x * scalar, y: self.y * scalar }
    }

    /// True when both components are finite (neither NaN nor infinite).
    #[inline(always)]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self { x: self.x + other.x, y: self.y + other.y }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self { x: self.x - other.x, y: self.y - other.y }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        self.scale(scalar)
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;
    fn div(self, scalar: f32) -> Self {
        // Callers guard against a zero divisor.
        Self { x: self.x / scalar, y: self.y / scalar }
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from((x, y): (f32, f32)) -> Self {
        Vec2::new(x, y)
    }
}

/// Clamps a value between a minimum and maximum, applying `max` first then `min`.
///
/// When `min > max` (an arena narrower than one atom) the result is `max`.
#[inline(always)]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Vec2::new(50.0, 200.0);
        let b = Vec2::new(60.0, 200.0);
        assert_eq!(a.distance(b), 10.0);
        assert_eq!(Vec2::new(3.0, 4.0).length(), 5.0);
    }

    #[test]
    fn length_stays_finite_for_huge_components() {
        let far = Vec2::new(3.0e19, 4.0e19);
        assert!((far.x * far.x + far.y * far.y).is_infinite());
        let length = far.length();
        assert!(length.is_finite());
        assert!((length / 5.0e19 - 1.0).abs() < 1e-6, "length {}", length);
    }

    #[test]
    fn operators_match_methods() {
        let a = Vec2::new(1.0, -2.0);
        let b = Vec2::new(0.5, 4.0);
        assert_eq!(a + b, Vec2::new(1.5, 2.0));
        assert_eq!(a - b, Vec2::new(0.5, -6.0));
        assert_eq!(a * 2.0, a.scale(2.0));
        assert_eq!(b / 0.5, Vec2::new(1.0, 8.0));
        let mut c = a;
        c += b;
        assert_eq!(c, a + b);
        assert_eq!(a.dot(b), 0.5 - 8.0);
    }

    #[test]
    fn clamp_applies_max_then_min() {
        assert_eq!(clamp(-3.0, 10.0, 390.0), 10.0);
        assert_eq!(clamp(500.0, 10.0, 390.0), 390.0);
        assert_eq!(clamp(42.0, 10.0, 390.0), 42.0);
    }
}
