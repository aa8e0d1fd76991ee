use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A point (or vector) in scene space. Scenes are laid out in the xy plane;
/// `z` only orders overlapping objects.
///
/// Serialized as `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Point3 = Point3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// A point in the z = 0 plane.
    pub const fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn lerp(&self, other: &Point3, t: f64) -> Point3 {
        *self + (*other - *self) * t
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(&self, other: &Point3) -> f64 {
        (*other - *self).length()
    }

    /// Midpoint between two points.
    pub fn midpoint(&self, other: &Point3) -> Point3 {
        self.lerp(other, 0.5)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Position a zero-sized item next to `self` in `direction`, `buff` away.
    pub fn next_to(&self, direction: Direction, buff: f64) -> Point3 {
        *self + direction.vector() * buff
    }
}

impl Add for Point3 {
    type Output = Point3;
    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;
    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3 {
    type Output = Point3;
    fn mul(self, rhs: f64) -> Point3 {
        Point3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Point3 {
    type Output = Point3;
    fn neg(self) -> Point3 {
        Point3::new(-self.x, -self.y, -self.z)
    }
}

impl From<[f64; 3]> for Point3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Point3::new(x, y, z)
    }
}

impl From<Point3> for [f64; 3] {
    fn from(p: Point3) -> Self {
        [p.x, p.y, p.z]
    }
}

impl std::fmt::Display for Point3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Screen direction, used for edges and relative placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit vector pointing in this direction.
    pub fn vector(&self) -> Point3 {
        match self {
            Direction::Up => Point3::xy(0.0, 1.0),
            Direction::Down => Point3::xy(0.0, -1.0),
            Direction::Left => Point3::xy(-1.0, 0.0),
            Direction::Right => Point3::xy(1.0, 0.0),
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_lerp() {
        let a = Point3::xy(0.0, 0.0);
        let b = Point3::xy(10.0, 20.0);
        let mid = a.lerp(&b, 0.5);
        assert!((mid.x - 5.0).abs() < 1e-9);
        assert!((mid.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_arithmetic() {
        let p = Point3::xy(1.0, 2.0) + Direction::Up.vector() * 2.0 - Point3::xy(1.0, 0.0);
        assert_eq!(p, Point3::xy(0.0, 4.0));
        assert_eq!(-p, Point3::xy(0.0, -4.0));
    }

    #[test]
    fn test_point_distance() {
        assert!((Point3::xy(0.0, 0.0).distance(&Point3::xy(3.0, 4.0)) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_next_to() {
        let p = Point3::xy(1.0, 1.0).next_to(Direction::Left, 0.5);
        assert_eq!(p, Point3::xy(0.5, 1.0));
    }

    #[test]
    fn test_point_serde_array() {
        let json = serde_json::to_string(&Point3::new(1.0, -2.5, 0.0)).unwrap();
        assert_eq!(json, "[1.0,-2.5,0.0]");
        let back: Point3 = serde_json::from_str("[2.0, 0.0, 1.0]").unwrap();
        assert_eq!(back, Point3::new(2.0, 0.0, 1.0));
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Up.opposite(), Direction::Down);
        assert_eq!(Direction::Left.opposite().vector(), Point3::xy(1.0, 0.0));
    }
}
