//! Image-space point type.

use serde::{Deserialize, Serialize};

/// A 2D point in image coordinates (sub-pixel).
///
/// Serializes as a two-element `[x, y]` array.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Coordinates rounded half-to-even for display.
    pub fn rounded(&self) -> (i64, i64) {
        (
            self.x.round_ties_even() as i64,
            self.y.round_ties_even() as i64,
        )
    }

    /// One-decimal readout, e.g. `"12.5, 40.0"`.
    pub fn readout(&self) -> String {
        format!("{:.1}, {:.1}", self.x, self.y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(point: Point) -> Self {
        [point.x, point.y]
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        assert_eq!(Point::new(2.5, 3.5).rounded(), (2, 4));
        assert_eq!(Point::new(-0.4, 10.6).rounded(), (0, 11));
    }

    #[test]
    fn test_serializes_as_array() {
        let json = serde_json::to_string(&Point::new(1.5, 2.0)).unwrap();
        assert_eq!(json, "[1.5,2.0]");

        let point: Point = serde_json::from_str("[3, 4]").unwrap();
        assert_eq!(point, Point::new(3.0, 4.0));
    }

    #[test]
    fn test_readout() {
        assert_eq!(Point::new(12.345, 7.0).readout(), "12.3, 7.0");
    }
}
