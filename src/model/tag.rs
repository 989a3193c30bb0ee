//! Tag pair data model.
//!
//! A tag pair is one confirmed correspondence: a point on the left image and
//! the matching point on the right image. Its position in the pair's tag list
//! is its identity.

use serde::{Deserialize, Serialize};

use super::{Point, Side};

/// One correspondence between the two images of a pair.
///
/// Serializes as `[[x0, y0], [x1, y1]]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[Point; 2]", into = "[Point; 2]")]
pub struct TagPair {
    /// Point on the left image
    pub left: Point,
    /// Point on the right image
    pub right: Point,
}

impl TagPair {
    /// Create a new tag pair.
    pub fn new(left: Point, right: Point) -> Self {
        Self { left, right }
    }

    /// Get the point on the given side.
    pub fn point(&self, side: Side) -> Point {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// Tag list label for the tag at `index`, e.g. `"1. [10,20] - [30,40]"`.
    pub fn label(&self, index: usize) -> String {
        let (x0, y0) = self.left.rounded();
        let (x1, y1) = self.right.rounded();
        format!("{}. [{},{}] - [{},{}]", index + 1, x0, y0, x1, y1)
    }
}

impl From<[Point; 2]> for TagPair {
    fn from([left, right]: [Point; 2]) -> Self {
        Self { left, right }
    }
}

impl From<TagPair> for [Point; 2] {
    fn from(tag: TagPair) -> Self {
        [tag.left, tag.right]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_is_one_based_and_rounded() {
        let tag = TagPair::new(Point::new(10.4, 19.6), Point::new(30.5, 41.5));
        assert_eq!(tag.label(0), "1. [10,20] - [30,42]");
        assert_eq!(tag.label(9), "10. [10,20] - [30,42]");
    }

    #[test]
    fn test_point_by_side() {
        let tag = TagPair::new(Point::new(1.0, 2.0), Point::new(3.0, 4.0));
        assert_eq!(tag.point(Side::Left), Point::new(1.0, 2.0));
        assert_eq!(tag.point(Side::Right), Point::new(3.0, 4.0));
    }

    #[test]
    fn test_serialized_shape() {
        let tag = TagPair::new(Point::new(1.0, 2.5), Point::new(3.0, 4.0));
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, "[[1.0,2.5],[3.0,4.0]]");

        let parsed: TagPair = serde_json::from_str("[[1, 2.5], [3, 4]]").unwrap();
        assert_eq!(parsed, tag);
    }
}
