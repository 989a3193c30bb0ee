//! Data models for the pair tagging tool.

mod point;
mod tag;

pub use point::Point;
pub use tag::TagPair;

/// Which image of a pair an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// First image of the pair (`_1` suffix)
    Left,
    /// Second image of the pair (`_2` suffix)
    Right,
}

impl Side {
    /// The twin side.
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Array index for per-side storage.
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    /// Get the display name for this side.
    pub fn name(self) -> &'static str {
        match self {
            Side::Left => "Image 1",
            Side::Right => "Image 2",
        }
    }
}
