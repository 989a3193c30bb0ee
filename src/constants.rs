//! Global constants for the pair tagging tool

/// Discrete zoom levels, ascending. Viewports index into this table.
pub const ZOOM_SCALES: [f64; 11] = [0.3, 0.5, 0.7, 0.85, 1.0, 1.5, 2.1, 3.0, 4.5, 6.5, 9.0];

/// Index of the 1.0x entry in [`ZOOM_SCALES`].
pub const NEUTRAL_ZOOM_INDEX: usize = 4;

/// Number of distinct tag colors before the palette repeats.
pub const DEFAULT_PALETTE_SIZE: usize = 10;

/// Default image extensions considered when listing a folder (lowercase, without dots).
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Filename suffix (before the extension) of the left image of a pair.
pub const LEFT_SUFFIX: &str = "_1";

/// Filename suffix (before the extension) of the right image of a pair.
pub const RIGHT_SUFFIX: &str = "_2";

/// Default interval between periodic saves, in milliseconds.
pub const DEFAULT_SAVE_INTERVAL_MS: u64 = 2000;

/// Default interval between cursor polls, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Nearest-point hit testing.
pub mod hit {
    /// Search radius at zoom index 0, in image pixels.
    pub const BASE_THRESHOLD: f64 = 10.0;
    /// Radius reduction per zoom step.
    pub const THRESHOLD_STEP: f64 = 1.5;
    /// The radius never shrinks below this.
    pub const MIN_THRESHOLD: f64 = 3.0;
}

/// Point marker sizing, in viewport pixels.
pub mod marker {
    /// Marker size at the neutral zoom minus one step.
    pub const BASE_SIZE: f64 = 3.0;
    /// Extra size for the selected tag.
    pub const SELECTED_EXTRA: f64 = 2.0;
    /// Growth per zoom step.
    pub const ZOOM_FACTOR: f64 = 2.0;
    /// Markers never shrink below this.
    pub const MIN_SIZE: f64 = 0.5;
    /// Outline stroke width.
    pub const OUTLINE_WIDTH: f64 = 1.0;
}
