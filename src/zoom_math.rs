//! Zoom-to-cursor mathematics.
//!
//! Each image canvas owns a [`Viewport`]: a discrete zoom level (an index into
//! [`ZOOM_SCALES`]) and the viewport position of the image's top-left corner.
//! All functions here are pure; callers replace their viewport with the
//! returned value.
//!
//! Image space is the original image pixel grid. Viewport space is the canvas
//! the image is drawn on:
//!
//! ```text
//! viewport = image * scale(zoom_index) + origin
//! ```

use crate::constants::{hit, marker, NEUTRAL_ZOOM_INDEX, ZOOM_SCALES};
use crate::model::Point;

/// Direction of a single zoom step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    /// One step up the scale table
    In,
    /// One step down the scale table
    Out,
}

impl ZoomDirection {
    /// Map a scroll-wheel delta to a direction (positive scrolls zoom in).
    pub fn from_scroll_delta(delta: f64) -> Self {
        if delta > 0.0 {
            ZoomDirection::In
        } else {
            ZoomDirection::Out
        }
    }
}

/// Pan/zoom state of one image canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    zoom_index: usize,
    origin: Point,
    image_width: u32,
    image_height: u32,
}

impl Viewport {
    /// Create a neutral viewport for an image of the given size.
    pub fn new(image_width: u32, image_height: u32) -> Self {
        Self {
            zoom_index: NEUTRAL_ZOOM_INDEX,
            origin: Point::default(),
            image_width,
            image_height,
        }
    }

    /// Create a viewport at an explicit zoom index and origin.
    ///
    /// The index is clamped to the scale table.
    pub fn with_state(image_width: u32, image_height: u32, zoom_index: usize, origin: Point) -> Self {
        Self {
            zoom_index: zoom_index.min(ZOOM_SCALES.len() - 1),
            origin,
            image_width,
            image_height,
        }
    }

    /// Index into [`ZOOM_SCALES`].
    pub fn zoom_index(&self) -> usize {
        self.zoom_index
    }

    /// Current scale factor.
    pub fn scale(&self) -> f64 {
        ZOOM_SCALES[self.zoom_index]
    }

    /// Viewport position of the image's top-left corner.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Source image size in pixels.
    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    /// Size of the image as drawn at zoom index `index`.
    ///
    /// Rendered images have whole-pixel dimensions, so the scaled size is truncated.
    pub fn rendered_size_at(&self, index: usize) -> (f64, f64) {
        let scale = ZOOM_SCALES[index];
        (
            (self.image_width as f64 * scale).floor(),
            (self.image_height as f64 * scale).floor(),
        )
    }

    /// Size of the image as currently drawn.
    pub fn rendered_size(&self) -> (f64, f64) {
        self.rendered_size_at(self.zoom_index)
    }

    /// Map an image point into viewport space.
    pub fn to_viewport(&self, image_point: Point) -> Point {
        let scale = self.scale();
        Point::new(
            image_point.x * scale + self.origin.x,
            image_point.y * scale + self.origin.y,
        )
    }

    /// Map a viewport point into image space without a bounds check.
    pub fn to_image_unchecked(&self, viewport_point: Point) -> Point {
        let scale = self.scale();
        Point::new(
            (viewport_point.x - self.origin.x) / scale,
            (viewport_point.y - self.origin.y) / scale,
        )
    }

    /// Map a viewport point into image space.
    ///
    /// Returns `None` when the point is not over the drawn image.
    pub fn to_image(&self, viewport_point: Point) -> Option<Point> {
        let (width, height) = self.rendered_size();
        let rel_x = viewport_point.x - self.origin.x;
        let rel_y = viewport_point.y - self.origin.y;

        if (0.0..width).contains(&rel_x) && (0.0..height).contains(&rel_y) {
            Some(self.to_image_unchecked(viewport_point))
        } else {
            None
        }
    }

    /// Zoom one step while keeping the image point under `anchor` fixed.
    ///
    /// At either end of the scale table this returns the viewport unchanged.
    pub fn zoom_at(&self, direction: ZoomDirection, anchor: Point) -> Viewport {
        let target = match direction {
            ZoomDirection::In if self.zoom_index + 1 < ZOOM_SCALES.len() => self.zoom_index + 1,
            ZoomDirection::Out if self.zoom_index > 0 => self.zoom_index - 1,
            _ => return *self,
        };
        self.zoom_to(target, anchor)
    }

    /// Jump to zoom index `index` (clamped), keeping the image point under `anchor` fixed.
    ///
    /// The anchor's offset from the image corner is scaled by the ratio of the
    /// new to the old scale factor. Rendered sizes are truncated to whole
    /// pixels, so they only bound hit tests and never feed the origin:
    ///
    /// ```text
    /// m = anchor - origin
    /// origin' = anchor - m * new_scale / old_scale
    /// ```
    pub fn zoom_to(&self, index: usize, anchor: Point) -> Viewport {
        let index = index.min(ZOOM_SCALES.len() - 1);
        if index == self.zoom_index {
            return *self;
        }

        let ratio = ZOOM_SCALES[index] / self.scale();
        let mouse_x = anchor.x - self.origin.x;
        let mouse_y = anchor.y - self.origin.y;

        Viewport {
            zoom_index: index,
            origin: Point::new(anchor.x - mouse_x * ratio, anchor.y - mouse_y * ratio),
            image_width: self.image_width,
            image_height: self.image_height,
        }
    }

    /// Apply a pan delta in viewport units. The image may leave the canvas entirely.
    pub fn pan_by(&self, dx: f64, dy: f64) -> Viewport {
        Viewport {
            origin: Point::new(self.origin.x + dx, self.origin.y + dy),
            ..*self
        }
    }

    /// Return to 1.0x with the image at the canvas corner.
    pub fn reset_to_neutral(&mut self) {
        self.zoom_index = NEUTRAL_ZOOM_INDEX;
        self.origin = Point::default();
    }

    /// Image-space readout for the cursor at `viewport_point`.
    pub fn cursor_readout(&self, viewport_point: Point) -> String {
        self.to_image_unchecked(viewport_point).readout()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// Hit radius in image pixels at zoom index `zoom_index`.
///
/// The radius shrinks as the user zooms in, down to a floor.
pub fn hit_threshold(zoom_index: usize) -> f64 {
    (hit::BASE_THRESHOLD - hit::THRESHOLD_STEP * zoom_index as f64).max(hit::MIN_THRESHOLD)
}

/// Index of the point closest to `click` within the hit radius.
///
/// On an exact distance tie the lowest index wins.
pub fn find_nearest<I>(click: Point, points: I, zoom_index: usize) -> Option<usize>
where
    I: IntoIterator<Item = Point>,
{
    let threshold = hit_threshold(zoom_index);
    let mut best: Option<(usize, f64)> = None;

    for (index, point) in points.into_iter().enumerate() {
        let dist = click.distance_to(&point);
        if dist <= threshold && best.is_none_or(|(_, best_dist)| dist < best_dist) {
            best = Some((index, dist));
        }
    }

    best.map(|(index, _)| index)
}

/// Marker size for a point drawn at zoom index `zoom_index`.
pub fn marker_size(zoom_index: usize, selected: bool) -> f64 {
    let extra = if selected { marker::SELECTED_EXTRA } else { 0.0 };
    let steps = zoom_index as f64 + 1.0 - NEUTRAL_ZOOM_INDEX as f64;
    (marker::BASE_SIZE + extra + marker::ZOOM_FACTOR * steps).max(marker::MIN_SIZE)
}

/// Diameter of a marker drawn at zoom index `zoom_index`.
pub fn marker_diameter(zoom_index: usize, selected: bool) -> f64 {
    1.0 + 2.0 * marker_size(zoom_index, selected)
}
