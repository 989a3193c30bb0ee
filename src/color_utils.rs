//! Color utility functions shared across the application.
//!
//! This module provides color conversion and the tag palette, a fixed-size
//! rainbow running from red to magenta.

use std::fmt;

/// Hue of the first palette entry, in degrees (red).
const PALETTE_START_HUE: f64 = 0.0;

/// Hue of the last palette entry, in degrees (magenta).
const PALETTE_END_HUE: f64 = 300.0;

/// Convert HSV to RGB.
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `v` - Value/brightness (0.0-1.0)
///
/// # Returns
/// RGB tuple with values in range 0.0-1.0
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// Black, used for pending point markers.
    pub const BLACK: Rgb = Rgb([0, 0, 0]);
    /// White, used for the selected and pending marker outline.
    pub const WHITE: Rgb = Rgb([255, 255, 255]);

    /// Convert from unit-range channels, truncating toward zero.
    pub fn from_unit(r: f64, g: f64, b: f64) -> Self {
        let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0) as u8;
        Rgb([channel(r), channel(g), channel(b)])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

/// Fixed-size color palette for tags. Tag `i` uses entry `i mod len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Generate `size` evenly spaced fully saturated hues from red to magenta.
    ///
    /// A size of zero is treated as one.
    pub fn rainbow(size: usize) -> Self {
        let size = size.max(1);
        let colors = (0..size)
            .map(|i| {
                let t = if size == 1 {
                    0.0
                } else {
                    i as f64 / (size - 1) as f64
                };
                let hue = PALETTE_START_HUE + (PALETTE_END_HUE - PALETTE_START_HUE) * t;
                let (r, g, b) = hsv_to_rgb(hue, 1.0, 1.0);
                Rgb::from_unit(r, g, b)
            })
            .collect();
        Self { colors }
    }

    /// Number of distinct colors.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; a palette holds at least one color.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color for the tag at `index`.
    pub fn color_for(&self, index: usize) -> Rgb {
        self.colors[index % self.colors.len()]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::rainbow(crate::constants::DEFAULT_PALETTE_SIZE)
    }
}
