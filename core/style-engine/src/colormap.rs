//! FILENAME: core/style-engine/src/colormap.rs
//! PURPOSE: RGB colors and the named colormaps used by the gradient built-ins.

use serde::{Deserialize, Serialize};

/// RGB color representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    pub fn to_css(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parse from hex string (e.g., "#FF0000" or "FF0000").
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Color::new(r, g, b))
    }

    /// Relative luminance per WCAG 2.0.
    pub fn relative_luminance(&self) -> f64 {
        fn channel(c: u8) -> f64 {
            let c = c as f64 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }

    fn lerp(a: Color, b: Color, t: f64) -> Color {
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
        Color::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
    }
}

/// A piecewise linear colormap over [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    stops: Vec<Color>,
}

impl Colormap {
    /// Looks up a named colormap. Unknown names return `None`.
    pub fn named(name: &str) -> Option<Colormap> {
        let hex: &[&str] = match name {
            "PuBu" => &["#fff7fb", "#d0d1e6", "#74a9cf", "#0570b0", "#023858"],
            "RdYlGn" => &["#a50026", "#f46d43", "#ffffbf", "#66bd63", "#006837"],
            "viridis" => &["#440154", "#3b528b", "#21918c", "#5ec962", "#fde725"],
            "Greys" => &["#ffffff", "#bdbdbd", "#737373", "#252525", "#000000"],
            _ => return None,
        };
        Some(Colormap {
            stops: hex.iter().filter_map(|h| Color::from_hex(h)).collect(),
        })
    }

    /// Color at `t`, clamped into [0, 1].
    pub fn color_at(&self, t: f64) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let segments = self.stops.len() - 1;
        let scaled = t * segments as f64;
        let idx = (scaled.floor() as usize).min(segments - 1);
        Color::lerp(self.stops[idx], self.stops[idx + 1], scaled - idx as f64)
    }
}

impl Default for Colormap {
    fn default() -> Self {
        Colormap {
            stops: vec![Color::new(0xff, 0xf7, 0xfb), Color::new(0x02, 0x38, 0x58)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_css() {
        assert_eq!(Color::new(255, 0, 0).to_css(), "#ff0000");
        assert_eq!(Color::from_hex("#00FF00"), Some(Color::new(0, 255, 0)));
        assert_eq!(Color::from_hex("fff"), None);
    }

    #[test]
    fn test_colormap_endpoints() {
        let cmap = Colormap::named("PuBu").unwrap();
        assert_eq!(cmap.color_at(0.0).to_css(), "#fff7fb");
        assert_eq!(cmap.color_at(1.0).to_css(), "#023858");
        assert_eq!(cmap.color_at(2.0), cmap.color_at(1.0));
        assert_eq!(cmap.color_at(0.5).to_css(), "#74a9cf");
    }

    #[test]
    fn test_luminance_ordering() {
        assert!(Color::new(255, 255, 255).relative_luminance() > 0.99);
        assert!(Color::new(0, 0, 0).relative_luminance() < 0.01);
    }
}
