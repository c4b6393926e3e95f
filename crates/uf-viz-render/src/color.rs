use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` (leading `#` optional). Malformed channels read as 0.
    pub fn hex(s: &str) -> Self {
        let s = s.strip_prefix('#').unwrap_or(s);
        let channel = |range: std::ops::Range<usize>| {
            s.get(range).and_then(|c| u8::from_str_radix(c, 16).ok()).unwrap_or(0)
        };
        Self { r: channel(0..2), g: channel(2..4), b: channel(4..6), a: 1.0 }
    }

    pub const fn with_alpha(mut self, a: f64) -> Self {
        self.a = a;
        self
    }

    pub fn to_svg_fill(&self) -> String {
        if (self.a - 1.0).abs() < 1e-6 {
            self.to_hex()
        } else {
            format!("rgba({},{},{},{:.3})", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation between two colors (for colormaps).
    pub fn lerp(a: Color, b: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: (a.r as f64 * (1.0 - t) + b.r as f64 * t).round() as u8,
            g: (a.g as f64 * (1.0 - t) + b.g as f64 * t).round() as u8,
            b: (a.b as f64 * (1.0 - t) + b.b as f64 * t).round() as u8,
            a: a.a * (1.0 - t) + b.a * t,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_svg_fill())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Color::hex(&s))
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(0, 0, 0)
    }
}

// --- matplotlib "tab" colors ---

pub const TAB_BLUE: &str = "#1f77b4";
pub const TAB_ORANGE: &str = "#ff7f0e";

/// Sequential white → `hot` colormap for response matrices.
pub fn sequential(hot: Color, frac: f64) -> Color {
    Color::lerp(Color::rgb(255, 255, 255), hot, frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        let c = Color::hex("#1F77B4");
        assert_eq!((c.r, c.g, c.b), (0x1f, 0x77, 0xb4));
        assert!((c.a - 1.0).abs() < 1e-9);
    }

    #[test]
    fn short_hex_does_not_panic() {
        assert_eq!(Color::hex("#12"), Color::rgb(0x12, 0, 0));
    }

    #[test]
    fn svg_fill_alpha() {
        let c = Color::hex(TAB_ORANGE).with_alpha(0.3);
        assert_eq!(c.to_svg_fill(), "rgba(255,127,14,0.300)");
    }

    #[test]
    fn serializes_as_hex() {
        let json = serde_json::to_string(&Color::hex(TAB_BLUE).with_alpha(0.5)).unwrap();
        assert_eq!(json, "\"#1f77b4\"");
    }

    #[test]
    fn sequential_endpoints() {
        let hot = Color::hex(TAB_BLUE);
        assert_eq!(sequential(hot, 0.0), Color::rgb(255, 255, 255));
        assert_eq!(sequential(hot, 1.0), hot);
    }
}
