use ab_glyph::{Font, FontVec, ScaleFont};

#[derive(Debug, Clone, Copy)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub ascent: f64,
}

/// Average advance of a sans-serif glyph, in ems, when no font is available.
const FALLBACK_ADVANCE_EM: f64 = 0.56;

/// Measure text width and height in points.
pub fn measure_text(font: Option<&FontVec>, text: &str, size_pt: f64) -> TextMetrics {
    let Some(font) = font else {
        return TextMetrics {
            width: text.chars().count() as f64 * size_pt * FALLBACK_ADVANCE_EM,
            height: size_pt * 1.2,
            ascent: size_pt * 0.95,
        };
    };

    let scale = ab_glyph::PxScale::from(size_pt as f32);
    let scaled = font.as_scaled(scale);

    let mut width: f32 = 0.0;
    let mut prev_glyph_id = None;
    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = prev_glyph_id {
            width += scaled.kern(prev, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        prev_glyph_id = Some(glyph_id);
    }

    let ascent = scaled.ascent();
    let descent = scaled.descent();
    TextMetrics { width: width as f64, height: (ascent - descent) as f64, ascent: ascent as f64 }
}
