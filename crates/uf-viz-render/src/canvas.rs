use std::fmt::Write as FmtWrite;

use crate::color::Color;
use crate::font::FontHandle;
use crate::primitives::*;
use crate::text::{TextMetrics, measure_text};

/// An SVG element stored for deferred rendering.
#[derive(Debug, Clone)]
enum SvgElement {
    Rect { x: f64, y: f64, w: f64, h: f64, style: Style },
    Line { x1: f64, y1: f64, x2: f64, y2: f64, style: LineStyle },
    Polyline { points: Vec<(f64, f64)>, style: LineStyle },
    Polygon { points: Vec<(f64, f64)>, style: Style },
    Text { x: f64, y: f64, content: String, style: TextStyle, rotate: Option<f64> },
    Circle { cx: f64, cy: f64, r: f64, style: Style },
    Group { clip_id: String, children: Vec<SvgElement> },
}

/// Immediate-mode SVG canvas. Coordinates in points (1pt = 1/72").
///
/// A canvas is one figure: it owns every element drawn on it and is dropped
/// with its render call. Non-finite coordinates are never emitted; elements
/// that would need them are skipped.
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    /// Open element lists; the last one receives new elements.
    frames: Vec<Vec<SvgElement>>,
    clip_ids: Vec<String>,
    defs: Vec<String>,
    next_clip_id: usize,
    fonts: FontHandle,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> crate::Result<Self> {
        Self::with_fonts(width, height, FontHandle::system())
    }

    pub fn with_fonts(width: f64, height: f64, fonts: FontHandle) -> crate::Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(crate::RenderError::Layout(format!(
                "canvas size must be positive, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            frames: vec![Vec::new()],
            clip_ids: Vec::new(),
            defs: Vec::new(),
            next_clip_id: 0,
            fonts,
        })
    }

    // --- Drawing primitives ---

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &Style) {
        if all_finite(&[x, y, w, h]) {
            self.push(SvgElement::Rect { x, y, w, h, style: style.clone() });
        }
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, style: &LineStyle) {
        if all_finite(&[x1, y1, x2, y2]) {
            self.push(SvgElement::Line { x1, y1, x2, y2, style: style.clone() });
        }
    }

    /// Open polyline. Points with a non-finite coordinate are dropped.
    pub fn polyline(&mut self, points: &[(f64, f64)], style: &LineStyle) {
        let points = finite_points(points);
        if points.len() >= 2 {
            self.push(SvgElement::Polyline { points, style: style.clone() });
        }
    }

    pub fn polygon(&mut self, points: &[(f64, f64)], style: &Style) {
        let points = finite_points(points);
        if points.len() >= 3 {
            self.push(SvgElement::Polygon { points, style: style.clone() });
        }
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle) {
        if all_finite(&[x, y]) {
            self.push(SvgElement::Text {
                x,
                y,
                content: content.to_string(),
                style: style.clone(),
                rotate: None,
            });
        }
    }

    pub fn text_rotated(&mut self, x: f64, y: f64, content: &str, style: &TextStyle, angle: f64) {
        if all_finite(&[x, y, angle]) {
            self.push(SvgElement::Text {
                x,
                y,
                content: content.to_string(),
                style: style.clone(),
                rotate: Some(angle),
            });
        }
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, style: &Style) {
        if all_finite(&[cx, cy, r]) {
            self.push(SvgElement::Circle { cx, cy, r, style: style.clone() });
        }
    }

    /// Error bar: vertical line + optional horizontal caps.
    pub fn error_bar(&mut self, x: f64, y_lo: f64, y_hi: f64, cap_width: f64, style: &LineStyle) {
        self.line(x, y_lo, x, y_hi, style);
        if cap_width > 0.0 {
            let half = cap_width / 2.0;
            self.line(x - half, y_lo, x + half, y_lo, style);
            self.line(x - half, y_hi, x + half, y_hi, style);
        }
    }

    /// Data marker centred on `(x, y)`; `marker.size` is the half-extent.
    pub fn marker(&mut self, x: f64, y: f64, marker: &MarkerStyle) {
        if !all_finite(&[x, y]) {
            return;
        }
        let style = if marker.fill {
            Style {
                fill: Some(marker.color),
                stroke: Some(marker.color),
                stroke_width: 0.5,
                opacity: 1.0,
            }
        } else {
            Style {
                fill: Some(Color::rgb(255, 255, 255)),
                stroke: Some(marker.color),
                stroke_width: 1.0,
                opacity: 1.0,
            }
        };
        let s = marker.size;
        match marker.shape {
            MarkerShape::Circle => self.circle(x, y, s, &style),
            MarkerShape::Square => self.rect(x - s, y - s, 2.0 * s, 2.0 * s, &style),
            MarkerShape::Triangle => {
                self.polygon(&[(x, y - s), (x + s, y + s * 0.8), (x - s, y + s * 0.8)], &style)
            }
            MarkerShape::Diamond => {
                self.polygon(&[(x, y - s * 1.2), (x + s, y), (x, y + s * 1.2), (x - s, y)], &style)
            }
            MarkerShape::Star => {
                let inner = s * 0.45;
                let outer = s * 1.3;
                let points: Vec<(f64, f64)> = (0..10)
                    .map(|k| {
                        let r = if k % 2 == 0 { outer } else { inner };
                        let angle = -std::f64::consts::FRAC_PI_2 + k as f64 * std::f64::consts::PI / 5.0;
                        (x + r * angle.cos(), y + r * angle.sin())
                    })
                    .collect();
                self.polygon(&points, &style);
            }
        }
    }

    // --- Clip paths ---

    /// Start clipping subsequent elements to a rectangle until [`Canvas::pop_clip`].
    pub fn push_clip(&mut self, x: f64, y: f64, w: f64, h: f64) -> String {
        let id = format!("clip{}", self.next_clip_id);
        self.next_clip_id += 1;
        self.defs.push(format!(
            r#"<clipPath id="{id}"><rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" /></clipPath>"#
        ));
        self.clip_ids.push(id.clone());
        self.frames.push(Vec::new());
        id
    }

    pub fn pop_clip(&mut self) {
        if let Some(clip_id) = self.clip_ids.pop()
            && let Some(children) = self.frames.pop()
        {
            self.push(SvgElement::Group { clip_id, children });
        }
    }

    /// Number of clip regions opened so far (one per plot panel).
    pub fn clip_count(&self) -> usize {
        self.next_clip_id
    }

    // --- Text measurement ---

    pub fn measure_text(&self, content: &str, style: &TextStyle) -> TextMetrics {
        measure_text(self.fonts.select(style.weight), content, style.size)
    }

    // --- SVG output ---

    fn push(&mut self, elem: SvgElement) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(elem);
        }
    }

    /// Serialize to an SVG document. Unclosed clip regions are closed first.
    pub fn finish_svg(mut self) -> String {
        while !self.clip_ids.is_empty() {
            self.pop_clip();
        }

        let mut out = String::with_capacity(32 * 1024);
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
        );

        if !self.defs.is_empty() {
            out.push_str("<defs>\n");
            for d in &self.defs {
                out.push_str(d);
                out.push('\n');
            }
            out.push_str("</defs>\n");
        }

        let _ = writeln!(
            out,
            r#"<rect width="{}" height="{}" fill="white" />"#,
            self.width, self.height
        );

        for elem in self.frames.iter().flatten() {
            render_element(&mut out, elem);
        }

        out.push_str("</svg>\n");
        out
    }
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

fn finite_points(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    points.iter().copied().filter(|(x, y)| x.is_finite() && y.is_finite()).collect()
}

fn write_points(out: &mut String, points: &[(f64, f64)]) {
    for (i, (x, y)) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{x:.2},{y:.2}");
    }
}

fn render_element(out: &mut String, elem: &SvgElement) {
    match elem {
        SvgElement::Rect { x, y, w, h, style } => {
            let _ = write!(out, r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}""#);
            write_style_attrs(out, style);
            out.push_str(" />\n");
        }
        SvgElement::Line { x1, y1, x2, y2, style } => {
            let _ = write!(out, r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}""#);
            write_line_attrs(out, style);
            out.push_str(" />\n");
        }
        SvgElement::Polyline { points, style } => {
            out.push_str(r#"<polyline points=""#);
            write_points(out, points);
            out.push_str(r#"" fill="none""#);
            write_line_attrs(out, style);
            out.push_str(" />\n");
        }
        SvgElement::Polygon { points, style } => {
            out.push_str(r#"<polygon points=""#);
            write_points(out, points);
            out.push('"');
            write_style_attrs(out, style);
            out.push_str(" />\n");
        }
        SvgElement::Text { x, y, content, style, rotate } => {
            let _ = write!(out, r#"<text x="{x:.2}" y="{y:.2}""#);
            let _ = write!(out, r#" font-family="sans-serif" font-size="{:.1}""#, style.size);
            let _ = write!(out, r#" fill="{}""#, style.color.to_svg_fill());
            let _ = write!(out, r#" text-anchor="{}""#, style.anchor.as_str());
            let _ = write!(out, r#" dominant-baseline="{}""#, style.baseline.as_str());
            if style.weight == FontWeight::Bold {
                out.push_str(r#" font-weight="bold""#);
            }
            if let Some(angle) = rotate {
                let _ = write!(out, r#" transform="rotate({angle:.1},{x:.2},{y:.2})""#);
            }
            out.push('>');
            for ch in content.chars() {
                match ch {
                    '<' => out.push_str("&lt;"),
                    '>' => out.push_str("&gt;"),
                    '&' => out.push_str("&amp;"),
                    '"' => out.push_str("&quot;"),
                    _ => out.push(ch),
                }
            }
            out.push_str("</text>\n");
        }
        SvgElement::Circle { cx, cy, r, style } => {
            let _ = write!(out, r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}""#);
            write_style_attrs(out, style);
            out.push_str(" />\n");
        }
        SvgElement::Group { clip_id, children } => {
            let _ = writeln!(out, r#"<g clip-path="url(#{clip_id})">"#);
            for child in children {
                render_element(out, child);
            }
            out.push_str("</g>\n");
        }
    }
}

fn write_style_attrs(out: &mut String, style: &Style) {
    match &style.fill {
        Some(fill) => {
            let _ = write!(out, r#" fill="{}""#, fill.to_svg_fill());
        }
        None => out.push_str(r#" fill="none""#),
    }
    if let Some(stroke) = &style.stroke {
        let _ = write!(out, r#" stroke="{}""#, stroke.to_svg_fill());
        let _ = write!(out, r#" stroke-width="{:.2}""#, style.stroke_width);
    }
    if (style.opacity - 1.0).abs() > 1e-4 {
        let _ = write!(out, r#" opacity="{:.3}""#, style.opacity);
    }
}

fn write_line_attrs(out: &mut String, style: &LineStyle) {
    let _ = write!(out, r#" stroke="{}""#, style.color.to_svg_fill());
    let _ = write!(out, r#" stroke-width="{:.2}""#, style.width);
    if let Some(dash) = &style.dash {
        let _ = write!(out, r#" stroke-dasharray="{dash}""#);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(w: f64, h: f64) -> Canvas {
        Canvas::with_fonts(w, h, FontHandle::empty()).unwrap()
    }

    #[test]
    fn empty_canvas() {
        let svg = canvas(100.0, 50.0).finish_svg();
        assert!(svg.contains("width=\"100\""));
        assert!(svg.contains("height=\"50\""));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn rejects_degenerate_size() {
        assert!(Canvas::with_fonts(0.0, 10.0, FontHandle::empty()).is_err());
    }

    #[test]
    fn text_is_escaped() {
        let mut c = canvas(200.0, 100.0);
        c.text(10.0, 20.0, "a < b & c", &TextStyle::default());
        let svg = c.finish_svg();
        assert!(svg.contains("a &lt; b &amp; c"));
        assert!(svg.contains("font-family=\"sans-serif\""));
    }

    #[test]
    fn non_finite_geometry_is_skipped() {
        let mut c = canvas(100.0, 100.0);
        c.marker(f64::NAN, 10.0, &MarkerStyle::default());
        c.error_bar(10.0, f64::INFINITY, 5.0, 2.0, &LineStyle::default());
        c.polyline(&[(0.0, 0.0), (f64::NAN, 1.0), (2.0, 2.0)], &LineStyle::default());
        let svg = c.finish_svg();
        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
        assert!(svg.contains("points=\"0.00,0.00 2.00,2.00\""));
        assert!(!svg.contains("<circle"));
    }

    #[test]
    fn clipped_elements_are_grouped() {
        let mut c = canvas(100.0, 100.0);
        c.push_clip(0.0, 0.0, 50.0, 50.0);
        c.rect(1.0, 1.0, 5.0, 5.0, &Style::filled(Color::rgb(255, 0, 0)));
        c.pop_clip();
        c.push_clip(0.0, 50.0, 50.0, 50.0);
        c.circle(10.0, 60.0, 2.0, &Style::filled(Color::rgb(0, 0, 255)));
        assert_eq!(c.clip_count(), 2);
        let svg = c.finish_svg();
        assert!(svg.contains(r##"<g clip-path="url(#clip0)">"##));
        assert!(svg.contains(r##"<g clip-path="url(#clip1)">"##));
        assert_eq!(svg.matches("<clipPath").count(), 2);
    }

    #[test]
    fn marker_shapes_render_distinct_elements() {
        let mut c = canvas(100.0, 100.0);
        let base = MarkerStyle::default();
        c.marker(10.0, 10.0, &MarkerStyle { shape: MarkerShape::Square, ..base.clone() });
        c.marker(20.0, 10.0, &MarkerStyle { shape: MarkerShape::Star, ..base.clone() });
        c.marker(30.0, 10.0, &base);
        let svg = c.finish_svg();
        assert!(svg.contains("<rect x=\"7.00\""));
        assert_eq!(svg.matches("<polygon").count(), 1);
        assert_eq!(svg.matches("<circle").count(), 1);
    }
}
