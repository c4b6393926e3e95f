use crate::canvas::Canvas;
use crate::color::Color;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

pub struct LegendEntry {
    pub label: String,
    pub color: Color,
    pub kind: LegendKind,
}

pub enum LegendKind {
    /// Step outline over a translucent fill (alpha of the fill).
    FilledLine(f64),
    Line(Option<String>), // dash pattern
    /// Error-bar series drawn with the given marker.
    ErrorMarker(MarkerShape),
}

/// Corner of the plot area the legend is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendCorner {
    UpperRight,
    UpperLeft,
}

impl LegendCorner {
    /// Parse `"upper right"` / `"upper left"` (also with `_` or `-`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['_', '-'], " ").as_str() {
            "upper right" | "best" => Some(Self::UpperRight),
            "upper left" => Some(Self::UpperLeft),
            _ => None,
        }
    }
}

/// Draw a legend in the plot area.
pub fn draw_legend(
    canvas: &mut Canvas,
    area: &PlotArea,
    entries: &[LegendEntry],
    config_font_size: f64,
    corner: LegendCorner,
    frame: bool,
) {
    if entries.is_empty() {
        return;
    }

    let row_height = config_font_size + 5.0;
    let swatch_w = 18.0;
    let swatch_h = config_font_size - 2.0;
    let gap = 6.0;
    let padding = 6.0;

    let text_style = TextStyle {
        size: config_font_size * 0.9,
        baseline: TextBaseline::Central,
        ..Default::default()
    };

    let max_w = entries
        .iter()
        .map(|e| canvas.measure_text(&e.label, &text_style).width)
        .fold(0.0_f64, f64::max);

    let legend_w = padding + swatch_w + gap + max_w + padding;
    let legend_h = padding + entries.len() as f64 * row_height + padding;

    let lx = match corner {
        LegendCorner::UpperRight => area.right() - legend_w - 6.0,
        LegendCorner::UpperLeft => area.left + 6.0,
    };
    let ly = area.top + 6.0;

    let bg_style = Style {
        fill: Some(Color::rgba(255, 255, 255, 0.8)),
        stroke: if frame { Some(Color::rgb(204, 204, 204)) } else { None },
        stroke_width: 0.8,
        opacity: 1.0,
    };
    canvas.rect(lx, ly, legend_w, legend_h, &bg_style);

    for (i, entry) in entries.iter().enumerate() {
        let ey = ly + padding + i as f64 * row_height + row_height / 2.0;
        let sx = lx + padding;

        match entry.kind {
            LegendKind::FilledLine(alpha) => {
                canvas.rect(
                    sx,
                    ey - swatch_h / 2.0,
                    swatch_w,
                    swatch_h,
                    &Style::filled(entry.color.with_alpha(alpha)),
                );
                canvas.line(
                    sx,
                    ey - swatch_h / 2.0,
                    sx + swatch_w,
                    ey - swatch_h / 2.0,
                    &LineStyle::solid(entry.color, 1.5),
                );
            }
            LegendKind::Line(ref dash) => {
                let ls = LineStyle { color: entry.color, width: 1.5, dash: dash.clone() };
                canvas.line(sx, ey, sx + swatch_w, ey, &ls);
            }
            LegendKind::ErrorMarker(shape) => {
                let cx = sx + swatch_w / 2.0;
                canvas.line(
                    cx,
                    ey - swatch_h / 2.0,
                    cx,
                    ey + swatch_h / 2.0,
                    &LineStyle::solid(entry.color, 1.0),
                );
                canvas.marker(
                    cx,
                    ey,
                    &MarkerStyle { shape, color: entry.color, size: 2.5, fill: true },
                );
            }
        }

        canvas.text(sx + swatch_w + gap, ey, &entry.label, &text_style);
    }
}
