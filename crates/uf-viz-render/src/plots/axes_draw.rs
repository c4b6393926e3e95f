use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

/// Draw a box frame with ticks, optional grid, tick labels and axis titles.
///
/// An axis without tick positions gets a bare frame edge; an axis without
/// tick labels gets marks only.
pub fn draw_axes(
    canvas: &mut Canvas,
    area: &PlotArea,
    x_axis: &Axis,
    y_axis: &Axis,
    config: &VizConfig,
) {
    let frame_color = Color::rgb(0, 0, 0);
    let frame_style = LineStyle::solid(frame_color, 0.8);
    let tick_line = LineStyle::solid(frame_color, 0.6);
    let minor_line = LineStyle::solid(frame_color, 0.4);
    let grid_style = LineStyle {
        color: config.grid.color.with_alpha(config.grid.alpha),
        width: 0.5,
        dash: Some("3 3".into()),
    };

    // Ticks point into the panel for "in", away from it for "out".
    let sign = if config.axes.tick_direction == "in" { 1.0 } else { -1.0 };
    let tl = config.axes.tick_length * sign;
    let mtl = config.axes.minor_tick_length * sign;
    let outward = if sign < 0.0 { config.axes.tick_length } else { 0.0 };

    canvas.line(area.left, area.top, area.right(), area.top, &frame_style);
    canvas.line(area.left, area.bottom(), area.right(), area.bottom(), &frame_style);
    canvas.line(area.left, area.top, area.left, area.bottom(), &frame_style);
    canvas.line(area.right(), area.top, area.right(), area.bottom(), &frame_style);

    let x_tick_label_style = TextStyle {
        size: config.font.tick_size,
        color: frame_color,
        anchor: TextAnchor::Middle,
        baseline: TextBaseline::Hanging,
        ..Default::default()
    };

    // --- X axis ticks ---
    for (i, &val) in x_axis.tick_positions.iter().enumerate() {
        let px = x_axis.data_to_pixel(val, area.left, area.right());
        if px < area.left - 0.5 || px > area.right() + 0.5 {
            continue;
        }
        if config.grid.show {
            canvas.line(px, area.top, px, area.bottom(), &grid_style);
        }
        canvas.line(px, area.bottom(), px, area.bottom() - tl, &tick_line);
        if config.axes.show_top_ticks {
            canvas.line(px, area.top, px, area.top + tl, &tick_line);
        }
        if let Some(label) = x_axis.tick_labels.get(i).filter(|l| !l.is_empty()) {
            canvas.text(px, area.bottom() + outward + 3.0, label, &x_tick_label_style);
        }
    }

    if config.axes.minor_ticks {
        for &val in &x_axis.minor_ticks {
            let px = x_axis.data_to_pixel(val, area.left, area.right());
            canvas.line(px, area.bottom(), px, area.bottom() - mtl, &minor_line);
        }
    }

    // --- Y axis ticks ---
    let y_tick_label_style = TextStyle {
        size: config.font.tick_size,
        color: frame_color,
        anchor: TextAnchor::End,
        baseline: TextBaseline::Central,
        ..Default::default()
    };

    let mut widest_y_label = 0.0_f64;
    for (i, &val) in y_axis.tick_positions.iter().enumerate() {
        let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
        if py < area.top - 0.5 || py > area.bottom() + 0.5 {
            continue;
        }
        if config.grid.show {
            canvas.line(area.left, py, area.right(), py, &grid_style);
        }
        canvas.line(area.left, py, area.left + tl, py, &tick_line);
        if config.axes.show_right_ticks {
            canvas.line(area.right(), py, area.right() - tl, py, &tick_line);
        }
        if let Some(label) = y_axis.tick_labels.get(i).filter(|l| !l.is_empty()) {
            canvas.text(area.left - outward - 4.0, py, label, &y_tick_label_style);
            widest_y_label =
                widest_y_label.max(canvas.measure_text(label, &y_tick_label_style).width);
        }
    }

    if config.axes.minor_ticks {
        for &val in &y_axis.minor_ticks {
            let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
            canvas.line(area.left, py, area.left + mtl, py, &minor_line);
        }
    }

    // --- Axis labels ---
    let label_style = TextStyle {
        size: config.font.label_size,
        color: frame_color,
        anchor: TextAnchor::Middle,
        ..Default::default()
    };

    if !x_axis.label.is_empty() {
        let label_y = area.bottom() + outward + config.font.tick_size + 8.0;
        canvas.text(
            area.left + area.width / 2.0,
            label_y,
            &x_axis.label,
            &TextStyle { baseline: TextBaseline::Hanging, ..label_style.clone() },
        );
    }

    if !y_axis.label.is_empty() {
        let label_x = area.left - outward - 4.0 - widest_y_label - 6.0;
        let label_y = area.top + area.height / 2.0;
        canvas.text_rotated(label_x, label_y, &y_axis.label, &label_style, -90.0);
    }
}
