use uf_viz::ComparisonArtifact;
use uf_viz::comparison::MethodSeries;

use crate::RenderError;
use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::layout::legend::{self, LegendCorner, LegendEntry, LegendKind};
use crate::layout::margins::PlotArea;
use crate::layout::multi_panel::MainRatioLayout;
use crate::plots::axes_draw::draw_axes;
use crate::primitives::*;

/// Headroom above the tallest point of the main panel, before tick rounding.
const Y_HEADROOM: f64 = 1.05;

/// Render the two-panel comparison: truth, measured and every method in the
/// main panel, method / truth in the ratio panel below it.
pub fn render(artifact: &ComparisonArtifact, config: &VizConfig) -> crate::Result<String> {
    let n_bins = artifact.truth.len();
    let edges = &artifact.bin_edges;
    if n_bins == 0 || edges.len() != n_bins + 1 {
        return Err(RenderError::Layout(format!(
            "comparison '{}' has {} bins and {} edges",
            artifact.distribution,
            n_bins,
            edges.len()
        )));
    }
    let corner = LegendCorner::parse(&config.comparison.legend_loc).ok_or_else(|| {
        RenderError::Config(format!("unknown legend_loc '{}'", config.comparison.legend_loc))
    })?;

    let mut canvas = Canvas::new(config.figure.width, config.figure.height)?;

    let x_min = edges[0];
    let x_max = edges[n_bins];

    let y_max = main_panel_max(artifact) * Y_HEADROOM;
    let y_axis_main = Axis::auto_linear(0.0, y_max, 6).with_label("Entries");
    let x_axis_main = Axis::fixed(x_min, x_max);

    let cmp = &config.comparison;
    let [ratio_lo, ratio_hi] = cmp.ratio_y_range;
    let y_axis_ratio = Axis::fixed(ratio_lo, ratio_hi)
        .with_ticks(&cmp.ratio_ticks, &cmp.ratio_tick_labels)
        .with_label("Ratio to truth");
    let x_axis_ratio = Axis::clipped_linear(x_min, x_max, 8).with_label("Bins");

    let area =
        PlotArea::auto(&canvas, &[&y_axis_main, &y_axis_ratio], Some(&x_axis_ratio), config);
    let layout =
        MainRatioLayout::new(area.left, area.top, area.width, area.height, 0.0, cmp.ratio_fraction);

    // --- Main panel ---
    let main = &layout.main;
    draw_axes(&mut canvas, main, &x_axis_main, &y_axis_main, config);
    canvas.push_clip(main.left, main.top, main.width, main.height);

    let panel = Panel { area: main, x: &x_axis_main, y: &y_axis_main };
    for (steps, color) in [
        (&artifact.truth_steps, config.colors.truth),
        (&artifact.measured_steps, config.colors.measured),
    ] {
        let outline = panel.step_outline(edges, steps);
        let mut fill = outline.clone();
        fill.push((panel.px(x_max), panel.py(0.0)));
        fill.push((panel.px(x_min), panel.py(0.0)));
        canvas.polygon(&fill, &Style::filled(color.with_alpha(cmp.fill_alpha)));
        canvas.polyline(&outline, &LineStyle::solid(color, cmp.step_width));
    }

    for series in &artifact.methods {
        draw_series(
            &mut canvas,
            &panel,
            &artifact.bin_midpoints,
            series,
            &series.values,
            &series.errors,
            config,
        );
    }
    canvas.pop_clip();

    // --- Ratio panel ---
    let ratio = &layout.ratio;
    draw_axes(&mut canvas, ratio, &x_axis_ratio, &y_axis_ratio, config);
    canvas.push_clip(ratio.left, ratio.top, ratio.width, ratio.height);

    let panel = Panel { area: ratio, x: &x_axis_ratio, y: &y_axis_ratio };
    let ref_py = panel.py(1.0);
    let ref_style = LineStyle::solid(config.colors.reference, 1.0);
    canvas.line(ratio.left, ref_py, ratio.right(), ref_py, &ref_style);

    for series in &artifact.methods {
        draw_series(
            &mut canvas,
            &panel,
            &artifact.bin_midpoints,
            series,
            &series.ratio,
            &series.ratio_errors,
            config,
        );
    }
    canvas.pop_clip();

    // --- Legend: truth, measured, then methods in table order ---
    let mut entries = vec![
        LegendEntry {
            label: "Truth".into(),
            color: config.colors.truth,
            kind: LegendKind::FilledLine(cmp.fill_alpha),
        },
        LegendEntry {
            label: "Measured".into(),
            color: config.colors.measured,
            kind: LegendKind::FilledLine(cmp.fill_alpha),
        },
    ];
    entries.extend(artifact.methods.iter().map(|s| LegendEntry {
        label: s.legend_label.clone(),
        color: Color::hex(&s.color),
        kind: LegendKind::ErrorMarker(s.marker.into()),
    }));
    legend::draw_legend(&mut canvas, main, &entries, config.font.size, corner, cmp.legend_frame);

    Ok(canvas.finish_svg())
}

/// Largest finite value drawn in the main panel (1 when nothing positive is drawn).
fn main_panel_max(artifact: &ComparisonArtifact) -> f64 {
    let hist = artifact.truth.iter().chain(&artifact.measured).copied();
    let methods = artifact
        .methods
        .iter()
        .flat_map(|s| s.values.iter().zip(&s.errors).map(|(v, e)| v + e.max(0.0)));
    let max = hist.chain(methods).filter(|v| v.is_finite()).fold(0.0_f64, f64::max);
    if max > 0.0 { max } else { 1.0 }
}

struct Panel<'a> {
    area: &'a PlotArea,
    x: &'a Axis,
    y: &'a Axis,
}

impl Panel<'_> {
    fn px(&self, x: f64) -> f64 {
        self.x.data_to_pixel(x, self.area.left, self.area.right())
    }

    fn py(&self, y: f64) -> f64 {
        self.y.data_to_pixel(y, self.area.bottom(), self.area.top)
    }

    /// Post-step outline: bin `i` is flat at `steps[i]` over `[edges[i], edges[i+1]]`.
    fn step_outline(&self, edges: &[f64], steps: &[f64]) -> Vec<(f64, f64)> {
        edges
            .windows(2)
            .zip(steps)
            .flat_map(|(w, &s)| [(self.px(w[0]), self.py(s)), (self.px(w[1]), self.py(s))])
            .collect()
    }
}

/// Error bars with markers at bin midpoints. Points that cannot be placed
/// (non-finite value or error) are left out by the canvas.
fn draw_series(
    canvas: &mut Canvas,
    panel: &Panel<'_>,
    midpoints: &[f64],
    series: &MethodSeries,
    values: &[f64],
    errors: &[f64],
    config: &VizConfig,
) {
    let color = Color::hex(&series.color);
    let marker = MarkerStyle {
        shape: series.marker.into(),
        size: config.comparison.marker_size / 2.0,
        color,
        fill: true,
    };
    let err_style = LineStyle::solid(color, 1.0);

    for ((&x, &v), &e) in midpoints.iter().zip(values).zip(errors) {
        let px = panel.px(x);
        let (lo, hi) = (panel.py(v - e), panel.py(v + e));
        canvas.error_bar(px, lo, hi, config.comparison.error_cap, &err_style);
        canvas.marker(px, panel.py(v), &marker);
    }
}
