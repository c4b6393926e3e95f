use uf_viz::ResponseMatrixArtifact;

use crate::RenderError;
use crate::canvas::Canvas;
use crate::color::{self, Color};
use crate::config::VizConfig;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

/// Render a response matrix as a heatmap: truth bins along x, reco bins
/// along y (bin 0 at the bottom), with a colorbar on the right.
pub fn render(artifact: &ResponseMatrixArtifact, config: &VizConfig) -> crate::Result<String> {
    let n_reco = artifact.matrix.len();
    let n_truth = artifact.matrix.first().map_or(0, Vec::len);
    if n_reco == 0 || n_truth == 0 {
        return Err(RenderError::Layout(format!(
            "response matrix '{}' is empty",
            artifact.distribution
        )));
    }

    let cell_size = if n_reco.max(n_truth) <= 20 {
        config.response.cell_size
    } else {
        config.response.cell_size * 0.6
    };
    let margin = 60.0;
    let colorbar_w = 14.0;
    let colorbar_gap = 10.0;
    let matrix_w = cell_size * n_truth as f64;
    let matrix_h = cell_size * n_reco as f64;
    let fig_w = margin + matrix_w + colorbar_gap + colorbar_w + 45.0;
    let fig_h = 35.0 + matrix_h + 45.0;

    let mut canvas = Canvas::new(fig_w, fig_h)?;
    let area = PlotArea::manual(margin, 35.0, matrix_w, matrix_h);

    let title_style = TextStyle {
        size: config.font.size,
        weight: FontWeight::Bold,
        anchor: TextAnchor::Start,
        ..Default::default()
    };
    let title = if artifact.normalised {
        format!("{} (normalised)", artifact.distribution)
    } else {
        artifact.distribution.clone()
    };
    canvas.text(area.left, area.top - 10.0, &title, &title_style);

    let max_val = artifact.max_value().max(1e-10);
    let annotate = n_reco.max(n_truth) <= config.response.annotate_max_bins;

    for (row, values) in artifact.matrix.iter().enumerate() {
        for (col, &val) in values.iter().enumerate() {
            let frac = val / max_val;
            let x = area.left + col as f64 * cell_size;
            let y = area.bottom() - (row + 1) as f64 * cell_size;
            canvas.rect(
                x,
                y,
                cell_size,
                cell_size,
                &Style::filled(color::sequential(config.colors.response, frac)),
            );

            if annotate {
                let text_color =
                    if frac > 0.5 { Color::rgb(255, 255, 255) } else { Color::rgb(0, 0, 0) };
                canvas.text(
                    x + cell_size / 2.0,
                    y + cell_size / 2.0,
                    &format!("{val:.2}"),
                    &TextStyle {
                        size: (cell_size * 0.35).min(7.0),
                        color: text_color,
                        anchor: TextAnchor::Middle,
                        baseline: TextBaseline::Central,
                        ..Default::default()
                    },
                );
            }
        }
    }

    // Frame
    let frame_style = LineStyle::solid(Color::rgb(0, 0, 0), 0.5);
    canvas.line(area.left, area.top, area.right(), area.top, &frame_style);
    canvas.line(area.left, area.bottom(), area.right(), area.bottom(), &frame_style);
    canvas.line(area.left, area.top, area.left, area.bottom(), &frame_style);
    canvas.line(area.right(), area.top, area.right(), area.bottom(), &frame_style);

    // Colorbar
    let cb_x = area.right() + colorbar_gap;
    let cb_steps = 50;
    let cb_h = matrix_h / cb_steps as f64;
    for i in 0..cb_steps {
        let frac = 1.0 - i as f64 / (cb_steps - 1) as f64;
        let y = area.top + i as f64 * cb_h;
        canvas.rect(
            cb_x,
            y,
            colorbar_w,
            cb_h + 0.5,
            &Style::filled(color::sequential(config.colors.response, frac)),
        );
    }
    let cb_label_style = TextStyle {
        size: config.font.tick_size * 0.85,
        anchor: TextAnchor::Start,
        baseline: TextBaseline::Central,
        ..Default::default()
    };
    canvas.text(cb_x + colorbar_w + 3.0, area.top, &format!("{max_val:.2}"), &cb_label_style);
    canvas.text(cb_x + colorbar_w + 3.0, area.bottom(), "0", &cb_label_style);

    let label_style =
        TextStyle { size: config.font.label_size, anchor: TextAnchor::Middle, ..Default::default() };
    canvas.text(area.left + area.width / 2.0, area.bottom() + 20.0, "Truth bin", &label_style);
    canvas.text_rotated(
        area.left - 30.0,
        area.top + area.height / 2.0,
        "Reco bin",
        &label_style,
        -90.0,
    );

    Ok(canvas.finish_svg())
}
