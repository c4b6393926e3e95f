use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::primitives::TextStyle;

/// Rectangular plot area within the canvas.
#[derive(Debug, Clone, Copy)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Compute margins from the tick labels of every stacked y axis and the
    /// shared x axis. Panels stacked in the result share the left edge.
    pub fn auto(
        canvas: &Canvas,
        y_axes: &[&Axis],
        x_axis: Option<&Axis>,
        config: &VizConfig,
    ) -> Self {
        let tick_style = TextStyle { size: config.font.tick_size, ..Default::default() };
        let label_style = TextStyle { size: config.font.label_size, ..Default::default() };
        let outward = if config.axes.tick_direction == "out" { config.axes.tick_length } else { 0.0 };

        // Left margin: widest y tick label + axis label + padding
        let max_tick_w = y_axes
            .iter()
            .flat_map(|y| y.tick_labels.iter())
            .map(|l| canvas.measure_text(l, &tick_style).width)
            .fold(0.0_f64, f64::max);
        let mut left = 15.0 + outward + max_tick_w + 8.0;
        if y_axes.iter().any(|y| !y.label.is_empty()) {
            left += label_style.size + 6.0;
        }

        let mut bottom = 15.0 + outward;
        if let Some(x) = x_axis {
            bottom += tick_style.size + 6.0;
            if !x.label.is_empty() {
                bottom += label_style.size + 6.0;
            }
        }

        let top = 12.0;
        let right = 15.0;

        let width = canvas.width - left - right;
        let height = canvas.height - top - bottom;

        Self { left, top, width: width.max(50.0), height: height.max(50.0) }
    }

    /// Manual margins (for multi-panel layouts).
    pub fn manual(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontHandle;

    #[test]
    fn auto_area_fits_inside_canvas() {
        let canvas = Canvas::with_fonts(619.2, 504.0, FontHandle::empty()).unwrap();
        let config = VizConfig::default();
        let y = Axis::auto_linear(0.0, 12345.0, 5).with_label("Entries");
        let x = Axis::clipped_linear(0.0, 10.0, 6).with_label("Bins");
        let area = PlotArea::auto(&canvas, &[&y], Some(&x), &config);
        assert!(area.left > 15.0);
        assert!(area.right() <= canvas.width);
        assert!(area.bottom() <= canvas.height);
    }

    #[test]
    fn wider_tick_labels_push_left_edge() {
        let canvas = Canvas::with_fonts(619.2, 504.0, FontHandle::empty()).unwrap();
        let config = VizConfig::default();
        let narrow = Axis::auto_linear(0.0, 5.0, 5);
        let wide = Axis::auto_linear(0.0, 500000.0, 5);
        let a = PlotArea::auto(&canvas, &[&narrow], None, &config);
        let b = PlotArea::auto(&canvas, &[&narrow, &wide], None, &config);
        assert!(b.left > a.left);
    }
}
