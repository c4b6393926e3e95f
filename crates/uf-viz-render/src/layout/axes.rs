/// Axis configuration with tick generation and data→pixel mapping.
#[derive(Debug, Clone)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub label: String,
    pub tick_positions: Vec<f64>,
    pub tick_labels: Vec<String>,
    pub minor_ticks: Vec<f64>,
}

impl Axis {
    /// Auto-scale linear axis with "nice number" ticks; limits widen to the
    /// nearest tick.
    pub fn auto_linear(data_min: f64, data_max: f64, target_ticks: usize) -> Self {
        let (nice_min, nice_max, step) = nice_range(data_min, data_max, target_ticks);
        Self::with_nice_ticks(nice_min, nice_max, nice_min, nice_max, step)
    }

    /// Linear axis with limits exactly `[min, max]`; nice ticks inside it.
    pub fn clipped_linear(min: f64, max: f64, target_ticks: usize) -> Self {
        let (nice_min, nice_max, step) = nice_range(min, max, target_ticks);
        if (max - min).abs() < 1e-15 {
            return Self::with_nice_ticks(nice_min, nice_max, nice_min, nice_max, step);
        }
        Self::with_nice_ticks(min, max, nice_min, nice_max, step)
    }

    fn with_nice_ticks(min: f64, max: f64, nice_min: f64, nice_max: f64, step: f64) -> Self {
        let eps = step * 0.01;
        let mut ticks = Vec::new();
        let mut labels = Vec::new();
        let mut k = 0;
        loop {
            let v = nice_min + k as f64 * step;
            if v > nice_max + eps {
                break;
            }
            if v >= min - eps && v <= max + eps {
                ticks.push(v);
                labels.push(format_tick(v, step));
            }
            k += 1;
        }

        // Minor ticks: 5 subdivisions per major
        let minor_step = step / 5.0;
        let mut minor = Vec::new();
        let mut k = 0;
        loop {
            let mv = nice_min + k as f64 * minor_step;
            if mv > nice_max + minor_step * 0.01 {
                break;
            }
            let on_major = ticks.iter().any(|t| (t - mv).abs() < minor_step * 0.01);
            if !on_major && mv >= min && mv <= max {
                minor.push(mv);
            }
            k += 1;
        }

        Self {
            min,
            max,
            label: String::new(),
            tick_positions: ticks,
            tick_labels: labels,
            minor_ticks: minor,
        }
    }

    /// Fixed axis with explicit limits (no tick auto-generation).
    pub fn fixed(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            label: String::new(),
            tick_positions: Vec::new(),
            tick_labels: Vec::new(),
            minor_ticks: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Replace ticks with explicit positions and labels (minor ticks cleared).
    pub fn with_ticks(mut self, positions: &[f64], labels: &[String]) -> Self {
        self.tick_positions = positions.to_vec();
        self.tick_labels = labels.to_vec();
        self.minor_ticks.clear();
        self
    }

    /// Map a data value to pixel coordinate.
    pub fn data_to_pixel(&self, value: f64, px_min: f64, px_max: f64) -> f64 {
        let frac = (value - self.min) / (self.max - self.min);
        px_min + frac * (px_max - px_min)
    }
}

/// "Nice numbers" algorithm for pleasant tick spacing.
fn nice_range(data_min: f64, data_max: f64, target_ticks: usize) -> (f64, f64, f64) {
    if !(data_min.is_finite() && data_max.is_finite()) {
        return (0.0, 1.0, 0.2);
    }
    if (data_max - data_min).abs() < 1e-15 {
        return (data_min - 1.0, data_max + 1.0, 1.0);
    }
    let range = data_max - data_min;
    let rough_step = range / (target_ticks.max(2) - 1) as f64;
    let step = nice_step(rough_step);
    let nice_min = (data_min / step).floor() * step;
    let nice_max = (data_max / step).ceil() * step;
    (nice_min, nice_max, step)
}

fn nice_step(rough: f64) -> f64 {
    let exp = rough.abs().log10().floor();
    let frac = rough / 10.0_f64.powf(exp);
    let nice_frac = if frac <= 1.5 {
        1.0
    } else if frac <= 3.5 {
        2.0
    } else if frac <= 7.5 {
        5.0
    } else {
        10.0
    };
    nice_frac * 10.0_f64.powf(exp)
}

fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 { 0 } else { (-step.log10().floor()) as usize };
    if decimals == 0 {
        // Avoid "-0"
        let v = if value.abs() < step * 0.01 { 0.0 } else { value };
        format!("{}", v.round() as i64)
    } else {
        format!("{:.prec$}", value, prec = decimals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_linear_basic() {
        let ax = Axis::auto_linear(0.0, 10.0, 6);
        assert!(!ax.tick_positions.is_empty());
        assert!(ax.min <= 0.0);
        assert!(ax.max >= 10.0);
    }

    #[test]
    fn clipped_keeps_exact_limits() {
        let ax = Axis::clipped_linear(-3.3, 7.9, 6);
        assert_eq!(ax.min, -3.3);
        assert_eq!(ax.max, 7.9);
        assert!(ax.tick_positions.iter().all(|&t| (-3.3..=7.9).contains(&t)));
        assert!(ax.tick_positions.contains(&0.0));
        assert!(ax.minor_ticks.iter().all(|&t| (-3.3..=7.9).contains(&t)));
    }

    #[test]
    fn explicit_ticks_replace_generated_ones() {
        let labels: Vec<String> = ["", "1.0", ""].iter().map(|s| s.to_string()).collect();
        let ax = Axis::fixed(0.0, 2.0).with_ticks(&[0.5, 1.0, 1.5], &labels);
        assert_eq!(ax.tick_positions, vec![0.5, 1.0, 1.5]);
        assert_eq!(ax.tick_labels[1], "1.0");
        assert!(ax.minor_ticks.is_empty());
    }

    #[test]
    fn data_to_pixel_linear() {
        let ax = Axis::auto_linear(0.0, 100.0, 5);
        let px = ax.data_to_pixel(50.0, 0.0, 500.0);
        assert!((px - 250.0).abs() < 1.0);
        // Inverted range (y axes map bottom → top).
        let py = ax.data_to_pixel(0.0, 400.0, 100.0);
        assert!((py - 400.0).abs() < 1e-9);
    }

    #[test]
    fn non_finite_input_falls_back_to_unit_range() {
        let ax = Axis::auto_linear(0.0, f64::NAN, 5);
        assert_eq!((ax.min, ax.max), (0.0, 1.0));
    }

    #[test]
    fn nice_step_values() {
        assert!((nice_step(3.2) - 2.0).abs() < 1e-9);
        assert!((nice_step(0.7) - 0.5).abs() < 1e-9);
        assert!((nice_step(15.0) - 10.0).abs() < 1e-9);
        assert!((nice_step(4.5) - 5.0).abs() < 1e-9);
        assert!((nice_step(1.2) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn tick_labels_have_no_negative_zero() {
        assert_eq!(format_tick(-1e-12, 1.0), "0");
        assert_eq!(format_tick(0.25, 0.05), "0.25");
    }
}
