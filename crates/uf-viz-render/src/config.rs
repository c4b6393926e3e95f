use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;

use crate::color::{Color, TAB_BLUE, TAB_ORANGE};
use crate::theme::BuiltinTheme;

/// Top-level visualization configuration (YAML or programmatic).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub theme: String,
    pub figure: FigureConfig,
    pub font: FontConfig,
    pub axes: AxesConfig,
    pub grid: GridConfig,
    pub colors: ColorsConfig,
    pub output: OutputConfig,
    pub comparison: ComparisonConfig,
    pub response: ResponseConfig,
}

impl Default for VizConfig {
    fn default() -> Self {
        BuiltinTheme::Classic.base_config()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 619.2,  // 8.6" * 72
            height: 504.0, // 7.0" * 72
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub size: f64,
    pub label_size: f64,
    pub tick_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self { size: 10.0, label_size: 11.0, tick_size: 9.5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    /// `"in"` or `"out"`.
    pub tick_direction: String,
    pub show_top_ticks: bool,
    pub show_right_ticks: bool,
    pub tick_length: f64,
    pub minor_tick_length: f64,
    pub minor_ticks: bool,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            tick_direction: "in".into(),
            show_top_ticks: false,
            show_right_ticks: false,
            tick_length: 3.5,
            minor_tick_length: 2.0,
            minor_ticks: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub show: bool,
    pub color: Color,
    pub alpha: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { show: false, color: Color::hex("#b0b0b0"), alpha: 0.5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    pub truth: Color,
    pub measured: Color,
    /// Ratio panel reference line at 1.
    pub reference: Color,
    /// Hot end of the response matrix colormap.
    pub response: Color,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            truth: Color::hex(TAB_BLUE),
            measured: Color::hex(TAB_ORANGE),
            reference: Color::hex(TAB_BLUE),
            response: Color::hex("#08306b"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Raster resolution of the PNG output.
    pub dpi: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dpi: 100 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Opacity of the fill under the truth and measured steps.
    pub fill_alpha: f64,
    pub step_width: f64,
    /// Marker diameter in points.
    pub marker_size: f64,
    pub error_cap: f64,
    /// Ratio panel height as a fraction of the plotting height.
    pub ratio_fraction: f64,
    pub ratio_y_range: [f64; 2],
    pub ratio_ticks: Vec<f64>,
    /// Labels for `ratio_ticks`; empty strings leave a tick unlabeled.
    pub ratio_tick_labels: Vec<String>,
    /// `"upper right"` or `"upper left"`.
    pub legend_loc: String,
    pub legend_frame: bool,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            fill_alpha: 0.3,
            step_width: 1.5,
            marker_size: 3.5,
            error_cap: 0.0,
            ratio_fraction: 0.25,
            ratio_y_range: [0.0, 2.0],
            ratio_ticks: vec![0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75],
            ratio_tick_labels: ["", "0.5", "", "1.0", "", "1.5", ""]
                .into_iter()
                .map(String::from)
                .collect(),
            legend_loc: "upper right".into(),
            legend_frame: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Cell values are printed when both axes have at most this many bins.
    pub annotate_max_bins: usize,
    pub cell_size: f64,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self { annotate_max_bins: 15, cell_size: 22.0 }
    }
}

impl VizConfig {
    /// Validate values serde cannot check on its own.
    pub fn validate(&self) -> crate::Result<()> {
        let cfg = |msg: String| Err(crate::RenderError::Config(msg));
        if !(self.figure.width > 0.0 && self.figure.height > 0.0) {
            return cfg(format!(
                "figure size must be positive, got {}x{}",
                self.figure.width, self.figure.height
            ));
        }
        if self.output.dpi == 0 {
            return cfg("output.dpi must be positive".into());
        }
        let cmp = &self.comparison;
        if !(cmp.ratio_fraction > 0.0 && cmp.ratio_fraction < 1.0) {
            return cfg(format!(
                "comparison.ratio_fraction must be in (0, 1), got {}",
                cmp.ratio_fraction
            ));
        }
        let [lo, hi] = cmp.ratio_y_range;
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return cfg(format!("comparison.ratio_y_range must be increasing, got [{lo}, {hi}]"));
        }
        if cmp.ratio_tick_labels.len() != cmp.ratio_ticks.len() {
            return cfg(format!(
                "comparison.ratio_tick_labels has {} entries for {} ticks",
                cmp.ratio_tick_labels.len(),
                cmp.ratio_ticks.len()
            ));
        }
        if !matches!(self.axes.tick_direction.as_str(), "in" | "out") {
            return cfg(format!(
                "axes.tick_direction must be 'in' or 'out', got '{}'",
                self.axes.tick_direction
            ));
        }
        Ok(())
    }

    /// Default config serialized as YAML, as a starting point for users.
    pub fn to_yaml(&self) -> crate::Result<String> {
        serde_yaml_ng::to_string(self).map_err(|e| crate::RenderError::Config(e.to_string()))
    }
}

/// Resolve a VizConfig from optional YAML string.
/// Priority: user YAML overrides → theme base config (`theme:` key, default classic).
pub fn resolve_config(user_yaml: Option<&str>) -> crate::Result<VizConfig> {
    let Some(yaml) = user_yaml else {
        return Ok(VizConfig::default());
    };
    let config_err = |e: serde_yaml_ng::Error| crate::RenderError::Config(e.to_string());

    let overlay: Value = serde_yaml_ng::from_str(yaml).map_err(config_err)?;
    let theme = match overlay.get("theme").and_then(Value::as_str) {
        Some(name) => BuiltinTheme::parse(name)
            .ok_or_else(|| crate::RenderError::Config(format!("unknown theme '{name}'")))?,
        None => BuiltinTheme::Classic,
    };

    let mut merged = serde_yaml_ng::to_value(theme.base_config()).map_err(config_err)?;
    merge(&mut merged, overlay);
    let config: VizConfig = serde_yaml_ng::from_value(merged).map_err(config_err)?;
    config.validate()?;
    Ok(config)
}

fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
