use crate::color::Color;
use crate::config::*;

/// Built-in theme presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTheme {
    /// Matplotlib-like look of the reference comparison plots.
    Classic,
    /// Print-ready: larger fonts, high DPI, boxed ticks.
    Paper,
    Minimal,
}

impl BuiltinTheme {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(Self::Classic),
            "paper" => Some(Self::Paper),
            "minimal" => Some(Self::Minimal),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Paper => "paper",
            Self::Minimal => "minimal",
        }
    }

    pub fn base_config(self) -> VizConfig {
        match self {
            Self::Classic => classic(),
            Self::Paper => paper(),
            Self::Minimal => minimal(),
        }
    }
}

fn classic() -> VizConfig {
    VizConfig {
        theme: BuiltinTheme::Classic.as_str().into(),
        figure: FigureConfig::default(),
        font: FontConfig::default(),
        axes: AxesConfig::default(),
        grid: GridConfig::default(),
        colors: ColorsConfig::default(),
        output: OutputConfig::default(),
        comparison: ComparisonConfig::default(),
        response: ResponseConfig::default(),
    }
}

fn paper() -> VizConfig {
    VizConfig {
        theme: BuiltinTheme::Paper.as_str().into(),
        font: FontConfig { size: 11.0, label_size: 12.0, tick_size: 10.0 },
        axes: AxesConfig {
            tick_direction: "in".into(),
            show_top_ticks: true,
            show_right_ticks: true,
            tick_length: 5.0,
            minor_tick_length: 3.0,
            minor_ticks: true,
        },
        output: OutputConfig { dpi: 300 },
        comparison: ComparisonConfig { marker_size: 4.0, ..ComparisonConfig::default() },
        ..classic()
    }
}

fn minimal() -> VizConfig {
    VizConfig {
        theme: BuiltinTheme::Minimal.as_str().into(),
        font: FontConfig { size: 9.0, label_size: 10.0, tick_size: 8.0 },
        axes: AxesConfig {
            tick_direction: "out".into(),
            show_top_ticks: false,
            show_right_ticks: false,
            tick_length: 4.0,
            minor_tick_length: 2.0,
            minor_ticks: false,
        },
        grid: GridConfig { show: true, color: Color::hex("#cbd5e1"), alpha: 0.55 },
        comparison: ComparisonConfig { legend_frame: false, ..ComparisonConfig::default() },
        ..classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for theme in [BuiltinTheme::Classic, BuiltinTheme::Paper, BuiltinTheme::Minimal] {
            assert_eq!(BuiltinTheme::parse(theme.as_str()), Some(theme));
            assert_eq!(theme.base_config().theme, theme.as_str());
        }
        assert_eq!(BuiltinTheme::parse("PAPER"), Some(BuiltinTheme::Paper));
        assert_eq!(BuiltinTheme::parse("atlas"), None);
    }

    #[test]
    fn every_theme_validates() {
        for theme in [BuiltinTheme::Classic, BuiltinTheme::Paper, BuiltinTheme::Minimal] {
            theme.base_config().validate().unwrap();
        }
    }
}
