//! Static style table for the unfolding methods under comparison.
//!
//! Table order is the plot and legend order. Supporting a new method means
//! adding a row here; bump [`METHOD_TABLE_VERSION`] whenever rows are added,
//! removed or reordered.

use serde::{Deserialize, Serialize};
use uf_core::{Error, Result};

/// Version of [`METHOD_TABLE`], stamped into comparison artifacts.
pub const METHOD_TABLE_VERSION: u32 = 1;

/// Marker drawn at each bin midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Filled circle
    Circle,
    /// Filled square
    Square,
    /// Upward triangle
    Triangle,
    /// Diamond
    Diamond,
    /// Five-pointed star
    Star,
}

/// Fixed presentation of one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodStyle {
    /// Key used in the driver's containers.
    pub label: &'static str,
    /// Legend text before the score.
    pub display_name: &'static str,
    /// Hex color.
    pub color: &'static str,
    /// Marker at each bin midpoint.
    pub marker: MarkerKind,
}

/// All known methods, in priority order.
pub const METHOD_TABLE: &[MethodStyle] = &[
    MethodStyle {
        label: "MI",
        display_name: "RooUnfold (MI)",
        color: "#008000",
        marker: MarkerKind::Square,
    },
    MethodStyle {
        label: "IBU4",
        display_name: "RooUnfold (IBU)",
        color: "#ff0000",
        marker: MarkerKind::Circle,
    },
    MethodStyle {
        label: "SVD",
        display_name: "RooUnfold (SVD)",
        color: "#8c564b",
        marker: MarkerKind::Diamond,
    },
    MethodStyle {
        label: "B2B",
        display_name: "RooUnfold (B2B)",
        color: "#17becf",
        marker: MarkerKind::Triangle,
    },
    MethodStyle {
        label: "SA",
        display_name: "QUnfold (SIM)",
        color: "#800080",
        marker: MarkerKind::Star,
    },
    MethodStyle {
        label: "HYB",
        display_name: "QUnfold (HYB)",
        color: "#ffa500",
        marker: MarkerKind::Star,
    },
];

/// Look up a method by label.
pub fn method_style(label: &str) -> Option<&'static MethodStyle> {
    METHOD_TABLE.iter().find(|m| m.label == label)
}

/// Styles for `labels`, in table order. Any unknown label is an error.
pub fn ordered_methods<'a, I>(labels: I) -> Result<Vec<&'static MethodStyle>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut present = Vec::new();
    for label in labels {
        let style = method_style(label).ok_or_else(|| Error::UnknownMethod(label.to_string()))?;
        present.push(style.label);
    }
    Ok(METHOD_TABLE.iter().filter(|m| present.contains(&m.label)).collect())
}
