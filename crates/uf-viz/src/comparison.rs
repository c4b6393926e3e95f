//! Method comparison artifact: truth, measured and every unfolded method on
//! one binning, scored against truth.
//!
//! The artifact carries everything the two-panel figure needs (step arrays,
//! bin midpoints, ratios, per-method style and score) so the renderer does no
//! numerics of its own.

use serde::Serialize;
use uf_core::{Binning, Error, Histogram, MethodInputs, Result};

use crate::chi2::{SingularPolicy, compute_chi2_with};
use crate::methods::{self, MarkerKind};

/// Schema tag written into every comparison artifact.
pub const SCHEMA_VERSION: &str = "unfolding_comparison_v1";

/// Plot-friendly comparison of all methods for one distribution.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonArtifact {
    /// Schema tag ([`SCHEMA_VERSION`]).
    pub schema_version: String,
    /// Provenance.
    pub meta: ComparisonMeta,
    /// Distribution label; output file stem.
    pub distribution: String,
    /// Bin edges (length = n_bins + 1).
    pub bin_edges: Vec<f64>,
    /// Bin centres (length = n_bins).
    pub bin_midpoints: Vec<f64>,
    /// Truth contents (length = n_bins).
    pub truth: Vec<f64>,
    /// Truth contents with the closing bin repeated (length = n_bins + 1).
    pub truth_steps: Vec<f64>,
    /// Measured contents (length = n_bins).
    pub measured: Vec<f64>,
    /// Measured contents with the closing bin repeated (length = n_bins + 1).
    pub measured_steps: Vec<f64>,
    /// One entry per method present, in method-table order.
    pub methods: Vec<MethodSeries>,
}

/// Provenance block.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonMeta {
    /// Producing tool.
    pub tool: String,
    /// Producing tool version.
    pub tool_version: String,
    /// Method table version used for ordering and styles.
    pub method_table_version: u32,
    /// Policy applied to singular covariances.
    pub singular_policy: SingularPolicy,
}

/// One unfolded method, ready to draw in both panels.
#[derive(Debug, Clone, Serialize)]
pub struct MethodSeries {
    /// Container key (e.g. "IBU4").
    pub label: String,
    /// Display name without the score.
    pub display_name: String,
    /// Display name with the χ²/dof appended.
    pub legend_label: String,
    /// Hex color.
    pub color: String,
    /// Marker shape.
    pub marker: MarkerKind,
    /// χ²/dof against truth.
    pub chi2_dof: f64,
    /// Unfolded contents.
    pub values: Vec<f64>,
    /// Error bar half-lengths.
    pub errors: Vec<f64>,
    /// `values / truth`; `inf`/`nan` where truth is zero.
    pub ratio: Vec<f64>,
    /// `errors / truth`; `inf`/`nan` where truth is zero.
    pub ratio_errors: Vec<f64>,
}

/// Legend text for a method: display name plus its χ²/dof.
pub fn legend_label(display_name: &str, chi2_dof: f64) -> String {
    format!("{display_name} (\u{03C7}\u{00B2}/dof = {chi2_dof:.2})")
}

/// Score every method against truth and assemble the comparison artifact.
///
/// Fails on the first inconsistent method; a distribution is rendered with
/// all of its scores or not at all.
pub fn comparison_artifact(
    inputs: &MethodInputs,
    distribution: &str,
    truth: &Histogram,
    measured: &Histogram,
    binning: &Binning,
    policy: SingularPolicy,
) -> Result<ComparisonArtifact> {
    if distribution.is_empty() {
        return Err(Error::Validation("distribution name must not be empty".into()));
    }
    truth.check_binning(binning, "truth")?;
    measured.check_binning(binning, "measured")?;
    inputs.validate()?;

    let styles = methods::ordered_methods(inputs.values.keys().map(String::as_str))?;
    let n_bins = binning.n_bins();

    let mut series = Vec::with_capacity(styles.len());
    for style in styles {
        let values = &inputs.values[style.label];
        values.check_binning(binning, style.label)?;

        let uncertainty = inputs.uncertainty_for(style.label)?;
        let chi2_dof = compute_chi2_with(values, truth, &uncertainty, policy)?;

        let errors = inputs.error_bars_for(style.label)?;
        if errors.len() != n_bins {
            return Err(Error::ShapeMismatch(format!(
                "{} errors have {} entries, binning defines {} bins",
                style.label,
                errors.len(),
                n_bins
            )));
        }
        let ratio = values.ratio_to(truth)?;
        let ratio_errors = errors.iter().zip(truth.as_slice()).map(|(e, t)| e / t).collect();

        series.push(MethodSeries {
            label: style.label.to_string(),
            display_name: style.display_name.to_string(),
            legend_label: legend_label(style.display_name, chi2_dof),
            color: style.color.to_string(),
            marker: style.marker,
            chi2_dof,
            values: values.as_slice().to_vec(),
            errors,
            ratio,
            ratio_errors,
        });
    }

    Ok(ComparisonArtifact {
        schema_version: SCHEMA_VERSION.to_string(),
        meta: ComparisonMeta {
            tool: "unfoldcmp".to_string(),
            tool_version: uf_core::VERSION.to_string(),
            method_table_version: methods::METHOD_TABLE_VERSION,
            singular_policy: policy,
        },
        distribution: distribution.to_string(),
        bin_edges: binning.edges().to_vec(),
        bin_midpoints: binning.midpoints(),
        truth: truth.as_slice().to_vec(),
        truth_steps: truth.with_closing_bin(),
        measured: measured.as_slice().to_vec(),
        measured_steps: measured.with_closing_bin(),
        methods: series,
    })
}

impl ComparisonArtifact {
    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.truth.len()
    }

    /// Score of a method, if present.
    pub fn chi2_of(&self, label: &str) -> Option<f64> {
        self.methods.iter().find(|m| m.label == label).map(|m| m.chi2_dof)
    }
}
