//! Collaborator traits
//!
//! Data generation and the unfolding solvers live outside this workspace.
//! These traits describe what the comparison pipeline needs from them, so a
//! driver can plug in real solvers and tests can plug in fixed ones.

use serde::{Deserialize, Serialize};

use crate::types::{Covariance, Histogram, MethodInputs};
use crate::{Error, Result};

/// Inputs shared by every unfolding method for one distribution.
#[derive(Debug, Clone)]
pub struct UnfoldingProblem {
    /// Response matrix `[reco][truth]`, normalized or raw as the solver expects.
    pub response: Vec<Vec<f64>>,
    /// Measured (reco-level) histogram.
    pub measured: Histogram,
    /// Truth histogram, for solvers that use it as a prior.
    pub truth: Histogram,
}

/// What an unfolding method returns.
#[derive(Debug, Clone, Default)]
pub struct UnfoldingOutcome {
    /// Unfolded histogram.
    pub values: Histogram,
    /// Per-bin errors, if the solver provides them.
    pub errors: Option<Vec<f64>>,
    /// Full covariance, if the solver provides it.
    pub covariance: Option<Covariance>,
}

/// A black-box unfolding solver (matrix inversion, IBU, SVD, bin-by-bin, QUBO annealing, ...).
pub trait Unfolder {
    /// Method label as used in the method table (e.g. "IBU4").
    fn label(&self) -> &str;

    /// Unfold `problem.measured`.
    fn unfold(&self, problem: &UnfoldingProblem) -> Result<UnfoldingOutcome>;
}

/// Parameters for synthesizing one test distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Distribution family (e.g. "normal", "breit-wigner").
    pub distribution: String,
    /// Number of bins.
    pub bins: usize,
    /// Lower edge of the histogram range.
    pub min_bin: f64,
    /// Upper edge of the histogram range.
    pub max_bin: f64,
    /// Number of generated events.
    pub samples: usize,
    /// Shift applied by the detector model.
    pub bias: f64,
    /// Gaussian smearing width of the detector model.
    pub smearing: f64,
    /// Reconstruction efficiency.
    pub efficiency: f64,
}

/// Generator output.
#[derive(Debug, Clone)]
pub struct GeneratedDistribution {
    /// Truth histogram.
    pub truth: Histogram,
    /// Measured histogram.
    pub measured: Histogram,
    /// Raw response counts `[reco][truth]`.
    pub response: Vec<Vec<f64>>,
}

/// Source of synthetic truth/measured/response triples.
pub trait DistributionGenerator {
    /// Generate one distribution.
    fn generate(&self, request: &GenerationRequest) -> Result<GeneratedDistribution>;
}

impl MethodInputs {
    /// Run every unfolder and file its outcome under its label.
    pub fn collect(unfolders: &[&dyn Unfolder], problem: &UnfoldingProblem) -> Result<Self> {
        let mut inputs = MethodInputs::default();
        for unfolder in unfolders {
            let label = unfolder.label().to_string();
            if inputs.values.contains_key(&label) {
                return Err(Error::Validation(format!("duplicate unfolder label '{label}'")));
            }
            let outcome = unfolder.unfold(problem)?;
            if outcome.errors.is_none() && outcome.covariance.is_none() {
                return Err(Error::MissingMethodKey {
                    method: label,
                    container: "errors or covariances".into(),
                });
            }
            if let Some(errors) = outcome.errors {
                inputs.errors.insert(label.clone(), errors);
            }
            if let Some(cov) = outcome.covariance {
                inputs.covariances.insert(label.clone(), cov);
            }
            inputs.values.insert(label, outcome.values);
        }
        Ok(inputs)
    }
}
