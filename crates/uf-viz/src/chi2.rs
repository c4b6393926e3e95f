//! Covariance-aware χ² scoring of unfolded spectra against truth.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use uf_core::{Error, Histogram, Result, Uncertainty};

/// Decimal places kept in a displayed χ²/dof.
pub const CHI2_DECIMALS: i32 = 4;

/// Singular values below this (relative to the largest) are dropped by the pseudo-inverse.
const PINV_RCOND: f64 = 1e-12;

/// What to do when a covariance cannot be inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SingularPolicy {
    /// Fail with [`Error::SingularCovariance`].
    #[default]
    Reject,
    /// Use the Moore-Penrose pseudo-inverse and log a warning.
    PseudoInverse,
}

impl SingularPolicy {
    /// Stable name, as accepted by [`SingularPolicy::parse`].
    pub fn as_str(&self) -> &'static str {
        match self {
            SingularPolicy::Reject => "reject",
            SingularPolicy::PseudoInverse => "pseudo-inverse",
        }
    }

    /// Parse `reject` / `pseudo-inverse`.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "reject" => Ok(Self::Reject),
            "pseudo-inverse" | "pinv" => Ok(Self::PseudoInverse),
            other => Err(Error::Validation(format!(
                "unknown singular policy '{other}' (expected 'reject' or 'pseudo-inverse')"
            ))),
        }
    }
}

/// χ²/dof of `unfolded` against `truth`, rounded to [`CHI2_DECIMALS`].
///
/// Singular covariances are rejected.
pub fn compute_chi2(
    unfolded: &Histogram,
    truth: &Histogram,
    uncertainty: &Uncertainty,
) -> Result<f64> {
    compute_chi2_with(unfolded, truth, uncertainty, SingularPolicy::Reject)
}

/// χ²/dof with an explicit singular-covariance policy.
pub fn compute_chi2_with(
    unfolded: &Histogram,
    truth: &Histogram,
    uncertainty: &Uncertainty,
    policy: SingularPolicy,
) -> Result<f64> {
    let chi2 = chi_square(unfolded, truth, uncertainty, policy)?;
    Ok(round_to(chi2 / unfolded.len() as f64, CHI2_DECIMALS))
}

/// Raw `r · Σ⁻¹ · rᵀ` with `r = unfolded − truth`, not normalized or rounded.
pub fn chi_square(
    unfolded: &Histogram,
    truth: &Histogram,
    uncertainty: &Uncertainty,
    policy: SingularPolicy,
) -> Result<f64> {
    let n = unfolded.len();
    if n == 0 {
        return Err(Error::ShapeMismatch("cannot score an empty histogram".into()));
    }
    if truth.len() != n {
        return Err(Error::ShapeMismatch(format!(
            "unfolded has {} bins, truth has {}",
            n,
            truth.len()
        )));
    }
    if uncertainty.dim() != n {
        return Err(Error::ShapeMismatch(format!(
            "unfolded has {} bins, uncertainty has dimension {}",
            n,
            uncertainty.dim()
        )));
    }

    for (name, hist) in [("unfolded", unfolded), ("truth", truth)] {
        if let Some((i, v)) = hist.as_slice().iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(Error::Validation(format!("{name} bin {i} is not finite ({v})")));
        }
    }

    let residual =
        DVector::from_iterator(n, unfolded.as_slice().iter().zip(truth.as_slice()).map(|(u, t)| u - t));

    let chi2 = match uncertainty {
        Uncertainty::Errors(errors) => diagonal_chi_square(&residual, errors, policy)?,
        Uncertainty::Covariance(cov) => {
            let inv = invert(cov.matrix(), policy)?;
            residual.dot(&(inv * &residual))
        }
    };

    if !chi2.is_finite() {
        return Err(Error::SingularCovariance(format!("chi-square is not finite ({chi2})")));
    }
    // Round-off on a positive semi-definite inverse can dip just below zero.
    let tol = 1e-9 * (1.0 + residual.norm_squared());
    if chi2 < -tol {
        return Err(Error::SingularCovariance(format!(
            "covariance is not positive definite (chi-square = {chi2})"
        )));
    }
    Ok(chi2.max(0.0))
}

fn diagonal_chi_square(
    residual: &DVector<f64>,
    errors: &[f64],
    policy: SingularPolicy,
) -> Result<f64> {
    let mut chi2 = 0.0;
    for (i, (&r, &e)) in residual.iter().zip(errors).enumerate() {
        let var = e * e;
        if var == 0.0 || !var.is_finite() {
            match policy {
                SingularPolicy::Reject => {
                    return Err(Error::SingularCovariance(format!(
                        "error of bin {i} is {e}; diagonal covariance is not invertible"
                    )));
                }
                SingularPolicy::PseudoInverse => {
                    tracing::warn!(bin = i, error = e, "dropping bin with zero variance from chi-square");
                    continue;
                }
            }
        }
        chi2 += r * r / var;
    }
    Ok(chi2)
}

fn invert(matrix: &DMatrix<f64>, policy: SingularPolicy) -> Result<DMatrix<f64>> {
    let direct = matrix.clone().lu().try_inverse().filter(|inv| inv.iter().all(|v| v.is_finite()));
    if let Some(inv) = direct {
        return Ok(inv);
    }
    match policy {
        SingularPolicy::Reject => Err(Error::SingularCovariance(format!(
            "{}x{} covariance matrix is not invertible",
            matrix.nrows(),
            matrix.ncols()
        ))),
        SingularPolicy::PseudoInverse => {
            let scale = matrix.amax().max(f64::MIN_POSITIVE);
            tracing::warn!(dim = matrix.nrows(), "covariance is singular; using pseudo-inverse");
            matrix
                .clone()
                .pseudo_inverse(PINV_RCOND * scale)
                .map_err(|e| Error::SingularCovariance(format!("pseudo-inverse failed: {e}")))
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
