//! Common data types for unfolding comparisons

use std::collections::BTreeMap;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Bin edges shared by truth, measured and every unfolded histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Binning {
    edges: Vec<f64>,
}

impl Binning {
    /// Build from explicit edges (at least two, finite, strictly increasing).
    pub fn new(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::Validation(format!(
                "binning needs at least 2 edges, got {}",
                edges.len()
            )));
        }
        if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
            return Err(Error::Validation(format!("non-finite bin edge: {bad}")));
        }
        for (i, w) in edges.windows(2).enumerate() {
            if w[1] <= w[0] {
                return Err(Error::Validation(format!(
                    "bin edges must be strictly increasing: edge[{}]={} >= edge[{}]={}",
                    i,
                    w[0],
                    i + 1,
                    w[1]
                )));
            }
        }
        Ok(Self { edges })
    }

    /// `bins` equal-width bins over `[min, max]`.
    pub fn linspace(min: f64, max: f64, bins: usize) -> Result<Self> {
        if bins == 0 {
            return Err(Error::Validation("bins must be > 0".into()));
        }
        let step = (max - min) / bins as f64;
        let mut edges: Vec<f64> = (0..bins).map(|i| min + step * i as f64).collect();
        edges.push(max);
        Self::new(edges)
    }

    /// Bin edges (length = n_bins + 1).
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// Lower edge of the first bin.
    pub fn first_edge(&self) -> f64 {
        self.edges[0]
    }

    /// Upper edge of the last bin.
    pub fn last_edge(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// Bin widths (length = n_bins).
    pub fn widths(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Bin centres (length = n_bins).
    pub fn midpoints(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| w[0] + (w[1] - w[0]) / 2.0).collect()
    }
}

impl TryFrom<Vec<f64>> for Binning {
    type Error = Error;

    fn try_from(edges: Vec<f64>) -> Result<Self> {
        Self::new(edges)
    }
}

impl From<Binning> for Vec<f64> {
    fn from(b: Binning) -> Self {
        b.edges
    }
}

/// Ordered bin contents over a [`Binning`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Histogram {
    contents: Vec<f64>,
}

impl Histogram {
    /// Wrap bin contents.
    pub fn new(contents: Vec<f64>) -> Self {
        Self { contents }
    }

    /// Build from a flow-inclusive layout `[underflow, bin_1..bin_n, overflow]`.
    ///
    /// With `include_flow = false` the first and last entries are dropped.
    pub fn from_flow_layout(contents: Vec<f64>, include_flow: bool) -> Result<Self> {
        if contents.len() < 2 {
            return Err(Error::ShapeMismatch(format!(
                "flow layout needs underflow and overflow entries, got {} entries",
                contents.len()
            )));
        }
        if include_flow {
            return Ok(Self { contents });
        }
        let n = contents.len();
        Ok(Self { contents: contents[1..n - 1].to_vec() })
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// True if there are no bins.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Bin contents.
    pub fn as_slice(&self) -> &[f64] {
        &self.contents
    }

    /// Contents with the last bin repeated, one value per edge, so a
    /// post-step drawn over the edges closes at the final edge.
    pub fn with_closing_bin(&self) -> Vec<f64> {
        let mut steps = self.contents.clone();
        if let Some(&last) = self.contents.last() {
            steps.push(last);
        }
        steps
    }

    /// Bin-by-bin `self / denom`. Zero denominators follow IEEE semantics.
    pub fn ratio_to(&self, denom: &Histogram) -> Result<Vec<f64>> {
        if self.len() != denom.len() {
            return Err(Error::ShapeMismatch(format!(
                "ratio numerator has {} bins, denominator has {}",
                self.len(),
                denom.len()
            )));
        }
        Ok(self.contents.iter().zip(&denom.contents).map(|(n, d)| n / d).collect())
    }

    /// Check that the histogram has one content per bin of `binning`.
    pub fn check_binning(&self, binning: &Binning, what: &str) -> Result<()> {
        if self.len() != binning.n_bins() {
            return Err(Error::ShapeMismatch(format!(
                "{what} has {} bins, binning defines {}",
                self.len(),
                binning.n_bins()
            )));
        }
        Ok(())
    }
}

impl From<Vec<f64>> for Histogram {
    fn from(contents: Vec<f64>) -> Self {
        Self::new(contents)
    }
}

/// Square covariance matrix (row-major rows on the wire).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Covariance {
    matrix: DMatrix<f64>,
}

impl Covariance {
    /// Build from rows; every row must have as many entries as there are rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(Error::ShapeMismatch(format!(
                    "covariance row {} has length {} but matrix has {} rows",
                    i,
                    row.len(),
                    n
                )));
            }
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Ok(Self { matrix: DMatrix::from_row_slice(n, n, &flat) })
    }

    /// Identity covariance of dimension `n`.
    pub fn identity(n: usize) -> Self {
        Self { matrix: DMatrix::identity(n, n) }
    }

    /// Diagonal covariance with `Σᵢᵢ = errorᵢ²`.
    pub fn from_errors(errors: &[f64]) -> Self {
        let n = errors.len();
        let mut matrix = DMatrix::zeros(n, n);
        for (i, e) in errors.iter().enumerate() {
            matrix[(i, i)] = e * e;
        }
        Self { matrix }
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// Underlying matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Square root of the diagonal.
    pub fn diagonal_errors(&self) -> Vec<f64> {
        self.matrix.diagonal().iter().map(|v| v.sqrt()).collect()
    }

    /// Covariance multiplied by `k`.
    pub fn scaled(&self, k: f64) -> Self {
        Self { matrix: &self.matrix * k }
    }

    /// Rows as nested vectors.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.matrix.row_iter().map(|r| r.iter().copied().collect()).collect()
    }
}

impl TryFrom<Vec<Vec<f64>>> for Covariance {
    type Error = Error;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_rows(&rows)
    }
}

impl From<Covariance> for Vec<Vec<f64>> {
    fn from(c: Covariance) -> Self {
        c.to_rows()
    }
}

/// Uncertainty attached to one method's unfolded result.
#[derive(Debug, Clone, PartialEq)]
pub enum Uncertainty {
    /// Full covariance matrix.
    Covariance(Covariance),
    /// Per-bin standard deviations (diagonal covariance).
    Errors(Vec<f64>),
}

impl Uncertainty {
    /// Dimension of the uncertainty (bins covered).
    pub fn dim(&self) -> usize {
        match self {
            Uncertainty::Covariance(c) => c.dim(),
            Uncertainty::Errors(e) => e.len(),
        }
    }

    /// Per-bin errors, taking the sqrt-diagonal of a covariance.
    pub fn errors(&self) -> Vec<f64> {
        match self {
            Uncertainty::Covariance(c) => c.diagonal_errors(),
            Uncertainty::Errors(e) => e.clone(),
        }
    }
}

/// The keyed containers the driver hands over for one distribution.
///
/// Every key of `values` must be present in `errors` or `covariances`, and
/// neither uncertainty container may name a method absent from `values`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodInputs {
    /// Unfolded histogram per method label.
    pub values: BTreeMap<String, Histogram>,
    /// Per-bin errors per method label.
    #[serde(default)]
    pub errors: BTreeMap<String, Vec<f64>>,
    /// Full covariance per method label.
    #[serde(default)]
    pub covariances: BTreeMap<String, Covariance>,
}

impl MethodInputs {
    /// Check the key invariant between the three containers.
    pub fn validate(&self) -> Result<()> {
        for method in self.values.keys() {
            if !self.errors.contains_key(method) && !self.covariances.contains_key(method) {
                return Err(Error::MissingMethodKey {
                    method: method.clone(),
                    container: "errors or covariances".into(),
                });
            }
        }
        for method in self.errors.keys().chain(self.covariances.keys()) {
            if !self.values.contains_key(method) {
                return Err(Error::MissingMethodKey {
                    method: method.clone(),
                    container: "values".into(),
                });
            }
        }
        Ok(())
    }

    /// Uncertainty used for scoring: covariance if present, else the error vector.
    pub fn uncertainty_for(&self, method: &str) -> Result<Uncertainty> {
        if let Some(cov) = self.covariances.get(method) {
            return Ok(Uncertainty::Covariance(cov.clone()));
        }
        self.errors.get(method).map(|e| Uncertainty::Errors(e.clone())).ok_or_else(|| {
            Error::MissingMethodKey {
                method: method.to_string(),
                container: "errors or covariances".into(),
            }
        })
    }

    /// Error bars: explicit errors if present, else sqrt of the covariance diagonal.
    pub fn error_bars_for(&self, method: &str) -> Result<Vec<f64>> {
        if let Some(e) = self.errors.get(method) {
            return Ok(e.clone());
        }
        self.covariances.get(method).map(Covariance::diagonal_errors).ok_or_else(|| {
            Error::MissingMethodKey {
                method: method.to_string(),
                container: "errors or covariances".into(),
            }
        })
    }
}

/// Normalize a reco×truth response matrix column-wise by the truth spectrum.
///
/// `response[i][j]` counts events generated in truth bin `j` and reconstructed
/// in reco bin `i`; the result is the probability of that migration. Columns
/// with zero truth become zero.
pub fn normalize_response(response: &[Vec<f64>], truth: &[f64]) -> Result<Vec<Vec<f64>>> {
    for (i, row) in response.iter().enumerate() {
        if row.len() != truth.len() {
            return Err(Error::ShapeMismatch(format!(
                "response row {} has {} truth columns, truth has {} bins",
                i,
                row.len(),
                truth.len()
            )));
        }
    }
    Ok(response
        .iter()
        .map(|row| {
            row.iter().zip(truth).map(|(&v, &t)| if t != 0.0 { v / t } else { 0.0 }).collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn binning_midpoints_and_widths() {
        let b = Binning::linspace(0.0, 10.0, 4).unwrap();
        assert_eq!(b.n_bins(), 4);
        assert_eq!(b.widths(), vec![2.5; 4]);
        assert_eq!(b.midpoints(), vec![1.25, 3.75, 6.25, 8.75]);
        assert_eq!(b.first_edge(), 0.0);
        assert_eq!(b.last_edge(), 10.0);
    }

    #[test]
    fn binning_rejects_non_increasing() {
        assert!(Binning::new(vec![0.0, 1.0, 1.0]).is_err());
        assert!(Binning::new(vec![0.0]).is_err());
        assert!(Binning::new(vec![0.0, f64::NAN]).is_err());
        assert!(Binning::linspace(0.0, 1.0, 0).is_err());
    }

    #[test]
    fn binning_deserializes_with_validation() {
        let ok: Binning = serde_json::from_str("[0.0, 1.0, 3.0]").unwrap();
        assert_eq!(ok.n_bins(), 2);
        assert!(serde_json::from_str::<Binning>("[2.0, 1.0]").is_err());
    }

    #[test]
    fn closing_bin_repeats_last_content() {
        let h = Histogram::new(vec![1.0, 4.0, 2.0]);
        assert_eq!(h.with_closing_bin(), vec![1.0, 4.0, 2.0, 2.0]);
        assert!(Histogram::default().with_closing_bin().is_empty());
    }

    #[test]
    fn flow_layout_strips_under_and_overflow() {
        let h = Histogram::from_flow_layout(vec![7.0, 1.0, 2.0, 3.0, 9.0], false).unwrap();
        assert_eq!(h.as_slice(), &[1.0, 2.0, 3.0]);
        let with_flow = Histogram::from_flow_layout(vec![7.0, 1.0, 9.0], true).unwrap();
        assert_eq!(with_flow.len(), 3);
        assert!(matches!(
            Histogram::from_flow_layout(vec![1.0], false),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn ratio_follows_ieee_on_zero_truth() {
        let num = Histogram::new(vec![2.0, 1.0, 0.0]);
        let den = Histogram::new(vec![1.0, 0.0, 0.0]);
        let r = num.ratio_to(&den).unwrap();
        assert_eq!(r[0], 2.0);
        assert!(r[1].is_infinite());
        assert!(r[2].is_nan());
    }

    #[test]
    fn covariance_from_errors_squares_diagonal() {
        let c = Covariance::from_errors(&[2.0, 3.0]);
        assert_eq!(c.to_rows(), vec![vec![4.0, 0.0], vec![0.0, 9.0]]);
        assert_eq!(c.diagonal_errors(), vec![2.0, 3.0]);
    }

    #[test]
    fn covariance_rejects_ragged_rows() {
        let r = Covariance::from_rows(&[vec![1.0, 0.0], vec![0.0]]);
        assert!(matches!(r, Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn covariance_roundtrips_as_rows() {
        let c: Covariance = serde_json::from_str("[[1.0, 0.5], [0.5, 2.0]]").unwrap();
        assert_eq!(c.dim(), 2);
        assert_abs_diff_eq!(c.matrix()[(0, 1)], 0.5);
        assert_eq!(serde_json::to_string(&c).unwrap(), "[[1.0,0.5],[0.5,2.0]]");
    }

    fn inputs() -> MethodInputs {
        let mut m = MethodInputs::default();
        m.values.insert("MI".into(), Histogram::new(vec![1.0, 2.0]));
        m.values.insert("SA".into(), Histogram::new(vec![1.0, 2.0]));
        m.errors.insert("MI".into(), vec![0.5, 0.5]);
        m.errors.insert("SA".into(), vec![0.1, 0.1]);
        m.covariances.insert("SA".into(), Covariance::from_errors(&[3.0, 4.0]));
        m
    }

    #[test]
    fn scoring_prefers_covariance_bars_prefer_errors() {
        let m = inputs();
        m.validate().unwrap();
        assert!(matches!(m.uncertainty_for("SA").unwrap(), Uncertainty::Covariance(_)));
        assert!(matches!(m.uncertainty_for("MI").unwrap(), Uncertainty::Errors(_)));
        assert_eq!(m.error_bars_for("SA").unwrap(), vec![0.1, 0.1]);
    }

    #[test]
    fn error_bars_fall_back_to_covariance_diagonal() {
        let mut m = inputs();
        m.errors.remove("SA");
        assert_eq!(m.error_bars_for("SA").unwrap(), vec![3.0, 4.0]);
    }

    #[test]
    fn validate_flags_missing_keys_both_ways() {
        let mut m = inputs();
        m.values.insert("HYB".into(), Histogram::new(vec![1.0, 2.0]));
        assert!(matches!(m.validate(), Err(Error::MissingMethodKey { method, .. }) if method == "HYB"));

        let mut m = inputs();
        m.errors.insert("SVD".into(), vec![1.0, 1.0]);
        assert!(matches!(
            m.validate(),
            Err(Error::MissingMethodKey { method, container }) if method == "SVD" && container == "values"
        ));
    }

    #[test]
    fn normalize_response_divides_by_truth_columns() {
        let response = vec![vec![8.0, 1.0, 0.0], vec![2.0, 9.0, 0.0]];
        let truth = vec![10.0, 10.0, 0.0];
        let n = normalize_response(&response, &truth).unwrap();
        assert_abs_diff_eq!(n[0][0] + n[1][0], 1.0);
        assert_abs_diff_eq!(n[0][1] + n[1][1], 1.0);
        assert_eq!(n[0][2], 0.0);
        assert!(normalize_response(&response, &[1.0]).is_err());
    }
}
