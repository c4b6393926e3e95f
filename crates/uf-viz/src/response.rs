//! Response (migration) matrix artifact for one test distribution.

use serde::Serialize;
use uf_core::{Binning, Error, Result};

/// Plot-friendly detector response matrix.
///
/// `matrix[i][j]` is the probability (or count) of truth bin `j` being
/// reconstructed in reco bin `i`.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMatrixArtifact {
    /// Distribution label; output file stem.
    pub distribution: String,
    /// Reco-level bin edges (length = n_reco + 1).
    pub reco_bin_edges: Vec<f64>,
    /// Truth-level bin edges (length = n_truth + 1).
    pub truth_bin_edges: Vec<f64>,
    /// `matrix[reco][truth]`.
    pub matrix: Vec<Vec<f64>>,
    /// Whether columns were normalized to sum to one.
    pub normalised: bool,
    /// Per reco bin: fraction of its content coming from the diagonal truth bin.
    pub purity: Vec<f64>,
    /// Per truth bin: fraction of its content staying in the diagonal reco bin.
    pub stability: Vec<f64>,
}

impl ResponseMatrixArtifact {
    /// Validate shapes, optionally normalize columns, and derive purity/stability
    /// from the raw matrix.
    pub fn new(
        distribution: &str,
        reco: &Binning,
        truth: &Binning,
        matrix: Vec<Vec<f64>>,
        normalise: bool,
    ) -> Result<Self> {
        let n_reco = reco.n_bins();
        let n_truth = truth.n_bins();
        if matrix.len() != n_reco {
            return Err(Error::ShapeMismatch(format!(
                "response has {} reco rows, reco binning defines {}",
                matrix.len(),
                n_reco
            )));
        }
        if let Some((i, row)) = matrix.iter().enumerate().find(|(_, r)| r.len() != n_truth) {
            return Err(Error::ShapeMismatch(format!(
                "response row {} has {} truth columns, truth binning defines {}",
                i,
                row.len(),
                n_truth
            )));
        }

        let mut col_sums = vec![0.0_f64; n_truth];
        for row in &matrix {
            for (sum, v) in col_sums.iter_mut().zip(row) {
                *sum += v;
            }
        }

        let purity = matrix
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let row_sum: f64 = row.iter().sum();
                if row_sum > 0.0 && i < n_truth { row[i] / row_sum } else { 0.0 }
            })
            .collect();
        let stability = (0..n_truth)
            .map(|j| if col_sums[j] > 0.0 && j < n_reco { matrix[j][j] / col_sums[j] } else { 0.0 })
            .collect();

        let matrix = if normalise {
            matrix
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .zip(&col_sums)
                        .map(|(v, &s)| if s > 0.0 { v / s } else { 0.0 })
                        .collect()
                })
                .collect()
        } else {
            matrix
        };

        Ok(Self {
            distribution: distribution.to_string(),
            reco_bin_edges: reco.edges().to_vec(),
            truth_bin_edges: truth.edges().to_vec(),
            matrix,
            normalised: normalise,
            purity,
            stability,
        })
    }

    /// Largest matrix entry (0 for an all-zero matrix).
    pub fn max_value(&self) -> f64 {
        self.matrix.iter().flatten().copied().fold(0.0_f64, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn edges(n: usize) -> Binning {
        Binning::linspace(0.0, n as f64, n).unwrap()
    }

    #[test]
    fn purity_and_stability_from_raw_counts() {
        let matrix = vec![vec![90.0, 5.0, 0.0], vec![5.0, 85.0, 10.0], vec![0.0, 5.0, 90.0]];
        let art = ResponseMatrixArtifact::new("normal", &edges(3), &edges(3), matrix, false)
            .unwrap();
        assert_abs_diff_eq!(art.purity[0], 90.0 / 95.0, epsilon = 1e-12);
        assert_abs_diff_eq!(art.stability[1], 85.0 / 95.0, epsilon = 1e-12);
        assert_eq!(art.max_value(), 90.0);
    }

    #[test]
    fn normalised_columns_sum_to_one() {
        let matrix = vec![vec![80.0, 20.0], vec![20.0, 80.0]];
        let art = ResponseMatrixArtifact::new("gamma", &edges(2), &edges(2), matrix, true).unwrap();
        assert!(art.normalised);
        let col0: f64 = art.matrix.iter().map(|r| r[0]).sum();
        assert_abs_diff_eq!(col0, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(art.purity[0], 0.8, epsilon = 1e-12);
    }

    #[test]
    fn rectangular_shapes_are_checked() {
        let r = ResponseMatrixArtifact::new("x", &edges(2), &edges(3), vec![vec![1.0; 3]], false);
        assert!(matches!(r, Err(Error::ShapeMismatch(_))));
        let r = ResponseMatrixArtifact::new(
            "x",
            &edges(2),
            &edges(3),
            vec![vec![1.0; 3], vec![1.0; 2]],
            false,
        );
        assert!(matches!(r, Err(Error::ShapeMismatch(_))));
    }
}
