use approx::assert_abs_diff_eq;
use uf_core::{Covariance, Histogram, Uncertainty};
use uf_viz::chi2::{SingularPolicy, chi_square, compute_chi2};

fn h(v: &[f64]) -> Histogram {
    Histogram::new(v.to_vec())
}

fn correlated_cov() -> Covariance {
    Covariance::from_rows(&[
        vec![4.0, 1.0, 0.5, 0.0],
        vec![1.0, 3.0, 0.2, 0.1],
        vec![0.5, 0.2, 2.0, 0.3],
        vec![0.0, 0.1, 0.3, 1.5],
    ])
    .unwrap()
}

fn permute_vec(v: &[f64], perm: &[usize]) -> Vec<f64> {
    perm.iter().map(|&i| v[i]).collect()
}

fn permute_cov(c: &Covariance, perm: &[usize]) -> Covariance {
    let rows = c.to_rows();
    let permuted: Vec<Vec<f64>> =
        perm.iter().map(|&i| perm.iter().map(|&j| rows[i][j]).collect()).collect();
    Covariance::from_rows(&permuted).unwrap()
}

#[test]
fn identity_covariance_of_identical_histograms_is_zero() {
    for contents in [vec![1.0], vec![0.0, 5.0, 2.5], vec![10.0; 20]] {
        let hist = Histogram::new(contents);
        let cov = Uncertainty::Covariance(Covariance::identity(hist.len()));
        assert_eq!(compute_chi2(&hist, &hist, &cov).unwrap(), 0.0);
    }
}

#[test]
fn flat_example_scores_zero() {
    let chi2 = compute_chi2(
        &h(&[2.0, 2.0, 2.0, 2.0]),
        &h(&[2.0, 2.0, 2.0, 2.0]),
        &Uncertainty::Errors(vec![1.0; 4]),
    )
    .unwrap();
    assert_eq!(format!("{chi2:.4}"), "0.0000");
}

#[test]
fn last_bin_example_scores_one_third() {
    let cov = Uncertainty::Covariance(Covariance::from_errors(&[1.0, 1.0, 1.0]));
    let chi2 = compute_chi2(&h(&[1.0, 2.0, 4.0]), &h(&[1.0, 2.0, 3.0]), &cov).unwrap();
    assert_eq!(chi2, 0.3333);
}

#[test]
fn scaling_covariance_scales_chi_square_inversely() {
    let unfolded = h(&[10.0, 12.0, 7.0, 3.0]);
    let truth = h(&[9.0, 13.0, 8.5, 2.0]);
    let cov = correlated_cov();
    let base =
        chi_square(&unfolded, &truth, &Uncertainty::Covariance(cov.clone()), SingularPolicy::Reject)
            .unwrap();
    for k in [0.5, 2.0, 10.0] {
        let scaled = chi_square(
            &unfolded,
            &truth,
            &Uncertainty::Covariance(cov.scaled(k)),
            SingularPolicy::Reject,
        )
        .unwrap();
        assert_abs_diff_eq!(scaled, base / k, epsilon = 1e-9);
    }
}

#[test]
fn consistent_permutation_preserves_score() {
    let unfolded = [10.0, 12.0, 7.0, 3.0];
    let truth = [9.0, 13.0, 8.5, 2.0];
    let cov = correlated_cov();
    let perm = [2, 0, 3, 1];

    let base = chi_square(
        &h(&unfolded),
        &h(&truth),
        &Uncertainty::Covariance(cov.clone()),
        SingularPolicy::Reject,
    )
    .unwrap();
    let permuted = chi_square(
        &h(&permute_vec(&unfolded, &perm)),
        &h(&permute_vec(&truth, &perm)),
        &Uncertainty::Covariance(permute_cov(&cov, &perm)),
        SingularPolicy::Reject,
    )
    .unwrap();
    assert_abs_diff_eq!(base, permuted, epsilon = 1e-9);
}

#[test]
fn mismatched_permutation_changes_score() {
    let unfolded = [10.0, 12.0, 7.0, 3.0];
    let truth = [9.0, 13.0, 8.5, 2.0];
    let cov = correlated_cov();
    let perm = [2, 0, 3, 1];

    let base = chi_square(
        &h(&unfolded),
        &h(&truth),
        &Uncertainty::Covariance(cov.clone()),
        SingularPolicy::Reject,
    )
    .unwrap();
    // Residual permuted, covariance left in place.
    let wrong = chi_square(
        &h(&permute_vec(&unfolded, &perm)),
        &h(&permute_vec(&truth, &perm)),
        &Uncertainty::Covariance(cov),
        SingularPolicy::Reject,
    )
    .unwrap();
    assert!((base - wrong).abs() > 1e-6, "base={base} wrong={wrong}");
}

#[test]
fn covariance_for_another_binning_is_rejected() {
    let r = compute_chi2(
        &h(&[1.0, 2.0, 3.0]),
        &h(&[1.0, 2.0, 3.0]),
        &Uncertainty::Covariance(correlated_cov()),
    );
    assert!(matches!(r, Err(uf_core::Error::ShapeMismatch(_))));
}

#[test]
fn scores_are_non_negative() {
    let cov = Uncertainty::Covariance(correlated_cov());
    for (u, t) in [
        ([0.0, 0.0, 0.0, 0.0], [5.0, 1.0, 2.0, 3.0]),
        ([100.0, 0.0, 3.0, 1.0], [1.0, 1.0, 1.0, 1.0]),
    ] {
        assert!(compute_chi2(&h(&u), &h(&t), &cov).unwrap() >= 0.0);
    }
}
