use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use uf_core::{Binning, Covariance, Histogram, MethodInputs};
use uf_viz::{ComparisonArtifact, ResponseMatrixArtifact, SingularPolicy, comparison_artifact};
use uf_viz_render::config::VizConfig;
use uf_viz_render::{
    render_comparison, render_comparison_svg, save_comparison, save_distribution, save_response,
};

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("uf_viz_render_{}_{}_{}", std::process::id(), nanos, name));
    p
}

fn read_bytes(path: &PathBuf) -> Vec<u8> {
    std::fs::read(path).unwrap_or_else(|e| panic!("read {}: {}", path.display(), e))
}

fn inputs(n: usize, methods: &[&str]) -> MethodInputs {
    let mut values = BTreeMap::new();
    let mut errors = BTreeMap::new();
    let mut covariances = BTreeMap::new();
    for (k, &m) in methods.iter().enumerate() {
        let contents: Vec<f64> = (0..n).map(|i| 10.0 + i as f64 + k as f64 * 0.5).collect();
        values.insert(m.to_string(), Histogram::new(contents));
        if m == "SA" {
            covariances.insert(m.to_string(), Covariance::from_errors(&vec![2.0; n]));
        } else {
            errors.insert(m.to_string(), vec![1.5; n]);
        }
    }
    MethodInputs { values, errors, covariances }
}

fn artifact(name: &str, truth: Vec<f64>, methods: &[&str]) -> ComparisonArtifact {
    let n = truth.len();
    let binning = Binning::linspace(-5.0, 5.0, n).unwrap();
    let measured = Histogram::new(truth.iter().map(|t| t * 0.9).collect());
    comparison_artifact(
        &inputs(n, methods),
        name,
        &Histogram::new(truth),
        &measured,
        &binning,
        SingularPolicy::Reject,
    )
    .unwrap()
}

#[test]
fn identical_inputs_give_byte_identical_files() {
    let art = artifact("normal", vec![10.0, 12.0, 14.0, 11.0], &["MI", "IBU4", "SA"]);
    let config = VizConfig::default();
    let dir_a = tmp_dir("det_a");
    let dir_b = tmp_dir("det_b");

    let a = save_comparison(&art, &dir_a, &config, true).unwrap();
    let b = save_comparison(&art, &dir_b, &config, true).unwrap();

    assert_eq!(read_bytes(&a.png), read_bytes(&b.png));
    assert_eq!(read_bytes(&a.pdf), read_bytes(&b.pdf));
    assert_eq!(read_bytes(a.json.as_ref().unwrap()), read_bytes(b.json.as_ref().unwrap()));

    let _ = std::fs::remove_dir_all(&dir_a);
    let _ = std::fs::remove_dir_all(&dir_b);
}

#[test]
fn files_land_in_format_folders_and_reruns_overwrite() {
    let dir = tmp_dir("layout");
    let config = VizConfig::default();
    let art = artifact("gamma", vec![5.0, 8.0, 3.0], &["IBU4", "HYB"]);

    let first = save_comparison(&art, &dir, &config, false).unwrap();
    assert_eq!(first.png, dir.join("png").join("gamma.png"));
    assert_eq!(first.pdf, dir.join("pdf").join("gamma.pdf"));
    assert!(first.json.is_none());
    assert!(!dir.join("json").exists());

    // Folders already exist on the second run.
    let second = save_comparison(&art, &dir, &config, false).unwrap();
    assert_eq!(first, second);
    assert!(read_bytes(&second.png).starts_with(b"\x89PNG"));
    assert!(read_bytes(&second.pdf).starts_with(b"%PDF-"));

    let png_entries = std::fs::read_dir(dir.join("png")).unwrap().count();
    assert_eq!(png_entries, 1, "temp files must not be left behind");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn consecutive_renders_do_not_share_state() {
    let config = VizConfig::default();
    let first = artifact("first", vec![10.0, 12.0, 14.0], &["MI", "IBU4", "SVD", "B2B", "SA"]);
    let second = artifact("second", vec![10.0, 12.0, 14.0], &["HYB"]);

    let _ = render_comparison_svg(&first, &config).unwrap();
    let svg = render_comparison_svg(&second, &config).unwrap();

    assert_eq!(svg.matches("<clipPath").count(), 2);
    assert!(svg.contains("QUnfold (HYB)"));
    for stale in ["RooUnfold (MI)", "RooUnfold (IBU)", "RooUnfold (SVD)", "RooUnfold (B2B)"] {
        assert!(!svg.contains(stale), "{stale} leaked into the next figure");
    }
}

#[test]
fn zero_truth_bins_render_and_persist() {
    let dir = tmp_dir("zero_truth");
    let art = artifact("sparse", vec![0.0, 4.0, 0.0, 2.0], &["MI", "SA"]);
    assert!(art.methods[0].ratio[0].is_infinite());

    let saved = save_comparison(&art, &dir, &VizConfig::default(), true).unwrap();
    assert!(saved.png.exists());
    assert!(saved.pdf.exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn one_call_comparison_scores_and_saves() {
    let dir = tmp_dir("one_call");
    let n = 3;
    let binning = Binning::linspace(0.0, 3.0, n).unwrap();
    let truth = Histogram::new(vec![10.0, 11.0, 12.0]);
    let measured = Histogram::new(vec![9.0, 10.0, 11.0]);
    let saved = render_comparison(
        &inputs(n, &["MI"]),
        "normal",
        &truth,
        &measured,
        &binning,
        SingularPolicy::Reject,
        &dir,
        &VizConfig::default(),
    )
    .unwrap();
    assert!(saved.png.exists() && saved.pdf.exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn response_matrix_goes_under_its_own_tree() {
    let dir = tmp_dir("response");
    let binning = Binning::linspace(0.0, 1.0, 3).unwrap();
    let matrix = vec![vec![8.0, 1.0, 0.0], vec![1.0, 8.0, 1.0], vec![0.0, 1.0, 8.0]];
    let art = ResponseMatrixArtifact::new("normal", &binning, &binning, matrix, true).unwrap();

    let saved = save_response(&art, &dir, &VizConfig::default()).unwrap();
    assert_eq!(saved.png, dir.join("response").join("png").join("normal.png"));
    assert!(saved.pdf.exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unsafe_distribution_name_writes_nothing() {
    let dir = tmp_dir("unsafe");
    let art = artifact("../escape", vec![1.0, 2.0], &["MI"]);
    assert!(save_comparison(&art, &dir, &VizConfig::default(), false).is_err());
    assert!(!dir.exists());
}

#[test]
fn distribution_figures_are_written_together() {
    let dir = tmp_dir("together");
    let config = VizConfig::default();
    let art = artifact("normal", vec![10.0, 12.0, 14.0], &["MI", "SA"]);
    let binning = Binning::linspace(-5.0, 5.0, 3).unwrap();
    let matrix = vec![vec![8.0, 1.0, 0.0], vec![1.0, 8.0, 1.0], vec![0.0, 1.0, 8.0]];

    let response =
        ResponseMatrixArtifact::new("normal", &binning, &binning, matrix.clone(), false).unwrap();
    let files = save_distribution(&art, Some(&response), &dir, &config, true).unwrap();
    assert_eq!(files.paths().len(), 5);
    assert!(files.paths().iter().all(|p| p.exists()));
    let before = read_bytes(&files.comparison.png);

    // The response figure cannot be staged, so the comparison is not replaced either.
    let other = artifact("normal", vec![1.0, 2.0, 3.0], &["HYB"]);
    let bad = ResponseMatrixArtifact::new("../normal", &binning, &binning, matrix, false).unwrap();
    assert!(save_distribution(&other, Some(&bad), &dir, &config, true).is_err());
    assert_eq!(read_bytes(&files.comparison.png), before);

    let fresh = tmp_dir("together_fresh");
    assert!(save_distribution(&other, Some(&bad), &fresh, &config, false).is_err());
    assert!(!fresh.exists());

    let _ = std::fs::remove_dir_all(&dir);
}
