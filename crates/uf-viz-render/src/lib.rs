//! # uf-viz-render
//!
//! Renders unfolding comparison artifacts to SVG and persists them as
//! PNG + PDF under a per-format output tree.

pub mod canvas;
pub mod color;
pub mod config;
pub mod font;
pub mod layout;
pub mod output;
pub mod plots;
pub mod primitives;
pub mod text;
pub mod theme;

use std::path::Path;

use config::VizConfig;
use output::{EncodedFigure, FileBatch, OutputTree, SavedFigure};
use thiserror::Error;
use uf_core::{Binning, Histogram, MethodInputs};
use uf_viz::{ComparisonArtifact, ResponseMatrixArtifact, SingularPolicy};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Core(#[from] uf_core::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("layout error: {0}")]
    Layout(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PNG encoding error: {0}")]
    Png(String),
    #[error("PDF conversion error: {0}")]
    Pdf(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Render a comparison artifact to an SVG string.
pub fn render_comparison_svg(artifact: &ComparisonArtifact, config: &VizConfig) -> Result<String> {
    plots::comparison::render(artifact, config)
}

/// Render a response matrix artifact to an SVG string.
pub fn render_response_svg(
    artifact: &ResponseMatrixArtifact,
    config: &VizConfig,
) -> Result<String> {
    plots::response::render(artifact, config)
}

/// Render and persist a comparison figure:
/// `<out_root>/png/<distribution>.png`, `<out_root>/pdf/<distribution>.pdf`
/// and, with `emit_json`, `<out_root>/json/<distribution>.json`.
///
/// All bytes are produced before the first file is written.
pub fn save_comparison(
    artifact: &ComparisonArtifact,
    out_root: &Path,
    config: &VizConfig,
    emit_json: bool,
) -> Result<SavedFigure> {
    Ok(save_distribution(artifact, None, out_root, config, emit_json)?.comparison)
}

/// Render and persist a response matrix under `<out_root>/response/{png,pdf}/`.
pub fn save_response(
    artifact: &ResponseMatrixArtifact,
    out_root: &Path,
    config: &VizConfig,
) -> Result<SavedFigure> {
    let mut batch = FileBatch::new();
    let saved = stage_response(artifact, &OutputTree::new(out_root), config, &mut batch)?;
    batch.commit()?;
    log_response(&saved, artifact);
    Ok(saved)
}

/// Figures written for one distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionFiles {
    pub comparison: SavedFigure,
    pub response: Option<SavedFigure>,
}

impl DistributionFiles {
    /// Every written path, comparison first.
    pub fn paths(&self) -> Vec<std::path::PathBuf> {
        let mut paths = vec![self.comparison.png.clone(), self.comparison.pdf.clone()];
        paths.extend(self.comparison.json.clone());
        if let Some(response) = &self.response {
            paths.extend([response.png.clone(), response.pdf.clone()]);
        }
        paths
    }
}

/// Render and persist every figure of one distribution as a unit: the
/// comparison, its optional JSON artifact and the optional response matrix.
///
/// Everything is rendered and encoded before the first write, and the files
/// are committed together, so a failure leaves none of them replaced.
pub fn save_distribution(
    comparison: &ComparisonArtifact,
    response: Option<&ResponseMatrixArtifact>,
    out_root: &Path,
    config: &VizConfig,
    emit_json: bool,
) -> Result<DistributionFiles> {
    let tree = OutputTree::new(out_root);
    let mut batch = FileBatch::new();

    let svg = render_comparison_svg(comparison, config)?;
    let mut saved = EncodedFigure::from_svg(&svg, config.output.dpi)?.stage(
        &tree,
        &comparison.distribution,
        &mut batch,
    )?;
    if emit_json {
        let path = tree.path_for(&comparison.distribution, "json")?;
        batch.push(path.clone(), serde_json::to_vec_pretty(comparison)?);
        saved.json = Some(path);
    }
    let response_saved = response
        .map(|artifact| stage_response(artifact, &tree, config, &mut batch))
        .transpose()?;

    batch.commit()?;

    tracing::info!(
        distribution = %comparison.distribution,
        methods = comparison.methods.len(),
        png = %saved.png.display(),
        pdf = %saved.pdf.display(),
        "saved comparison figure"
    );
    if let (Some(figure), Some(artifact)) = (&response_saved, response) {
        log_response(figure, artifact);
    }
    Ok(DistributionFiles { comparison: saved, response: response_saved })
}

fn stage_response(
    artifact: &ResponseMatrixArtifact,
    tree: &OutputTree,
    config: &VizConfig,
    batch: &mut FileBatch,
) -> Result<SavedFigure> {
    let svg = render_response_svg(artifact, config)?;
    EncodedFigure::from_svg(&svg, config.output.dpi)?.stage(
        &tree.nested("response"),
        &artifact.distribution,
        batch,
    )
}

fn log_response(saved: &SavedFigure, artifact: &ResponseMatrixArtifact) {
    tracing::info!(
        distribution = %artifact.distribution,
        png = %saved.png.display(),
        "saved response matrix figure"
    );
}

/// Score every method, build the comparison artifact and persist the figure.
#[allow(clippy::too_many_arguments)]
pub fn render_comparison(
    inputs: &MethodInputs,
    distribution: &str,
    truth: &Histogram,
    measured: &Histogram,
    binning: &Binning,
    policy: SingularPolicy,
    out_root: &Path,
    config: &VizConfig,
) -> Result<SavedFigure> {
    let artifact =
        uf_viz::comparison_artifact(inputs, distribution, truth, measured, binning, policy)?;
    save_comparison(&artifact, out_root, config, false)
}
