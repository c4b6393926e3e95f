//! `unfoldcmp compare`: score, render and save every distribution of a
//! results bundle, one at a time.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use uf_viz::{ResponseMatrixArtifact, SingularPolicy, comparison_artifact};
use uf_viz_render::config::VizConfig;
use uf_viz_render::save_distribution;

use crate::bundle::{DistributionResults, ResultsBundle};

pub struct CompareOptions {
    pub out_dir: PathBuf,
    pub policy: SingularPolicy,
    pub emit_artifacts: bool,
    pub fail_fast: bool,
    pub only: Vec<String>,
}

/// Per-distribution outcome, printed as JSON on stdout.
#[derive(Debug, Serialize)]
struct DistributionSummary {
    name: String,
    status: &'static str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    chi2_dof: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct CompareSummary {
    out_dir: PathBuf,
    singular_policy: SingularPolicy,
    distributions: Vec<DistributionSummary>,
}

pub fn run(input: &Path, opts: &CompareOptions, config: &VizConfig) -> Result<()> {
    tracing::info!(path = %input.display(), "loading results bundle");
    let bundle = ResultsBundle::load(input)?;
    let selected = bundle.select(&opts.only)?;
    tracing::info!(distributions = selected.len(), "results bundle loaded");

    let mut summaries = Vec::with_capacity(selected.len());
    let mut failed = 0usize;
    for dist in &selected {
        match process(dist, opts, config) {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                failed += 1;
                let message = format!("{e:#}");
                tracing::error!(distribution = %dist.name, error = %message, "distribution failed");
                summaries.push(DistributionSummary {
                    name: dist.name.clone(),
                    status: "error",
                    chi2_dof: BTreeMap::new(),
                    files: Vec::new(),
                    error: Some(message),
                });
                if opts.fail_fast {
                    break;
                }
            }
        }
    }

    let summary = CompareSummary {
        out_dir: opts.out_dir.clone(),
        singular_policy: opts.policy,
        distributions: summaries,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    let rendered = summary.distributions.len() - failed;
    tracing::info!(rendered, failed, "compare complete");
    if failed > 0 {
        anyhow::bail!("{failed} of {} distributions failed", selected.len());
    }
    Ok(())
}

fn process(
    dist: &DistributionResults,
    opts: &CompareOptions,
    config: &VizConfig,
) -> Result<DistributionSummary> {
    let context = || format!("distribution '{}'", dist.name);

    let artifact = comparison_artifact(
        &dist.methods,
        &dist.name,
        &dist.truth,
        &dist.measured,
        &dist.binning,
        opts.policy,
    )
    .with_context(context)?;
    for series in &artifact.methods {
        tracing::debug!(
            distribution = %dist.name,
            method = %series.label,
            chi2_dof = series.chi2_dof,
            "scored"
        );
    }

    let response = dist
        .response
        .as_ref()
        .map(|matrix| {
            ResponseMatrixArtifact::new(
                &dist.name,
                &dist.binning,
                &dist.binning,
                matrix.clone(),
                dist.normalise_response,
            )
        })
        .transpose()
        .with_context(|| format!("response matrix of distribution '{}'", dist.name))?;

    let files =
        save_distribution(&artifact, response.as_ref(), &opts.out_dir, config, opts.emit_artifacts)
            .with_context(context)?
            .paths();

    Ok(DistributionSummary {
        name: dist.name.clone(),
        status: "ok",
        chi2_dof: artifact.methods.iter().map(|s| (s.label.clone(), s.chi2_dof)).collect(),
        files,
        error: None,
    })
}
