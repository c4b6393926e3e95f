//! Results bundle: unfolded outputs of every method for a set of test
//! distributions, as written by the unfolding jobs.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use uf_core::{Binning, Histogram, MethodInputs};

#[derive(Debug, Deserialize)]
pub struct ResultsBundle {
    pub distributions: Vec<DistributionResults>,
}

/// One test distribution and the results of every method run on it.
#[derive(Debug, Deserialize)]
pub struct DistributionResults {
    pub name: String,
    pub binning: Binning,
    pub truth: Histogram,
    pub measured: Histogram,
    /// Reco x truth response matrix; enables the response figure.
    #[serde(default)]
    pub response: Option<Vec<Vec<f64>>>,
    /// Normalise response columns before plotting.
    #[serde(default)]
    pub normalise_response: bool,
    #[serde(flatten)]
    pub methods: MethodInputs,
}

impl ResultsBundle {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading results bundle {}", path.display()))?;
        let bundle: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing results bundle {}", path.display()))?;
        bundle.check_unique_names()?;
        Ok(bundle)
    }

    fn check_unique_names(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for d in &self.distributions {
            if !seen.insert(d.name.as_str()) {
                anyhow::bail!("distribution '{}' appears more than once in the bundle", d.name);
            }
        }
        Ok(())
    }

    /// Distributions to process: all of them, or those named in `only` (in
    /// bundle order). Unknown names are an error.
    pub fn select<'a>(&'a self, only: &[String]) -> Result<Vec<&'a DistributionResults>> {
        if only.is_empty() {
            return Ok(self.distributions.iter().collect());
        }
        if let Some(missing) =
            only.iter().find(|name| !self.distributions.iter().any(|d| &d.name == *name))
        {
            anyhow::bail!("--only: no distribution named '{missing}' in the bundle");
        }
        Ok(self.distributions.iter().filter(|d| only.contains(&d.name)).collect())
    }
}
