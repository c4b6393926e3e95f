//! # uf-core
//!
//! Data model and error taxonomy shared by the unfolding comparison crates.
//!
//! Everything here is produced per distribution by the driver, consumed once
//! by the scoring and rendering pipeline, and then dropped.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{
    DistributionGenerator, GeneratedDistribution, GenerationRequest, Unfolder, UnfoldingOutcome,
    UnfoldingProblem,
};
pub use types::{
    Binning, Covariance, Histogram, MethodInputs, Uncertainty, normalize_response,
};

/// Crate version, stamped into artifacts.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
