//! # uf-viz
//!
//! Scoring and plot-friendly artifacts for unfolding comparisons.
//!
//! Artifacts are plain serializable structures (arrays instead of nested
//! objects) so they can be rendered by `uf-viz-render` or dumped as JSON.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// χ²/dof scoring with explicit singular-covariance policy.
pub mod chi2;

/// Comparison artifact for the two-panel method comparison figure.
pub mod comparison;

/// Method style table and priority order.
pub mod methods;

/// Response matrix artifact.
pub mod response;

pub use chi2::{SingularPolicy, compute_chi2, compute_chi2_with};
pub use comparison::{ComparisonArtifact, MethodSeries, comparison_artifact};
pub use methods::{METHOD_TABLE, MarkerKind, MethodStyle};
pub use response::ResponseMatrixArtifact;
