//! Posterior decomposition.
//!
//! From the pooled posterior matrix:
//! - Per-group mean/median/std of every term ([`GroupSummaries`])
//! - Per-record coefficients by broadcasting through the 0-based group index
//! - Cumulative cell attenuation along each path
//! - Total, inter-event and intra-event residuals
//! - Hyperparameter percentile tables

mod coefficients;
mod hyper;
mod residuals;

pub use coefficients::{attenuation_effect, summarize_cells, synthesize_coefficients, GroupSummaries};
pub use hyper::{hyperposterior_table, summarize_hyperparameters};
pub use residuals::{aleatory_terms, decompose_residuals};
