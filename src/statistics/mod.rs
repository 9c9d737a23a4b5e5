//! Statistical helpers for summarizing posterior draws.
//!
//! - Quantiles using the R-7 (linear interpolation) definition
//! - Mean, median and sample standard deviation per column

mod quantile;
mod summary;

pub use quantile::{compute_quantile, compute_quantiles, quantile_sorted};
pub use summary::{mean, sample_std, summarize, Summary};
