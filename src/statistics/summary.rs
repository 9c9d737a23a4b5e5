//! Per-column posterior summaries.

use serde::{Deserialize, Serialize};

use super::quantile::compute_quantile;

/// Mean, median and standard deviation of a set of draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Arithmetic mean.
    pub mean: f64,
    /// Median (R-7 quantile at 0.5).
    pub median: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std: f64,
}

/// Arithmetic mean; `NaN` for empty input.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample standard deviation; `NaN` for fewer than two values.
pub fn sample_std(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(data);
    let ss: f64 = data.iter().map(|x| (x - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Summarize one column of draws.
pub fn summarize(draws: &[f64]) -> Summary {
    let mut scratch = draws.to_vec();
    Summary {
        mean: mean(draws),
        median: compute_quantile(&mut scratch, 0.5),
        std: sample_std(draws),
    }
}
