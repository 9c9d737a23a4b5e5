//! Percentile tables of the global hyperparameters.

use crate::constants::{hyperposterior_grid, HYPERPARAMETERS, HYPER_PERCENTILES};
use crate::posterior::PosteriorSamples;
use crate::result::{HyperparameterRow, HyperparameterTable};
use crate::statistics::{compute_quantiles, mean};

fn names() -> Vec<String> {
    HYPERPARAMETERS.iter().map(|s| s.to_string()).collect()
}

/// One row per probability, one column per hyperparameter.
fn percentile_rows(
    samples: &PosteriorSamples,
    probabilities: &[f64],
    label: impl Fn(f64) -> String,
) -> Vec<HyperparameterRow> {
    let per_column: Vec<Vec<f64>> = samples
        .layout()
        .hyper_range()
        .map(|j| compute_quantiles(samples.column(j), probabilities))
        .collect();

    probabilities
        .iter()
        .enumerate()
        .map(|(k, &p)| HyperparameterRow {
            label: label(p),
            values: per_column.iter().map(|q| q[k]).collect(),
        })
        .collect()
}

/// Percentiles 0.05, 0.25, 0.5, 0.75, 0.95 plus the mean, one column per hyperparameter.
pub fn summarize_hyperparameters(samples: &PosteriorSamples) -> HyperparameterTable {
    let mut rows = percentile_rows(samples, &HYPER_PERCENTILES, |p| format!("prc_{:.2}", p));
    rows.push(HyperparameterRow {
        label: "mean".to_string(),
        values: samples.layout().hyper_range().map(|j| mean(samples.column(j))).collect(),
    });

    HyperparameterTable { names: names(), rows }
}

/// Percentiles on the 0.01..=0.98 grid, one column per hyperparameter.
pub fn hyperposterior_table(samples: &PosteriorSamples) -> HyperparameterTable {
    let rows = percentile_rows(samples, &hyperposterior_grid(), |p| format!("{:.2}", p));
    HyperparameterTable { names: names(), rows }
}
