//! Fixed names and percentile grids shared by the payload and the summaries.

/// Global hyperparameters, in pooled-matrix column order.
pub const HYPERPARAMETERS: [&str; 12] = [
    "dc_0",
    "ell_1e",
    "ell_1as",
    "omega_1e",
    "omega_1as",
    "omega_1bs",
    "mu_cap",
    "ell_ca1p",
    "omega_ca1p",
    "omega_ca2p",
    "phi_0",
    "tau_0",
];

/// Constant shift; also the first hyperparameter column.
pub const CONSTANT_SHIFT: &str = "dc_0";

/// Within-event standard deviation.
pub const PHI_0: &str = "phi_0";

/// Between-event standard deviation.
pub const TAU_0: &str = "tau_0";

/// Percentiles of the hyperparameter summary table.
pub const HYPER_PERCENTILES: [f64; 5] = [0.05, 0.25, 0.5, 0.75, 0.95];

/// Detailed hyperposterior grid: 0.01, 0.02, ..., 0.98.
pub fn hyperposterior_grid() -> Vec<f64> {
    (1..=98).map(|k| k as f64 / 100.0).collect()
}
