//! Sanity checks on the assembled model.
//!
//! Two checks, neither of which blocks the run:
//! 1. Degenerate cells: how many cells carry no path and were dropped
//! 2. Path misfit: do the valid cells tile each record's rupture distance

use super::cells::{CellNetwork, PathMisfit};
use crate::result::AssemblyDiagnostics;

/// Compute assembly diagnostics and log any warnings.
///
/// # Arguments
///
/// * `network` - Filtered cell network
/// * `misfit` - Per-record path misfit against the valid cells
/// * `tolerance` - Largest acceptable misfit in km
pub fn compute_diagnostics(
    network: &CellNetwork,
    misfit: &PathMisfit,
    tolerance: f64,
) -> AssemblyDiagnostics {
    let mut warnings = Vec::new();

    if network.n_excluded() > 0 {
        tracing::debug!(
            excluded = network.n_excluded(),
            total = network.n_total(),
            "dropped attenuation cells with zero total path length"
        );
    }
    if network.n_valid() == 0 && network.n_total() > 0 {
        warnings.push(format!(
            "No attenuation cell is crossed by any path ({} cells in the network).",
            network.n_total()
        ));
    }

    let path_misfit_ok = misfit.max <= tolerance;
    if !path_misfit_ok {
        let worst = misfit
            .per_record
            .iter()
            .filter(|&&m| m > tolerance)
            .count();
        warnings.push(format!(
            "Path misfit: max |Rrup - cell path| = {:.3} km (tolerance {:.3} km) in {} record(s). \
             The cell network may not cover every path.",
            misfit.max, tolerance, worst
        ));
    }

    for w in &warnings {
        tracing::warn!("{}", w);
    }

    AssemblyDiagnostics {
        n_cells_total: network.n_total(),
        n_cells_valid: network.n_valid(),
        n_cells_excluded: network.n_excluded(),
        excluded_cells: network.excluded_ids.clone(),
        max_path_misfit: misfit.max,
        mean_path_misfit: misfit.mean,
        path_misfit_ok,
        warnings,
    }
}
