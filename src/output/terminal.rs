//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use crate::result::{AssemblyDiagnostics, RegressionOutcome};
use crate::sampler::FitOrigin;

/// Format a RegressionOutcome for human-readable terminal output.
pub fn format_outcome(outcome: &RegressionOutcome) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);
    let meta = &outcome.metadata;

    output.push_str(&format!("nonergodic-gmm: {}\n", meta.output_name));
    output.push_str(&sep);
    output.push('\n');
    output.push('\n');

    output.push_str(&format!(
        "  Records: {}   Earthquakes: {}   Stations: {}   Cells: {}\n",
        meta.n_records, meta.n_earthquakes, meta.n_stations, meta.n_cells
    ));
    let origin = match meta.fit_origin {
        FitOrigin::Sampled => "sampled",
        FitOrigin::Cached => "reused from cache",
    };
    output.push_str(&format!("  Posterior: {} draws ({})\n", meta.n_draws, origin));
    output.push('\n');

    output.push_str(&format_diagnostics(&outcome.diagnostics));
    output.push('\n');

    output.push_str("    Hyperparameters (median [5%, 95%]):\n");
    let hyper = &outcome.hyperparameters;
    for name in &hyper.names {
        let (Some(lo), Some(med), Some(hi)) = (
            hyper.get("prc_0.05", name),
            hyper.get("prc_0.50", name),
            hyper.get("prc_0.95", name),
        ) else {
            continue;
        };
        output.push_str(&format!("      {:<11} {:>9.4}  [{:.4}, {:.4}]\n", name, med, lo, hi));
    }
    output.push('\n');

    output.push_str(&format!(
        "    Aleatory: phi_0 = {:.4}, tau_0 = {:.4}\n",
        outcome.aleatory.phi_0, outcome.aleatory.tau_0
    ));
    output.push_str(&format!(
        "    Max |total - (inter + intra)|: {:.2e}\n",
        outcome.max_decomposition_error()
    ));
    output.push('\n');

    output.push_str(&sep);
    output.push('\n');
    output.push_str(
        "Note: Attenuation uncertainty assumes independent cell coefficients.\n",
    );

    output
}

fn format_diagnostics(diag: &AssemblyDiagnostics) -> String {
    let mut out = String::new();
    if diag.all_checks_passed() {
        out.push_str(&format!("  {}\n", "\u{2713} Assembly checks passed".green().bold()));
    } else {
        out.push_str(&format!("  {}\n", "\u{26A0} Assembly warnings".yellow().bold()));
        for w in &diag.warnings {
            out.push_str(&format!("    - {}\n", w));
        }
    }
    out.push_str(&format!(
        "    Cells excluded: {} of {}\n",
        diag.n_cells_excluded, diag.n_cells_total
    ));
    let misfit = format!("{:.3} km", diag.max_path_misfit);
    let misfit = if diag.path_misfit_ok { misfit.green() } else { misfit.red() };
    out.push_str(&format!("    Max path misfit: {}\n", misfit));
    out
}
