//! Output formatting for regression outcomes.

pub mod csv;
mod json;
mod terminal;

pub use json::{to_json, to_json_pretty};
pub use terminal::format_outcome;

#[cfg(test)]
pub(crate) fn sample_outcome() -> crate::result::RegressionOutcome {
    use crate::config::EngineVersion;
    use crate::decomposition::{hyperposterior_table, summarize_hyperparameters};
    use crate::posterior::{ColumnLayout, PosteriorSamples};
    use crate::result::*;
    use crate::sampler::FitOrigin;
    use crate::statistics::Summary;
    use crate::types::DrawMatrix;

    // Hyperparameters only; phi_0 (column 10) is constant 0.5
    let layout = ColumnLayout::new(0, 0, &[]);
    let draws = DrawMatrix::from_fn(4, layout.len(), |d, j| {
        if j == 10 { 0.5 } else { j as f64 + d as f64 * 0.25 }
    });
    let posterior = PosteriorSamples::new(draws, layout).unwrap();

    let summary = Summary { mean: 0.1, median: 0.1, std: 0.01 };
    let site = RecordSite {
        eq_x: 1.0,
        eq_y: 2.0,
        sta_x: 3.0,
        sta_y: 4.0,
        location: Some(crate::data::RecordLocation {
            eq_lat: 34.0,
            eq_lon: -118.0,
            sta_lat: 34.1,
            sta_lon: -118.1,
            utm_zone: "11S".to_string(),
        }),
    };
    let coefficients = vec![CoefficientRow {
        rsn: 1,
        eqid: 10,
        ssn: 100,
        site: site.clone(),
        dc_0: summary,
        dc_1e: summary,
        dc_1as: summary,
        dc_1bs: summary,
        lc_ca: summary,
        prediction_mean: 0.5,
    }];
    let residuals = vec![ResidualRow {
        rsn: 1,
        eqid: 10,
        ssn: 100,
        site,
        prediction_mean: 0.5,
        total: 0.25,
        inter_event: 0.1,
        intra_event: 0.15,
    }];
    let cells = vec![CellAttenuationRow {
        cellid: 7,
        name: "c.7".to_string(),
        mpt_lat: 34.0,
        mpt_lon: -118.0,
        mpt_x: 10.0,
        mpt_y: 20.0,
        mpt_z: 0.0,
        utm_zone: "11S".to_string(),
        c_a_erg: 0.0,
        c_cap: summary,
    }];

    RegressionOutcome {
        hyperparameters: summarize_hyperparameters(&posterior),
        hyperposterior: hyperposterior_table(&posterior),
        posterior,
        cells,
        coefficients,
        residuals,
        aleatory: AleatoryTerms { phi_0: 0.5, tau_0: 0.3 },
        diagnostics: AssemblyDiagnostics {
            n_cells_total: 2,
            n_cells_valid: 1,
            n_cells_excluded: 1,
            excluded_cells: vec![8],
            max_path_misfit: 0.2,
            mean_path_misfit: 0.1,
            path_misfit_ok: true,
            warnings: Vec::new(),
        },
        metadata: RunMetadata {
            output_name: "test".to_string(),
            engine: EngineVersion::V2,
            fit_origin: FitOrigin::Sampled,
            n_records: 1,
            n_earthquakes: 1,
            n_stations: 1,
            n_cells: 1,
            n_draws: 4,
            runtime_secs: 0.01,
        },
    }
}
