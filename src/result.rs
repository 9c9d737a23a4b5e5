//! Result types of a regression run.

use serde::{Deserialize, Serialize};

use crate::config::EngineVersion;
use crate::data::{Record, RecordLocation};
use crate::posterior::PosteriorSamples;
use crate::sampler::FitOrigin;
use crate::statistics::Summary;
use crate::types::{CellId, EarthquakeId, RecordId, StationId};

/// Complete result of a regression run.
#[derive(Debug, Clone, Serialize)]
pub struct RegressionOutcome {
    /// Pooled posterior draws (written to the raw-posterior artifact, not serialized here).
    #[serde(skip)]
    pub posterior: PosteriorSamples,

    /// Hyperparameter percentiles (0.05, 0.25, 0.5, 0.75, 0.95) and mean.
    pub hyperparameters: HyperparameterTable,

    /// Hyperparameter percentiles on the 0.01..=0.98 grid.
    pub hyperposterior: HyperparameterTable,

    /// Attenuation coefficient of every valid cell.
    pub cells: Vec<CellAttenuationRow>,

    /// Per-record coefficients and mean prediction.
    pub coefficients: Vec<CoefficientRow>,

    /// Per-record residual decomposition.
    pub residuals: Vec<ResidualRow>,

    /// Posterior means of the aleatory standard deviations.
    pub aleatory: AleatoryTerms,

    /// Cell filtering and path-misfit report.
    pub diagnostics: AssemblyDiagnostics,

    /// Metadata for debugging.
    pub metadata: RunMetadata,
}

impl RegressionOutcome {
    /// Largest |total - (inter + intra)| over all records.
    ///
    /// Zero up to rounding for a consistent decomposition.
    pub fn max_decomposition_error(&self) -> f64 {
        self.residuals
            .iter()
            .map(|r| (r.total - (r.inter_event + r.intra_event)).abs())
            .fold(0.0, f64::max)
    }
}

/// Sanity checks on the assembled model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyDiagnostics {
    /// Cells in the metadata table.
    pub n_cells_total: usize,
    /// Cells crossed by at least one path.
    pub n_cells_valid: usize,
    /// Cells dropped for zero total path length.
    pub n_cells_excluded: usize,
    /// Identifiers of the dropped cells.
    pub excluded_cells: Vec<CellId>,

    /// Largest |Rrup - sum of valid cell distances| over all records, in km.
    pub max_path_misfit: f64,
    /// Mean path misfit over all records, in km.
    pub mean_path_misfit: f64,
    /// True if the largest misfit is within the configured tolerance.
    pub path_misfit_ok: bool,

    /// Human-readable warnings (empty if all checks pass).
    pub warnings: Vec<String>,
}

impl AssemblyDiagnostics {
    /// Check if all diagnostics are OK.
    pub fn all_checks_passed(&self) -> bool {
        self.path_misfit_ok && self.warnings.is_empty()
    }
}

/// One row of a hyperparameter table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterRow {
    /// Row label: `prc_0.05`, `mean`, or the bare percentile on the grid.
    pub label: String,
    /// One value per hyperparameter, in [`HyperparameterTable::names`] order.
    pub values: Vec<f64>,
}

/// Percentiles of the global hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterTable {
    /// Hyperparameter names (table columns).
    pub names: Vec<String>,
    /// Table rows.
    pub rows: Vec<HyperparameterRow>,
}

impl HyperparameterTable {
    /// Value of hyperparameter `name` in the row labelled `label`.
    pub fn get(&self, label: &str, name: &str) -> Option<f64> {
        let col = self.names.iter().position(|n| n == name)?;
        let row = self.rows.iter().find(|r| r.label == label)?;
        row.values.get(col).copied()
    }
}

/// Posterior attenuation coefficient of one valid cell, with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellAttenuationRow {
    /// Cell identifier.
    pub cellid: CellId,
    /// Cell name (distance-table column).
    pub name: String,
    /// Midpoint latitude.
    pub mpt_lat: f64,
    /// Midpoint longitude.
    pub mpt_lon: f64,
    /// Midpoint X.
    pub mpt_x: f64,
    /// Midpoint Y.
    pub mpt_y: f64,
    /// Midpoint Z.
    pub mpt_z: f64,
    /// UTM zone of the projected coordinates.
    pub utm_zone: String,
    /// Ergodic attenuation coefficient (prior mean).
    pub c_a_erg: f64,
    /// Posterior summary of the cell coefficient.
    pub c_cap: Summary,
}

/// Source and site coordinates of a record, carried from the flatfile to the
/// per-record tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSite {
    /// Earthquake X (km).
    pub eq_x: f64,
    /// Earthquake Y (km).
    pub eq_y: f64,
    /// Station X (km).
    pub sta_x: f64,
    /// Station Y (km).
    pub sta_y: f64,
    /// Lat/lon context, when the flatfile has it.
    pub location: Option<RecordLocation>,
}

impl RecordSite {
    /// Coordinates of `record`.
    pub fn of(record: &Record) -> Self {
        Self {
            eq_x: record.eq_x,
            eq_y: record.eq_y,
            sta_x: record.sta_x,
            sta_y: record.sta_y,
            location: record.location.clone(),
        }
    }
}

/// Per-record coefficient summary.
///
/// Each term carries the mean, median and standard deviation of its posterior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientRow {
    /// Record identifier.
    pub rsn: RecordId,
    /// Earthquake of the record.
    pub eqid: EarthquakeId,
    /// Station of the record.
    pub ssn: StationId,
    /// Record coordinates.
    pub site: RecordSite,
    /// Constant shift `dc_0`.
    pub dc_0: Summary,
    /// Earthquake constant `dc_1e` of the record's earthquake.
    pub dc_1e: Summary,
    /// Station constant `dc_1as` of the record's station.
    pub dc_1as: Summary,
    /// Site term `dc_1bs` of the record's station.
    pub dc_1bs: Summary,
    /// Cumulative anelastic attenuation along the record's path.
    ///
    /// The standard deviation treats cells as independent and so understates
    /// the uncertainty when cell coefficients are correlated.
    pub lc_ca: Summary,
    /// Sum of the term means.
    pub prediction_mean: f64,
}

/// Per-record residual decomposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualRow {
    /// Record identifier.
    pub rsn: RecordId,
    /// Earthquake of the record.
    pub eqid: EarthquakeId,
    /// Station of the record.
    pub ssn: StationId,
    /// Record coordinates.
    pub site: RecordSite,
    /// Mean non-ergodic prediction.
    pub prediction_mean: f64,
    /// Observed minus predicted.
    pub total: f64,
    /// Between-event residual: mean `dB` of the record's earthquake.
    pub inter_event: f64,
    /// Within-event residual: `total - inter_event`.
    pub intra_event: f64,
}

/// Aleatory standard deviations (posterior means).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AleatoryTerms {
    /// Within-event standard deviation.
    pub phi_0: f64,
    /// Between-event standard deviation.
    pub tau_0: f64,
}

/// Metadata for debugging and analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Output name (also the fit-cache key).
    pub output_name: String,
    /// Engine generation.
    pub engine: EngineVersion,
    /// Whether the fit was sampled or reused.
    pub fit_origin: FitOrigin,
    /// Records in the payload.
    pub n_records: usize,
    /// Earthquakes in the payload.
    pub n_earthquakes: usize,
    /// Stations in the payload.
    pub n_stations: usize,
    /// Valid cells in the payload.
    pub n_cells: usize,
    /// Pooled posterior draws.
    pub n_draws: usize,
    /// Total runtime in seconds.
    pub runtime_secs: f64,
}
