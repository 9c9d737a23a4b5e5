//! Model payload: the fixed-shape numeric input of the sampler.

use serde::{Deserialize, Serialize};

use super::cells::{align_distances, filter_cells, path_misfit, CellNetwork};
use super::diagnostics::compute_diagnostics;
use super::index::GroupIndex;
use crate::config::RunConfig;
use crate::data::{
    CellDistanceTable, CellInfoTable, EarthquakeTable, Record, RecordTable, StationTable,
};
use crate::error::{Error, Result};
use crate::result::{AssemblyDiagnostics, RecordSite};
use crate::types::{
    coordinates_from_pairs, Coordinates, DistanceMatrix, EarthquakeId, RecordId, RecordVector,
    StationId,
};

/// Raw tables a model is assembled from.
#[derive(Debug, Clone, Copy)]
pub struct ModelInputs<'a> {
    /// Records (flatfile), in the order the payload will use.
    pub records: &'a RecordTable,
    /// Earthquake coordinates.
    pub earthquakes: &'a EarthquakeTable,
    /// Station coordinates.
    pub stations: &'a StationTable,
    /// Attenuation cell metadata.
    pub cells: &'a CellInfoTable,
    /// Path length of each record through each cell.
    pub distances: &'a CellDistanceTable,
}

/// Everything the sampler consumes.
///
/// Group index vectors are 1-based. All matrices are ordered by group index
/// (earthquakes, stations) or by valid-cell position (cells).
#[derive(Debug, Clone)]
pub struct ModelPayload {
    /// Number of records.
    pub n_records: usize,
    /// Number of earthquakes.
    pub n_eq: usize,
    /// Number of stations.
    pub n_sta: usize,
    /// Number of valid cells.
    pub n_cell: usize,
    /// 1-based earthquake of each record.
    pub eq: Vec<usize>,
    /// 1-based station of each record.
    pub stat: Vec<usize>,
    /// Earthquake coordinates, one row per earthquake.
    pub x_e: Coordinates,
    /// Station coordinates, one row per station.
    pub x_s: Coordinates,
    /// Valid-cell midpoints, one row per valid cell.
    pub x_c: Coordinates,
    /// Zero prior mean of the records.
    pub rec_mu: RecordVector,
    /// Records x valid-cells distance matrix.
    pub rc: DistanceMatrix,
    /// Ergodic anelastic attenuation coefficient.
    pub c_a_erg: f64,
    /// Observed total residuals.
    pub y: RecordVector,
}

/// Named mapping handed to the inference engine.
///
/// Key names are part of the contract with the model declaration and must
/// not change independently of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct PayloadWire {
    /// Records.
    pub N: usize,
    /// Earthquakes.
    pub NEQ: usize,
    /// Stations.
    pub NSTAT: usize,
    /// Valid cells.
    pub NCELL: usize,
    /// 1-based earthquake per record.
    pub eq: Vec<usize>,
    /// 1-based station per record.
    pub stat: Vec<usize>,
    /// Earthquake coordinates.
    pub X_e: Vec<[f64; 2]>,
    /// Station coordinates.
    pub X_s: Vec<[f64; 2]>,
    /// Cell midpoints.
    pub X_c: Vec<[f64; 2]>,
    /// Prior mean (zeros).
    pub rec_mu: Vec<f64>,
    /// Cell path distances, one row per record.
    pub RC: Vec<Vec<f64>>,
    /// Ergodic attenuation prior mean.
    pub c_a_erg: f64,
    /// Observations.
    pub Y: Vec<f64>,
}

fn coordinate_rows(m: &Coordinates) -> Vec<[f64; 2]> {
    (0..m.nrows()).map(|i| [m[(i, 0)], m[(i, 1)]]).collect()
}

impl ModelPayload {
    /// Convert to the engine's named mapping.
    pub fn to_wire(&self) -> PayloadWire {
        PayloadWire {
            N: self.n_records,
            NEQ: self.n_eq,
            NSTAT: self.n_sta,
            NCELL: self.n_cell,
            eq: self.eq.clone(),
            stat: self.stat.clone(),
            X_e: coordinate_rows(&self.x_e),
            X_s: coordinate_rows(&self.x_s),
            X_c: coordinate_rows(&self.x_c),
            rec_mu: self.rec_mu.iter().copied().collect(),
            RC: self.rc.row_iter().map(|r| r.iter().copied().collect()).collect(),
            c_a_erg: self.c_a_erg,
            Y: self.y.iter().copied().collect(),
        }
    }

    /// Serialize the named mapping to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_wire())?)
    }
}

/// An assembled model: the payload plus the bookkeeping needed to read the posterior back.
#[derive(Debug, Clone)]
pub struct AssembledModel {
    /// Sampler input.
    pub payload: ModelPayload,
    /// Record ids in payload order.
    pub record_ids: Vec<RecordId>,
    /// Earthquake id of each record.
    pub record_eqids: Vec<EarthquakeId>,
    /// Station id of each record.
    pub record_ssns: Vec<StationId>,
    /// Coordinates of each record.
    pub record_sites: Vec<RecordSite>,
    /// Earthquake groups (0-based `inverse`).
    pub eq_index: GroupIndex<EarthquakeId>,
    /// Station groups (0-based `inverse`).
    pub sta_index: GroupIndex<StationId>,
    /// Valid cells and their distances.
    pub cells: CellNetwork,
    /// Cell filtering and path-misfit report.
    pub diagnostics: AssemblyDiagnostics,
}

impl AssembledModel {
    /// 0-based earthquake group of each record.
    pub fn eq_inv(&self) -> &[usize] {
        self.eq_index.inverse()
    }

    /// 0-based station group of each record.
    pub fn sta_inv(&self) -> &[usize] {
        self.sta_index.inverse()
    }
}

fn first_record(records: &RecordTable, pred: impl Fn(&Record) -> bool) -> RecordId {
    records.rows().iter().find(|r| pred(r)).map_or(0, |r| r.rsn)
}

/// Build the model payload from the raw tables.
///
/// Records keep the order of the records table. Fails without building
/// anything if a record references an earthquake or station absent from
/// its table, or if the distance table cannot be aligned to the records.
pub fn assemble(inputs: &ModelInputs<'_>, config: &RunConfig) -> Result<AssembledModel> {
    let records = inputs.records.rows();

    let record_ids: Vec<RecordId> = records.iter().map(|r| r.rsn).collect();
    let record_eqids: Vec<EarthquakeId> = records.iter().map(|r| r.eqid).collect();
    let record_ssns: Vec<StationId> = records.iter().map(|r| r.ssn).collect();
    let record_sites: Vec<RecordSite> = records.iter().map(RecordSite::of).collect();

    let eq_index = GroupIndex::build(&record_eqids, config.group_ordering);
    let sta_index = GroupIndex::build(&record_ssns, config.group_ordering);

    let eq_coords = eq_index
        .keys()
        .iter()
        .map(|&eqid| match inputs.earthquakes.get(eqid) {
            Some(e) => Ok((e.x, e.y)),
            None => Err(Error::MissingEarthquake {
                record: first_record(inputs.records, |r| r.eqid == eqid),
                eqid,
            }),
        })
        .collect::<Result<Vec<_>>>()?;
    let sta_coords = sta_index
        .keys()
        .iter()
        .map(|&ssn| match inputs.stations.get(ssn) {
            Some(s) => Ok((s.x, s.y)),
            None => Err(Error::MissingStation {
                record: first_record(inputs.records, |r| r.ssn == ssn),
                ssn,
            }),
        })
        .collect::<Result<Vec<_>>>()?;

    let all_distances = align_distances(inputs.records, inputs.cells, inputs.distances)?;
    let cells = filter_cells(&all_distances, inputs.cells)?;
    let misfit = path_misfit(&inputs.records.rupture_distances(), &cells.distances);
    let diagnostics = compute_diagnostics(&cells, &misfit, config.path_misfit_tolerance);

    let n_records = records.len();
    let payload = ModelPayload {
        n_records,
        n_eq: eq_index.n_groups(),
        n_sta: sta_index.n_groups(),
        n_cell: cells.n_valid(),
        eq: eq_index.one_based(),
        stat: sta_index.one_based(),
        x_e: coordinates_from_pairs(&eq_coords),
        x_s: coordinates_from_pairs(&sta_coords),
        x_c: cells.coordinates.clone(),
        rec_mu: RecordVector::zeros(n_records),
        rc: cells.distances.clone(),
        c_a_erg: config.c_a_erg,
        y: RecordVector::from_vec(inputs.records.residuals()),
    };

    tracing::info!(
        records = payload.n_records,
        earthquakes = payload.n_eq,
        stations = payload.n_sta,
        cells = payload.n_cell,
        excluded_cells = diagnostics.n_cells_excluded,
        max_path_misfit = diagnostics.max_path_misfit,
        "assembled model payload"
    );

    Ok(AssembledModel {
        payload,
        record_ids,
        record_eqids,
        record_ssns,
        record_sites,
        eq_index,
        sta_index,
        cells,
        diagnostics,
    })
}
