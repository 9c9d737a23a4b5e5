//! Coefficient synthesis: per-group summaries broadcast to records.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::assembly::AssembledModel;
use crate::constants::CONSTANT_SHIFT;
use crate::data::CellInfoTable;
use crate::error::{Error, Result};
use crate::posterior::{PosteriorSamples, TermKind};
use crate::result::{CellAttenuationRow, CoefficientRow};
use crate::statistics::{summarize, Summary};
use crate::types::DistanceMatrix;

/// Posterior summary of every group of every per-group term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummaries {
    /// Constant shift `dc_0`.
    pub constant_shift: Summary,
    /// `dc_1e`, one per earthquake.
    pub earthquake_constant: Vec<Summary>,
    /// `dc_1as`, one per station.
    pub station_constant: Vec<Summary>,
    /// `dc_1bs`, one per station.
    pub station_site_term: Vec<Summary>,
    /// `c_cap`, one per valid cell.
    pub cell_attenuation: Vec<Summary>,
    /// `dB`, one per earthquake.
    pub event_term: Vec<Summary>,
}

impl GroupSummaries {
    /// Summarize each column of the pooled posterior.
    pub fn from_samples(samples: &PosteriorSamples) -> Result<Self> {
        let constant_shift = samples
            .column_named(CONSTANT_SHIFT)
            .map(summarize)
            .ok_or_else(|| Error::MissingParameter { name: CONSTANT_SHIFT.to_string() })?;
        let term = |kind| samples.term_columns(kind).map(summarize).collect::<Vec<_>>();

        Ok(Self {
            constant_shift,
            earthquake_constant: term(TermKind::EarthquakeConstant),
            station_constant: term(TermKind::StationConstant),
            station_site_term: term(TermKind::StationSiteTerm),
            cell_attenuation: term(TermKind::CellAttenuation),
            event_term: term(TermKind::EventTerm),
        })
    }

    /// Summaries of one term.
    pub fn term(&self, kind: TermKind) -> &[Summary] {
        match kind {
            TermKind::EarthquakeConstant => &self.earthquake_constant,
            TermKind::StationConstant => &self.station_constant,
            TermKind::StationSiteTerm => &self.station_site_term,
            TermKind::CellAttenuation => &self.cell_attenuation,
            TermKind::EventTerm => &self.event_term,
        }
    }
}

/// Cumulative attenuation effect of each record.
///
/// Mean and median are distance-weighted sums of the cell means and medians.
/// The standard deviation is `sqrt(sum(d^2 * sigma^2))`, which assumes the
/// cell coefficients are independent.
pub fn attenuation_effect(distances: &DistanceMatrix, cells: &[Summary]) -> Result<Vec<Summary>> {
    if distances.ncols() != cells.len() {
        return Err(Error::ShapeMismatch {
            what: "distance columns vs cell summaries".to_string(),
            expected: distances.ncols(),
            actual: cells.len(),
        });
    }

    let n_cells = cells.len();
    let mu = DVector::from_iterator(n_cells, cells.iter().map(|s| s.mean));
    let median = DVector::from_iterator(n_cells, cells.iter().map(|s| s.median));
    let var = DVector::from_iterator(n_cells, cells.iter().map(|s| s.std * s.std));

    let effect_mean = distances * mu;
    let effect_median = distances * median;
    let effect_var = distances.component_mul(distances) * var;

    Ok((0..distances.nrows())
        .map(|i| Summary {
            mean: effect_mean[i],
            median: effect_median[i],
            std: effect_var[i].sqrt(),
        })
        .collect())
}

/// Per-record coefficient table.
///
/// Every record gets the summaries of its earthquake and station groups, the
/// constant shift, and its cumulative attenuation effect. The mean prediction
/// is the sum of the five term means.
pub fn synthesize_coefficients(
    model: &AssembledModel,
    summaries: &GroupSummaries,
) -> Result<Vec<CoefficientRow>> {
    let dc_1e = model.eq_index.broadcast(&summaries.earthquake_constant)?;
    let dc_1as = model.sta_index.broadcast(&summaries.station_constant)?;
    let dc_1bs = model.sta_index.broadcast(&summaries.station_site_term)?;
    let lc_ca = attenuation_effect(&model.cells.distances, &summaries.cell_attenuation)?;
    let dc_0 = summaries.constant_shift;

    let rows = (0..model.record_ids.len())
        .map(|i| CoefficientRow {
            rsn: model.record_ids[i],
            eqid: model.record_eqids[i],
            ssn: model.record_ssns[i],
            site: model.record_sites[i].clone(),
            dc_0,
            dc_1e: dc_1e[i],
            dc_1as: dc_1as[i],
            dc_1bs: dc_1bs[i],
            lc_ca: lc_ca[i],
            prediction_mean: dc_0.mean + dc_1e[i].mean + dc_1as[i].mean + dc_1bs[i].mean + lc_ca[i].mean,
        })
        .collect();
    Ok(rows)
}

/// Join the cell coefficient summaries with the cell metadata.
pub fn summarize_cells(
    model: &AssembledModel,
    summaries: &GroupSummaries,
    cells: &CellInfoTable,
    c_a_erg: f64,
) -> Result<Vec<CellAttenuationRow>> {
    if summaries.cell_attenuation.len() != model.cells.n_valid() {
        return Err(Error::ShapeMismatch {
            what: "cell summaries vs valid cells".to_string(),
            expected: model.cells.n_valid(),
            actual: summaries.cell_attenuation.len(),
        });
    }

    model
        .cells
        .valid_ids
        .iter()
        .zip(&summaries.cell_attenuation)
        .map(|(&cellid, &c_cap)| {
            let info = cells.get(cellid).ok_or_else(|| Error::MissingCellColumn {
                cell: cellid.to_string(),
            })?;
            Ok(CellAttenuationRow {
                cellid,
                name: info.name.clone(),
                mpt_lat: info.mpt_lat,
                mpt_lon: info.mpt_lon,
                mpt_x: info.mpt_x,
                mpt_y: info.mpt_y,
                mpt_z: info.mpt_z,
                utm_zone: info.utm_zone.clone(),
                c_a_erg,
                c_cap,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(mean: f64, median: f64, std: f64) -> Summary {
        Summary { mean, median, std }
    }

    #[test]
    fn test_attenuation_effect() {
        let d = DistanceMatrix::from_row_slice(2, 2, &[10.0, 0.0, 3.0, 4.0]);
        let cells = [s(-0.01, -0.02, 0.001), s(-0.005, -0.004, 0.002)];
        let effect = attenuation_effect(&d, &cells).unwrap();

        assert!((effect[0].mean - (-0.1)).abs() < 1e-12);
        assert!((effect[0].median - (-0.2)).abs() < 1e-12);
        assert!((effect[0].std - 0.01).abs() < 1e-12);

        assert!((effect[1].mean - (3.0 * -0.01 + 4.0 * -0.005)).abs() < 1e-12);
        let var = 9.0 * 1e-6 + 16.0 * 4e-6;
        assert!((effect[1].std - f64::sqrt(var)).abs() < 1e-12);
    }

    #[test]
    fn test_attenuation_without_cells() {
        let d = DistanceMatrix::zeros(3, 0);
        let effect = attenuation_effect(&d, &[]).unwrap();
        assert_eq!(effect.len(), 3);
        assert!(effect.iter().all(|e| e.mean == 0.0 && e.std == 0.0));
    }

    #[test]
    fn test_attenuation_shape_checked() {
        let d = DistanceMatrix::zeros(1, 2);
        assert!(attenuation_effect(&d, &[s(0.0, 0.0, 0.0)]).is_err());
    }
}
