//! Attenuation-cell network: distance alignment, degenerate-cell filtering
//! and the path-length sanity check.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::data::{CellDistanceTable, CellInfoTable, RecordTable};
use crate::error::{Error, Result};
use crate::types::{CellId, Coordinates, DistanceMatrix};

/// Cells crossed by at least one path.
///
/// A cell whose distances sum to zero over all records has no influence on
/// the data and would leave its coefficient unidentified, so it is dropped.
#[derive(Debug, Clone)]
pub struct CellNetwork {
    /// Position of each valid cell in the cell metadata table.
    pub valid_positions: Vec<usize>,
    /// Identifier of each valid cell, in column order.
    pub valid_ids: Vec<CellId>,
    /// Identifiers of the dropped cells.
    pub excluded_ids: Vec<CellId>,
    /// Records x valid-cells distance matrix.
    pub distances: DistanceMatrix,
    /// Midpoint (X, Y) of each valid cell.
    pub coordinates: Coordinates,
}

impl CellNetwork {
    /// Cells in the metadata table.
    pub fn n_total(&self) -> usize {
        self.valid_ids.len() + self.excluded_ids.len()
    }

    /// Cells kept in the model.
    pub fn n_valid(&self) -> usize {
        self.valid_ids.len()
    }

    /// Cells dropped for carrying no path.
    pub fn n_excluded(&self) -> usize {
        self.excluded_ids.len()
    }
}

/// Reorder the distance table to match the records table, one column per
/// cell of the metadata table in metadata order.
///
/// Fails if a record has no distance row, a cell has no distance column, or
/// a record has path length in a column that matches no cell of the metadata.
/// Unknown columns that carry no path length are ignored.
pub fn align_distances(
    records: &RecordTable,
    cells: &CellInfoTable,
    table: &CellDistanceTable,
) -> Result<DistanceMatrix> {
    let columns = cells
        .rows()
        .iter()
        .map(|c| table.column_of(&c.name).ok_or_else(|| Error::MissingCellColumn { cell: c.name.clone() }))
        .collect::<Result<Vec<_>>>()?;
    let rows = records
        .rows()
        .iter()
        .map(|r| table.row_of(r.rsn).ok_or(Error::MissingDistanceRow { record: r.rsn }))
        .collect::<Result<Vec<_>>>()?;

    let source = table.distances();

    // A path through a cell with no metadata cannot be placed in the model
    let known: HashSet<&str> = cells.rows().iter().map(|c| c.name.as_str()).collect();
    for (j, name) in table.cell_names().iter().enumerate() {
        if known.contains(name.as_str()) {
            continue;
        }
        if let Some(i) = rows.iter().position(|&row| source[(row, j)] > 0.0) {
            return Err(Error::UnknownCell { record: records.rows()[i].rsn, cell: name.clone() });
        }
    }

    Ok(DistanceMatrix::from_fn(rows.len(), columns.len(), |i, j| source[(rows[i], columns[j])]))
}

/// Keep the cells whose total distance over all records is strictly positive.
///
/// `distances` must have one column per row of `cells`, in the same order.
/// Relative column order is preserved.
pub fn filter_cells(distances: &DistanceMatrix, cells: &CellInfoTable) -> Result<CellNetwork> {
    if distances.ncols() != cells.len() {
        return Err(Error::ShapeMismatch {
            what: "distance columns vs cell metadata".to_string(),
            expected: cells.len(),
            actual: distances.ncols(),
        });
    }

    let mut valid_positions = Vec::new();
    let mut excluded_ids = Vec::new();
    for (j, cell) in cells.rows().iter().enumerate() {
        if distances.column(j).sum() > 0.0 {
            valid_positions.push(j);
        } else {
            excluded_ids.push(cell.cellid);
        }
    }

    let valid_ids = valid_positions.iter().map(|&j| cells.rows()[j].cellid).collect();
    let valid = distances.select_columns(valid_positions.iter());
    let coordinates = Coordinates::from_fn(valid_positions.len(), |i, k| {
        let cell = &cells.rows()[valid_positions[i]];
        if k == 0 { cell.mpt_x } else { cell.mpt_y }
    });

    Ok(CellNetwork { valid_positions, valid_ids, excluded_ids, distances: valid, coordinates })
}

/// Per-record |total path distance - sum of valid-cell distances|.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathMisfit {
    /// Misfit of each record, in record order.
    pub per_record: Vec<f64>,
    /// Largest misfit (0 when there are no records).
    pub max: f64,
    /// Mean misfit (0 when there are no records).
    pub mean: f64,
}

/// Compare each record's rupture distance with the path length the valid cells account for.
pub fn path_misfit(rrup: &[f64], valid_distances: &DistanceMatrix) -> PathMisfit {
    let per_record: Vec<f64> = rrup
        .iter()
        .enumerate()
        .map(|(i, &r)| (r - valid_distances.row(i).sum()).abs())
        .collect();
    let max = per_record.iter().copied().fold(0.0, f64::max);
    let mean = if per_record.is_empty() {
        0.0
    } else {
        per_record.iter().sum::<f64>() / per_record.len() as f64
    };
    PathMisfit { per_record, max, mean }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CellInfo;

    fn cell(cellid: CellId, name: &str, x: f64) -> CellInfo {
        CellInfo {
            cellid,
            name: name.to_string(),
            mpt_x: x,
            mpt_y: -x,
            mpt_z: 0.0,
            mpt_lat: 0.0,
            mpt_lon: 0.0,
            utm_zone: String::new(),
        }
    }

    #[test]
    fn test_filter_drops_zero_columns() {
        let cells = CellInfoTable::new(vec![cell(1, "a", 1.0), cell(2, "b", 2.0), cell(3, "c", 3.0)])
            .unwrap();
        let d = DistanceMatrix::from_row_slice(2, 3, &[1.0, 0.0, 0.0, 0.5, 0.0, 2.0]);
        let net = filter_cells(&d, &cells).unwrap();
        assert_eq!(net.valid_ids, vec![1, 3]);
        assert_eq!(net.excluded_ids, vec![2]);
        assert_eq!(net.valid_positions, vec![0, 2]);
        assert_eq!(net.distances.ncols(), 2);
        assert!((net.distances[(1, 1)] - 2.0).abs() < 1e-12);
        assert!((net.coordinates[(1, 0)] - 3.0).abs() < 1e-12);
        assert!((net.coordinates[(1, 1)] + 3.0).abs() < 1e-12);
    }

    fn one_record() -> RecordTable {
        RecordTable::new(vec![crate::data::Record {
            rsn: 5,
            eqid: 1,
            mag: 5.0,
            eq_x: 0.0,
            eq_y: 0.0,
            ssn: 2,
            vs30: 400.0,
            sta_x: 1.0,
            sta_y: 1.0,
            rrup: 4.0,
            residual: 0.0,
            location: None,
        }])
        .unwrap()
    }

    #[test]
    fn test_align_rejects_crossed_unknown_cell() {
        let cells = CellInfoTable::new(vec![cell(1, "a", 1.0)]).unwrap();
        let table = CellDistanceTable::new(
            vec![5],
            vec!["a".to_string(), "z".to_string()],
            DistanceMatrix::from_row_slice(1, 2, &[3.0, 1.0]),
        )
        .unwrap();
        let err = align_distances(&one_record(), &cells, &table).unwrap_err();
        assert!(err.is_alignment());
        assert!(matches!(err, Error::UnknownCell { record: 5, ref cell } if cell == "z"));
    }

    #[test]
    fn test_align_ignores_empty_unknown_cell() {
        let cells = CellInfoTable::new(vec![cell(1, "a", 1.0)]).unwrap();
        let table = CellDistanceTable::new(
            vec![5],
            vec!["z".to_string(), "a".to_string()],
            DistanceMatrix::from_row_slice(1, 2, &[0.0, 4.0]),
        )
        .unwrap();
        let aligned = align_distances(&one_record(), &cells, &table).unwrap();
        assert_eq!(aligned.ncols(), 1);
        assert!((aligned[(0, 0)] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_path_misfit() {
        let d = DistanceMatrix::from_row_slice(2, 2, &[3.0, 4.0, 1.0, 1.0]);
        let misfit = path_misfit(&[7.0, 5.0], &d);
        assert!((misfit.per_record[0]).abs() < 1e-12);
        assert!((misfit.per_record[1] - 3.0).abs() < 1e-12);
        assert!((misfit.max - 3.0).abs() < 1e-12);
        assert!((misfit.mean - 1.5).abs() < 1e-12);
    }
}
