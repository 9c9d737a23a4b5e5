//! Type aliases and common types.

use nalgebra::{DMatrix, DVector, Dyn, OMatrix, U2};

/// Row key of the records table.
pub type RecordId = u64;

/// Earthquake identifier (`eqid`).
pub type EarthquakeId = u64;

/// Station sequence number (`ssn`).
pub type StationId = u64;

/// Attenuation cell identifier (`cellid`).
pub type CellId = u64;

/// One 2-D coordinate (X, Y) per row.
pub type Coordinates = OMatrix<f64, Dyn, U2>;

/// Records x cells path-distance matrix.
pub type DistanceMatrix = DMatrix<f64>;

/// Pooled posterior draws: one row per draw, one column per parameter.
pub type DrawMatrix = DMatrix<f64>;

/// Per-record column vector.
pub type RecordVector = DVector<f64>;

/// Build a coordinate matrix from `(x, y)` pairs.
pub fn coordinates_from_pairs(pairs: &[(f64, f64)]) -> Coordinates {
    Coordinates::from_fn(pairs.len(), |i, j| if j == 0 { pairs[i].0 } else { pairs[i].1 })
}
