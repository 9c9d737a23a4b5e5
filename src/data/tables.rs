//! In-memory input tables.
//!
//! Tables are read-only after construction. Constructors reject duplicate
//! keys so later lookups are unambiguous.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{CellId, DistanceMatrix, EarthquakeId, RecordId, StationId};

/// A row addressable by a unique key.
pub trait Keyed {
    /// Key type.
    type Key: Copy + Eq + Hash + Display;

    /// Table name used in error messages.
    const TABLE: &'static str;

    /// Row key.
    fn key(&self) -> Self::Key;
}

/// Rows with unique keys, kept in their original order.
#[derive(Debug, Clone)]
pub struct KeyedTable<R: Keyed> {
    rows: Vec<R>,
    positions: HashMap<R::Key, usize>,
}

impl<R: Keyed> KeyedTable<R> {
    /// Build a table, failing on the first repeated key.
    pub fn new(rows: Vec<R>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if positions.insert(row.key(), i).is_some() {
                return Err(Error::DuplicateKey {
                    table: R::TABLE,
                    key: row.key().to_string(),
                });
            }
        }
        Ok(Self { rows, positions })
    }

    /// Row with the given key.
    pub fn get(&self, key: R::Key) -> Option<&R> {
        self.positions.get(&key).map(|&i| &self.rows[i])
    }

    /// Position of the row with the given key.
    pub fn position(&self, key: R::Key) -> Option<usize> {
        self.positions.get(&key).copied()
    }

    /// Rows in table order.
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Geographic context carried through to the output tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RecordLocation {
    /// Earthquake latitude.
    pub eq_lat: f64,
    /// Earthquake longitude.
    pub eq_lon: f64,
    /// Station latitude.
    pub sta_lat: f64,
    /// Station longitude.
    pub sta_lon: f64,
    /// UTM zone of the projected coordinates.
    pub utm_zone: String,
}

/// One ground-motion record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Record sequence number.
    pub rsn: RecordId,
    /// Earthquake identifier.
    pub eqid: EarthquakeId,
    /// Moment magnitude.
    pub mag: f64,
    /// Earthquake X (km).
    pub eq_x: f64,
    /// Earthquake Y (km).
    pub eq_y: f64,
    /// Station sequence number.
    pub ssn: StationId,
    /// Time-averaged shear-wave velocity in the top 30 m.
    pub vs30: f64,
    /// Station X (km).
    pub sta_x: f64,
    /// Station Y (km).
    pub sta_y: f64,
    /// Rupture distance (km); the total path length the cells should tile.
    pub rrup: f64,
    /// Total residual to be decomposed.
    pub residual: f64,
    /// Optional lat/lon context.
    pub location: Option<RecordLocation>,
}

impl Keyed for Record {
    type Key = RecordId;
    const TABLE: &'static str = "records";

    fn key(&self) -> RecordId {
        self.rsn
    }
}

/// Records table keyed by `rsn`.
pub type RecordTable = KeyedTable<Record>;

impl RecordTable {
    /// Observed residuals in record order.
    pub fn residuals(&self) -> Vec<f64> {
        self.rows().iter().map(|r| r.residual).collect()
    }

    /// Rupture distances in record order.
    pub fn rupture_distances(&self) -> Vec<f64> {
        self.rows().iter().map(|r| r.rrup).collect()
    }
}

/// Earthquake coordinate row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Earthquake {
    /// Earthquake identifier.
    pub eqid: EarthquakeId,
    /// Moment magnitude.
    pub mag: f64,
    /// X (km).
    pub x: f64,
    /// Y (km).
    pub y: f64,
}

impl Keyed for Earthquake {
    type Key = EarthquakeId;
    const TABLE: &'static str = "earthquakes";

    fn key(&self) -> EarthquakeId {
        self.eqid
    }
}

/// Earthquake table keyed by `eqid`.
pub type EarthquakeTable = KeyedTable<Earthquake>;

impl EarthquakeTable {
    /// Derive the earthquake table from the records, first occurrence wins.
    pub fn from_records(records: &RecordTable) -> Self {
        let mut rows: Vec<Earthquake> = Vec::new();
        let mut positions = HashMap::new();
        for r in records.rows() {
            positions.entry(r.eqid).or_insert_with(|| {
                rows.push(Earthquake { eqid: r.eqid, mag: r.mag, x: r.eq_x, y: r.eq_y });
                rows.len() - 1
            });
        }
        Self { rows, positions }
    }
}

/// Station coordinate row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Station sequence number.
    pub ssn: StationId,
    /// Vs30 (m/s).
    pub vs30: f64,
    /// X (km).
    pub x: f64,
    /// Y (km).
    pub y: f64,
}

impl Keyed for Station {
    type Key = StationId;
    const TABLE: &'static str = "stations";

    fn key(&self) -> StationId {
        self.ssn
    }
}

/// Station table keyed by `ssn`.
pub type StationTable = KeyedTable<Station>;

impl StationTable {
    /// Derive the station table from the records, first occurrence wins.
    pub fn from_records(records: &RecordTable) -> Self {
        let mut rows: Vec<Station> = Vec::new();
        let mut positions = HashMap::new();
        for r in records.rows() {
            positions.entry(r.ssn).or_insert_with(|| {
                rows.push(Station { ssn: r.ssn, vs30: r.vs30, x: r.sta_x, y: r.sta_y });
                rows.len() - 1
            });
        }
        Self { rows, positions }
    }
}

/// Anelastic attenuation cell metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellInfo {
    /// Cell identifier.
    pub cellid: CellId,
    /// Cell name; matches a column of the distance table.
    pub name: String,
    /// Midpoint X (km).
    pub mpt_x: f64,
    /// Midpoint Y (km).
    pub mpt_y: f64,
    /// Midpoint depth (km).
    pub mpt_z: f64,
    /// Midpoint latitude.
    pub mpt_lat: f64,
    /// Midpoint longitude.
    pub mpt_lon: f64,
    /// UTM zone of the projected coordinates.
    pub utm_zone: String,
}

impl Keyed for CellInfo {
    type Key = CellId;
    const TABLE: &'static str = "cells";

    fn key(&self) -> CellId {
        self.cellid
    }
}

/// Cell metadata keyed by `cellid`.
pub type CellInfoTable = KeyedTable<CellInfo>;

/// Path length of every record through every cell.
#[derive(Debug, Clone)]
pub struct CellDistanceTable {
    cell_names: Vec<String>,
    record_ids: Vec<RecordId>,
    distances: DistanceMatrix,
    rows_by_record: HashMap<RecordId, usize>,
    columns_by_name: HashMap<String, usize>,
}

impl CellDistanceTable {
    /// Build the table; `distances` is `record_ids.len() x cell_names.len()`.
    pub fn new(
        record_ids: Vec<RecordId>,
        cell_names: Vec<String>,
        distances: DistanceMatrix,
    ) -> Result<Self> {
        if distances.nrows() != record_ids.len() {
            return Err(Error::ShapeMismatch {
                what: "cell-distance rows".to_string(),
                expected: record_ids.len(),
                actual: distances.nrows(),
            });
        }
        if distances.ncols() != cell_names.len() {
            return Err(Error::ShapeMismatch {
                what: "cell-distance columns".to_string(),
                expected: cell_names.len(),
                actual: distances.ncols(),
            });
        }

        let mut rows_by_record = HashMap::with_capacity(record_ids.len());
        for (i, &rsn) in record_ids.iter().enumerate() {
            if rows_by_record.insert(rsn, i).is_some() {
                return Err(Error::DuplicateKey { table: "cell-distance", key: rsn.to_string() });
            }
        }
        let mut columns_by_name = HashMap::with_capacity(cell_names.len());
        for (j, name) in cell_names.iter().enumerate() {
            if columns_by_name.insert(name.clone(), j).is_some() {
                return Err(Error::DuplicateKey { table: "cell-distance", key: name.clone() });
            }
        }

        Ok(Self { cell_names, record_ids, distances, rows_by_record, columns_by_name })
    }

    /// Row of the given record.
    pub fn row_of(&self, rsn: RecordId) -> Option<usize> {
        self.rows_by_record.get(&rsn).copied()
    }

    /// Column of the given cell name.
    pub fn column_of(&self, name: &str) -> Option<usize> {
        self.columns_by_name.get(name).copied()
    }

    /// Raw distance matrix in table order.
    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    /// Cell names in column order.
    pub fn cell_names(&self) -> &[String] {
        &self.cell_names
    }

    /// Record ids in row order.
    pub fn record_ids(&self) -> &[RecordId] {
        &self.record_ids
    }
}
