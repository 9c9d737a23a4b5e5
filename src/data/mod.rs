//! Input tables for a regression run.
//!
//! - **Records** (flatfile): one row per ground-motion record, keyed by `rsn`
//! - **Earthquakes / stations**: coordinate tables keyed by `eqid` / `ssn`
//! - **Cell metadata**: attenuation cells keyed by `cellid`
//! - **Cell distances**: path length of every record through every cell
//!
//! The [`csv`] submodule loads these tables from comma-separated files.

pub mod csv;
mod tables;

pub use tables::{
    CellDistanceTable, CellInfo, CellInfoTable, Earthquake, EarthquakeTable, Keyed, KeyedTable,
    Record, RecordLocation, RecordTable, Station, StationTable,
};
