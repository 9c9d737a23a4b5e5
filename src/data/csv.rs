//! CSV parsing for the input tables.
//!
//! Columns are located by header name, so column order in the files does
//! not matter. Optional location columns are picked up when present.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::tables::{
    CellDistanceTable, CellInfo, CellInfoTable, Record, RecordLocation, RecordTable,
};
use crate::error::{Error, Result};
use crate::types::DistanceMatrix;

/// Header plus raw cells of a comma-separated file.
struct RawTable {
    header: Vec<String>,
    rows: Vec<(usize, Vec<String>)>,
}

impl RawTable {
    fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut header: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line = line.trim();

            // Skip empty lines
            if line.is_empty() {
                continue;
            }

            let fields: Vec<String> = line.split(',').map(|f| f.trim().to_string()).collect();
            match &header {
                None => header = Some(fields),
                Some(h) => {
                    if fields.len() != h.len() {
                        return Err(Error::Parse {
                            line: line_num + 1,
                            message: format!("expected {} columns, got {}", h.len(), fields.len()),
                        });
                    }
                    rows.push((line_num + 1, fields));
                }
            }
        }

        let header = header.ok_or(Error::Parse { line: 1, message: "missing header".to_string() })?;
        Ok(Self { header, rows })
    }

    fn column(&self, name: &str) -> Result<usize> {
        self.optional_column(name)
            .ok_or_else(|| Error::MissingColumn { column: name.to_string() })
    }

    fn optional_column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }
}

fn parse_f64(value: &str, line: usize) -> Result<f64> {
    value.parse().map_err(|_| Error::Parse {
        line,
        message: format!("invalid number '{}'", value),
    })
}

/// Parse an integer id, accepting integral floats such as `12.0`.
fn parse_id(value: &str, line: usize) -> Result<u64> {
    if let Ok(id) = value.parse::<u64>() {
        return Ok(id);
    }
    match value.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 && v.is_finite() => Ok(v as u64),
        _ => Err(Error::Parse { line, message: format!("invalid identifier '{}'", value) }),
    }
}

/// Load the records table (flatfile).
///
/// Required columns: `rsn, eqid, mag, eqX, eqY, ssn, Vs30, staX, staY, Rrup`
/// and the residual column named by `residual_column`. When all of
/// `eqLat, eqLon, staLat, staLon, UTMzone` are present they are kept as
/// record location.
pub fn load_records(path: &Path, residual_column: &str) -> Result<RecordTable> {
    parse_records(BufReader::new(File::open(path)?), residual_column)
}

/// Parse the records table from any reader.
pub fn parse_records<R: BufRead>(reader: R, residual_column: &str) -> Result<RecordTable> {
    let raw = RawTable::read(reader)?;
    let rsn = raw.column("rsn")?;
    let eqid = raw.column("eqid")?;
    let mag = raw.column("mag")?;
    let eq_x = raw.column("eqX")?;
    let eq_y = raw.column("eqY")?;
    let ssn = raw.column("ssn")?;
    let vs30 = raw.column("Vs30")?;
    let sta_x = raw.column("staX")?;
    let sta_y = raw.column("staY")?;
    let rrup = raw.column("Rrup")?;
    let res = raw.column(residual_column)?;

    let location_cols = [
        raw.optional_column("eqLat"),
        raw.optional_column("eqLon"),
        raw.optional_column("staLat"),
        raw.optional_column("staLon"),
        raw.optional_column("UTMzone"),
    ];

    let mut records = Vec::with_capacity(raw.rows.len());
    for (line, f) in &raw.rows {
        let line = *line;
        let location = match location_cols {
            [Some(a), Some(b), Some(c), Some(d), Some(z)] => Some(RecordLocation {
                eq_lat: parse_f64(&f[a], line)?,
                eq_lon: parse_f64(&f[b], line)?,
                sta_lat: parse_f64(&f[c], line)?,
                sta_lon: parse_f64(&f[d], line)?,
                utm_zone: f[z].clone(),
            }),
            _ => None,
        };
        records.push(Record {
            rsn: parse_id(&f[rsn], line)?,
            eqid: parse_id(&f[eqid], line)?,
            mag: parse_f64(&f[mag], line)?,
            eq_x: parse_f64(&f[eq_x], line)?,
            eq_y: parse_f64(&f[eq_y], line)?,
            ssn: parse_id(&f[ssn], line)?,
            vs30: parse_f64(&f[vs30], line)?,
            sta_x: parse_f64(&f[sta_x], line)?,
            sta_y: parse_f64(&f[sta_y], line)?,
            rrup: parse_f64(&f[rrup], line)?,
            residual: parse_f64(&f[res], line)?,
            location,
        });
    }

    RecordTable::new(records)
}

/// Load the cell metadata table.
///
/// Required columns: `cellid, cellname, mptX, mptY`. Optional: `mptZ, mptLat,
/// mptLon, UTMzone`.
pub fn load_cell_info(path: &Path) -> Result<CellInfoTable> {
    parse_cell_info(BufReader::new(File::open(path)?))
}

/// Parse the cell metadata table from any reader.
pub fn parse_cell_info<R: BufRead>(reader: R) -> Result<CellInfoTable> {
    let raw = RawTable::read(reader)?;
    let cellid = raw.column("cellid")?;
    let name = raw.column("cellname")?;
    let mpt_x = raw.column("mptX")?;
    let mpt_y = raw.column("mptY")?;
    let mpt_z = raw.optional_column("mptZ");
    let mpt_lat = raw.optional_column("mptLat");
    let mpt_lon = raw.optional_column("mptLon");
    let utm = raw.optional_column("UTMzone");

    let optional = |col: Option<usize>, f: &[String], line: usize| -> Result<f64> {
        col.map_or(Ok(0.0), |c| parse_f64(&f[c], line))
    };

    let mut cells = Vec::with_capacity(raw.rows.len());
    for (line, f) in &raw.rows {
        let line = *line;
        cells.push(CellInfo {
            cellid: parse_id(&f[cellid], line)?,
            name: f[name].clone(),
            mpt_x: parse_f64(&f[mpt_x], line)?,
            mpt_y: parse_f64(&f[mpt_y], line)?,
            mpt_z: optional(mpt_z, f.as_slice(), line)?,
            mpt_lat: optional(mpt_lat, f.as_slice(), line)?,
            mpt_lon: optional(mpt_lon, f.as_slice(), line)?,
            utm_zone: utm.map(|c| f[c].clone()).unwrap_or_default(),
        });
    }

    CellInfoTable::new(cells)
}

/// Load the cell-distance table: an `rsn` column plus one column per cell name.
///
/// Every column other than `rsn` is treated as a cell.
pub fn load_cell_distances(path: &Path) -> Result<CellDistanceTable> {
    parse_cell_distances(BufReader::new(File::open(path)?))
}

/// Parse the cell-distance table from any reader.
pub fn parse_cell_distances<R: BufRead>(reader: R) -> Result<CellDistanceTable> {
    let raw = RawTable::read(reader)?;
    let rsn = raw.column("rsn")?;
    let cell_cols: Vec<usize> = (0..raw.header.len()).filter(|&j| j != rsn).collect();
    let cell_names: Vec<String> = cell_cols.iter().map(|&j| raw.header[j].clone()).collect();

    let mut record_ids = Vec::with_capacity(raw.rows.len());
    let mut values = Vec::with_capacity(raw.rows.len() * cell_cols.len());
    for (line, f) in &raw.rows {
        record_ids.push(parse_id(&f[rsn], *line)?);
        for &j in &cell_cols {
            values.push(parse_f64(&f[j], *line)?);
        }
    }

    let distances = DistanceMatrix::from_row_slice(record_ids.len(), cell_names.len(), &values);
    CellDistanceTable::new(record_ids, cell_names, distances)
}
