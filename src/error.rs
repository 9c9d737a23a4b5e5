//! Error types for model assembly, posterior extraction and fit reuse.

use crate::types::{EarthquakeId, RecordId, StationId};

/// Errors raised by the regression pipeline.
///
/// Structural problems (misaligned tables, posterior arrays that do not match
/// the declared model) are fatal. Statistical-quality issues such as a
/// path-distance misfit are never errors; they surface as diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A record references an earthquake absent from the earthquake table.
    #[error("record {record} references earthquake {eqid}, which is absent from the earthquake table")]
    MissingEarthquake {
        /// Offending record.
        record: RecordId,
        /// Unknown earthquake identifier.
        eqid: EarthquakeId,
    },

    /// A record references a station absent from the station table.
    #[error("record {record} references station {ssn}, which is absent from the station table")]
    MissingStation {
        /// Offending record.
        record: RecordId,
        /// Unknown station identifier.
        ssn: StationId,
    },

    /// A cell listed in the cell metadata has no column in the distance table.
    #[error("cell '{cell}' has no column in the cell-distance table")]
    MissingCellColumn {
        /// Cell name.
        cell: String,
    },

    /// A record has path length in a distance column that matches no cell.
    #[error("record {record} crosses cell '{cell}', which is absent from the cell metadata")]
    UnknownCell {
        /// Offending record.
        record: RecordId,
        /// Distance-table column name.
        cell: String,
    },

    /// A record has no row in the cell-distance table.
    #[error("record {record} has no row in the cell-distance table")]
    MissingDistanceRow {
        /// Record without path distances.
        record: RecordId,
    },

    /// Two rows of a keyed table share the same key.
    #[error("duplicate key {key} in {table} table")]
    DuplicateKey {
        /// Table name.
        table: &'static str,
        /// Repeated key, formatted.
        key: String,
    },

    /// Table or array dimensions disagree.
    #[error("shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// What was being checked.
        what: String,
        /// Expected size.
        expected: usize,
        /// Actual size.
        actual: usize,
    },

    /// A parameter required by the column layout is missing from the fit.
    #[error("posterior parameter '{name}' is missing from the fit")]
    MissingParameter {
        /// Parameter name.
        name: String,
    },

    /// A parameter array does not have the shape the model declares.
    #[error("posterior parameter '{name}' has shape {actual:?}, expected {expected:?}")]
    ParameterShape {
        /// Parameter name.
        name: String,
        /// Expected shape (draws axis normalized to the front).
        expected: Vec<usize>,
        /// Shape found in the fit.
        actual: Vec<usize>,
    },

    /// The pooled matrix has a different width than the column layout.
    #[error("pooled posterior has {actual} columns, layout declares {expected}")]
    ColumnCount {
        /// Columns in the layout.
        expected: usize,
        /// Columns produced.
        actual: usize,
    },

    /// The fit holds no draws.
    #[error("posterior fit contains no draws")]
    EmptyPosterior,

    /// Failure reported by the external sampler, propagated as-is.
    #[error("sampler failed: {0}")]
    Sampler(String),

    /// One chain of a parallel run failed; no partial result is kept.
    #[error("chain {chain} failed: {source}")]
    ChainFailed {
        /// Chain number (0-based).
        chain: usize,
        /// Error the chain produced.
        #[source]
        source: Box<Error>,
    },

    /// Fit reuse was requested but nothing is cached under the key.
    #[error("no cached fit for '{key}'")]
    CacheMiss {
        /// Cache key (output name).
        key: String,
    },

    /// Malformed tabular input.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// Line number (1-indexed).
        line: usize,
        /// Description.
        message: String,
    },

    /// A required column is missing from a tabular input.
    #[error("missing column '{column}'")]
    MissingColumn {
        /// Column name.
        column: String,
    },

    /// Underlying IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for input-alignment errors: no payload can be built.
    pub fn is_alignment(&self) -> bool {
        matches!(
            self,
            Error::MissingEarthquake { .. }
                | Error::MissingStation { .. }
                | Error::MissingCellColumn { .. }
                | Error::UnknownCell { .. }
                | Error::MissingDistanceRow { .. }
                | Error::DuplicateKey { .. }
        )
    }

    /// True when the fit does not match the model the payload declared.
    pub fn is_extraction(&self) -> bool {
        matches!(
            self,
            Error::MissingParameter { .. }
                | Error::ParameterShape { .. }
                | Error::ColumnCount { .. }
                | Error::EmptyPosterior
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
