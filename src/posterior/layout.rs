//! Column layout of the pooled posterior matrix.
//!
//! The layout is generated from the group counts of an assembled model, so
//! column names can never drift from the payload.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::assembly::AssembledModel;
use crate::constants::HYPERPARAMETERS;
use crate::types::CellId;

/// Per-group model terms, in pooled-matrix order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermKind {
    /// Spatially varying earthquake constant (`dc_1e`), one per earthquake.
    EarthquakeConstant,
    /// Spatially varying station constant (`dc_1as`), one per station.
    StationConstant,
    /// Spatially independent site term (`dc_1bs`), one per station.
    StationSiteTerm,
    /// Cell anelastic attenuation coefficient (`c_cap`), one per valid cell.
    CellAttenuation,
    /// Between-event random effect (`dB`), one per earthquake.
    EventTerm,
}

impl TermKind {
    /// All per-group terms in column order.
    pub const ALL: [TermKind; 5] = [
        TermKind::EarthquakeConstant,
        TermKind::StationConstant,
        TermKind::StationSiteTerm,
        TermKind::CellAttenuation,
        TermKind::EventTerm,
    ];

    /// Parameter name in the fit object.
    pub fn param_name(self) -> &'static str {
        match self {
            TermKind::EarthquakeConstant => "dc_1e",
            TermKind::StationConstant => "dc_1as",
            TermKind::StationSiteTerm => "dc_1bs",
            TermKind::CellAttenuation => "c_cap",
            TermKind::EventTerm => "dB",
        }
    }
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param_name())
    }
}

/// What a pooled-matrix column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Column {
    /// Global hyperparameter, by position in [`HYPERPARAMETERS`].
    Hyper(usize),
    /// Group `group` (0-based) of a per-group term.
    Group {
        /// Term.
        term: TermKind,
        /// Group position.
        group: usize,
    },
}

/// Ordered list of pooled-matrix columns with their names.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    columns: Vec<Column>,
    names: Vec<String>,
    counts: [usize; 5],
    positions: HashMap<String, usize>,
}

impl ColumnLayout {
    /// Generate the layout for the given group counts.
    ///
    /// Cell columns are labelled with the cell identifiers of the valid
    /// cells, all other groups with their 0-based position.
    pub fn new(n_eq: usize, n_sta: usize, cell_ids: &[CellId]) -> Self {
        let counts = [n_eq, n_sta, n_sta, cell_ids.len(), n_eq];

        let mut columns = Vec::with_capacity(HYPERPARAMETERS.len() + counts.iter().sum::<usize>());
        let mut names = Vec::with_capacity(columns.capacity());
        for (i, name) in HYPERPARAMETERS.iter().enumerate() {
            columns.push(Column::Hyper(i));
            names.push((*name).to_string());
        }
        for (term, &count) in TermKind::ALL.iter().zip(&counts) {
            for group in 0..count {
                let label = match term {
                    TermKind::CellAttenuation => cell_ids[group].to_string(),
                    _ => group.to_string(),
                };
                columns.push(Column::Group { term: *term, group });
                names.push(format!("{}.{}", term.param_name(), label));
            }
        }

        let positions = names.iter().enumerate().map(|(i, n)| (n.clone(), i)).collect();
        Self { columns, names, counts, positions }
    }

    /// Layout of an assembled model.
    pub fn for_model(model: &AssembledModel) -> Self {
        Self::new(model.payload.n_eq, model.payload.n_sta, &model.cells.valid_ids)
    }

    /// Total number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True if the layout has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of groups of a term.
    pub fn count(&self, term: TermKind) -> usize {
        self.counts[term_slot(term)]
    }

    /// Column range covered by a term.
    pub fn range(&self, term: TermKind) -> Range<usize> {
        let slot = term_slot(term);
        let start = HYPERPARAMETERS.len() + self.counts[..slot].iter().sum::<usize>();
        start..start + self.counts[slot]
    }

    /// Column range of the hyperparameters.
    pub fn hyper_range(&self) -> Range<usize> {
        0..HYPERPARAMETERS.len()
    }

    /// Position of a named column.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }
}

fn term_slot(term: TermKind) -> usize {
    match term {
        TermKind::EarthquakeConstant => 0,
        TermKind::StationConstant => 1,
        TermKind::StationSiteTerm => 2,
        TermKind::CellAttenuation => 3,
        TermKind::EventTerm => 4,
    }
}
