//! Pool named posterior arrays into one draws x columns matrix.

use crate::config::DrawsAxis;
use crate::constants::HYPERPARAMETERS;
use crate::error::{Error, Result};
use crate::sampler::{ParamArray, PosteriorFit};
use crate::types::DrawMatrix;

use super::layout::{ColumnLayout, TermKind};

/// Pooled posterior draws with their column layout.
///
/// Rows are draws (all chains pooled), columns follow [`ColumnLayout`].
#[derive(Debug, Clone)]
pub struct PosteriorSamples {
    draws: DrawMatrix,
    layout: ColumnLayout,
}

impl PosteriorSamples {
    /// Wrap an already pooled matrix.
    pub fn new(draws: DrawMatrix, layout: ColumnLayout) -> Result<Self> {
        if draws.ncols() != layout.len() {
            return Err(Error::ColumnCount { expected: layout.len(), actual: draws.ncols() });
        }
        Ok(Self { draws, layout })
    }

    /// Number of draws.
    pub fn n_draws(&self) -> usize {
        self.draws.nrows()
    }

    /// The pooled matrix.
    pub fn draws(&self) -> &DrawMatrix {
        &self.draws
    }

    /// Column layout.
    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// Draws of column `j`.
    pub fn column(&self, j: usize) -> &[f64] {
        let n = self.draws.nrows();
        &self.draws.as_slice()[j * n..(j + 1) * n]
    }

    /// Draws of a column looked up by name (`"phi_0"`, `"dc_1e.3"`, `"c_cap.17"`, ...).
    pub fn column_named(&self, name: &str) -> Option<&[f64]> {
        self.layout.position(name).map(|j| self.column(j))
    }

    /// Draws of every group of a term, in group order.
    pub fn term_columns(&self, term: TermKind) -> impl Iterator<Item = &[f64]> + '_ {
        self.layout.range(term).map(move |j| self.column(j))
    }
}

/// Flatten the fit into the pooled matrix described by `layout`.
///
/// Hyperparameters are flattened to one value per draw. Per-group arrays
/// stored groups-first are transposed so that draws always lead. Fails if a
/// parameter is missing, if a parameter's shape disagrees with the layout or
/// with the draw count of the other parameters, or if the fit holds no draws.
pub fn extract_posterior(fit: &PosteriorFit, layout: &ColumnLayout) -> Result<PosteriorSamples> {
    let n_draws = hyper_draws(fit)?;
    if n_draws == 0 {
        return Err(Error::EmptyPosterior);
    }

    // Column-major buffer: each column's draws are contiguous
    let mut values = Vec::with_capacity(n_draws * layout.len());
    let mut n_columns = 0;

    for name in HYPERPARAMETERS {
        let array = require(fit, name)?;
        if array.len() != n_draws {
            return Err(Error::ParameterShape {
                name: name.to_string(),
                expected: vec![n_draws],
                actual: array.shape().to_vec(),
            });
        }
        values.extend_from_slice(array.values());
        n_columns += 1;
    }

    for term in TermKind::ALL {
        let n_groups = layout.count(term);
        let name = term.param_name();
        let array = match fit.get(name) {
            Some(array) => array,
            // A term without groups may be omitted by the engine
            None if n_groups == 0 => continue,
            None => return Err(Error::MissingParameter { name: name.to_string() }),
        };
        let leading = draws_leading(array, fit.draws_axis());
        if leading.shape() != [n_draws, n_groups] {
            return Err(Error::ParameterShape {
                name: name.to_string(),
                expected: vec![n_draws, n_groups],
                actual: leading.shape().to_vec(),
            });
        }
        let row_major = leading.values();
        for g in 0..n_groups {
            values.extend((0..n_draws).map(|d| row_major[d * n_groups + g]));
        }
        n_columns += n_groups;
    }

    if n_columns != layout.len() {
        return Err(Error::ColumnCount { expected: layout.len(), actual: n_columns });
    }

    tracing::debug!(draws = n_draws, columns = n_columns, "extracted pooled posterior");
    PosteriorSamples::new(DrawMatrix::from_vec(n_draws, n_columns, values), layout.clone())
}

fn require<'a>(fit: &'a PosteriorFit, name: &str) -> Result<&'a ParamArray> {
    fit.get(name).ok_or_else(|| Error::MissingParameter { name: name.to_string() })
}

/// Draw count, taken from the first hyperparameter.
fn hyper_draws(fit: &PosteriorFit) -> Result<usize> {
    Ok(require(fit, HYPERPARAMETERS[0])?.len())
}

/// Non-2-D arrays are returned as-is and rejected by the shape check.
fn draws_leading(array: &ParamArray, axis: DrawsAxis) -> ParamArray {
    match (axis, array.transposed()) {
        (DrawsAxis::Trailing, Some(t)) => t,
        _ => array.clone(),
    }
}
