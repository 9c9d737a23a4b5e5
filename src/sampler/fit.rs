//! Fit object: named posterior sample arrays as returned by the engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{DrawsAxis, EngineVersion};
use crate::error::{Error, Result};

/// A dense row-major sample array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamArray {
    shape: Vec<usize>,
    values: Vec<f64>,
}

impl ParamArray {
    /// Wrap row-major values with an explicit shape.
    pub fn new(shape: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(Error::ShapeMismatch {
                what: format!("sample array of shape {:?}", shape),
                expected,
                actual: values.len(),
            });
        }
        Ok(Self { shape, values })
    }

    /// One value per draw.
    pub fn scalar(draws: Vec<f64>) -> Self {
        Self { shape: vec![draws.len()], values: draws }
    }

    /// Two-dimensional array from row-major values.
    pub fn matrix(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        Self::new(vec![rows, cols], values)
    }

    /// Array shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Row-major values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the array holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Transpose a two-dimensional array.
    ///
    /// Returns `None` for arrays that are not two-dimensional.
    pub fn transposed(&self) -> Option<Self> {
        let &[rows, cols] = self.shape.as_slice() else {
            return None;
        };
        let mut values = Vec::with_capacity(self.values.len());
        for j in 0..cols {
            for i in 0..rows {
                values.push(self.values[i * cols + j]);
            }
        }
        Some(Self { shape: vec![cols, rows], values })
    }
}

/// Posterior fit: one sample array per declared model parameter.
///
/// Per-group arrays are stored in the orientation of the engine that
/// produced them; see [`DrawsAxis`]. Consumers go through the posterior
/// extractor, which normalizes orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorFit {
    draws_axis: DrawsAxis,
    params: BTreeMap<String, ParamArray>,
}

impl PosteriorFit {
    /// Empty fit with the given orientation.
    pub fn new(draws_axis: DrawsAxis) -> Self {
        Self { draws_axis, params: BTreeMap::new() }
    }

    /// Empty fit in the orientation used by `engine`.
    pub fn for_engine(engine: EngineVersion) -> Self {
        Self::new(engine.draws_axis())
    }

    /// Add or replace a parameter array.
    pub fn insert(&mut self, name: impl Into<String>, array: ParamArray) {
        self.params.insert(name.into(), array);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, array: ParamArray) -> Self {
        self.insert(name, array);
        self
    }

    /// Sample array of a parameter.
    pub fn get(&self, name: &str) -> Option<&ParamArray> {
        self.params.get(name)
    }

    /// Parameter names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Orientation of per-group arrays.
    pub fn draws_axis(&self) -> DrawsAxis {
        self.draws_axis
    }

    pub(crate) fn params(&self) -> &BTreeMap<String, ParamArray> {
        &self.params
    }
}
