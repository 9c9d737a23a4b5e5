//! Posterior extraction.
//!
//! The fit object is flattened into one matrix with draws as rows and a
//! fixed column order: the global hyperparameters, then `dc_1e` per
//! earthquake, `dc_1as` and `dc_1bs` per station, `c_cap` per valid cell and
//! `dB` per earthquake. The order is generated by [`ColumnLayout`] from the
//! group counts of the assembled model.

mod extract;
mod layout;

pub use extract::{extract_posterior, PosteriorSamples};
pub use layout::{Column, ColumnLayout, TermKind};
