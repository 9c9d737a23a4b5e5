//! # nonergodic-gmm
//!
//! Data assembly and posterior decomposition for non-ergodic ground-motion
//! regressions with cell-based anelastic attenuation.
//!
//! The Bayesian sampler is external. This crate does the index-sensitive work
//! around it:
//! - Assembles the sampler payload from record, earthquake, station and cell tables
//! - Drops attenuation cells no path crosses and reports the path-length misfit
//! - Pools the posterior into one draws x parameters matrix with a fixed column order
//! - Broadcasts per-group coefficients back to records
//! - Splits residuals into between-event and within-event parts
//!
//! ## Group indices
//!
//! Earthquakes and stations are numbered densely in `[0, n_groups)`. The payload
//! carries 1-based indices, as the sampler expects; the decomposition uses the
//! 0-based inverse kept on [`AssembledModel`]. Both come from the same
//! [`GroupIndex`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use nonergodic_gmm::{NonErgodicRegression, ModelInputs, JsonFitCache};
//!
//! let inputs = ModelInputs {
//!     records: &records,
//!     earthquakes: &earthquakes,
//!     stations: &stations,
//!     cells: &cells,
//!     distances: &distances,
//! };
//!
//! let outcome = NonErgodicRegression::new()
//!     .n_iter(600)
//!     .n_chains(4)
//!     .run(&inputs, &my_sampler, &JsonFitCache::new("out"))?;
//!
//! println!("{}", nonergodic_gmm::output::format_outcome(&outcome));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod constants;
mod error;
mod regression;
mod result;
mod thread_pool;
mod types;

// Functional modules
pub mod assembly;
pub mod data;
pub mod decomposition;
pub mod output;
pub mod posterior;
pub mod sampler;
pub mod statistics;

// Re-exports for public API
pub use assembly::{assemble, AssembledModel, GroupIndex, ModelInputs, ModelPayload, PayloadWire};
pub use config::{
    DrawsAxis, EngineVersion, FitSource, GroupOrdering, ParallelismPlan, RunConfig,
};
pub use constants::{
    hyperposterior_grid, CONSTANT_SHIFT, HYPERPARAMETERS, HYPER_PERCENTILES, PHI_0, TAU_0,
};
pub use error::{Error, Result};
pub use posterior::{extract_posterior, ColumnLayout, PosteriorSamples, TermKind};
pub use regression::NonErgodicRegression;
pub use result::{
    AleatoryTerms, AssemblyDiagnostics, CellAttenuationRow, CoefficientRow, HyperparameterRow,
    HyperparameterTable, RecordSite, RegressionOutcome, ResidualRow, RunMetadata,
};
pub use sampler::{
    load_or_sample, ChainSampler, FitCache, FitOrigin, JsonFitCache, MemoryFitCache, NoCache,
    ParallelChains, ParamArray, PosteriorFit, Sampler, SamplerRun,
};
pub use types::{
    coordinates_from_pairs, CellId, Coordinates, DistanceMatrix, DrawMatrix, EarthquakeId,
    RecordId, RecordVector, StationId,
};

/// Convenience function running the full pipeline with default configuration.
///
/// Always samples; nothing is cached.
///
/// # Returns
///
/// A `RegressionOutcome` with the coefficient and residual tables.
pub fn run<S: Sampler + ?Sized>(inputs: &ModelInputs<'_>, sampler: &S) -> Result<RegressionOutcome> {
    NonErgodicRegression::new().run(inputs, sampler, &NoCache)
}
