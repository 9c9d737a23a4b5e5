//! Interface to the external Bayesian sampler.
//!
//! The sampler itself (compilation, HMC/NUTS, adaptation) lives outside this
//! crate. What is specified here is the data-in/data-out contract:
//!
//! - [`Sampler`]: consumes a [`ModelPayload`] and a [`SamplerRun`], returns a [`PosteriorFit`]
//! - [`ChainSampler`] + [`ParallelChains`]: run independent chains concurrently and pool them
//! - [`FitCache`] + [`load_or_sample`]: reuse a stored fit instead of sampling

mod cache;
mod chains;
mod fit;

pub use cache::{load_or_sample, FitCache, FitOrigin, JsonFitCache, MemoryFitCache, NoCache};
pub use chains::{ChainSampler, ParallelChains};
pub use fit::{ParamArray, PosteriorFit};

use serde::{Deserialize, Serialize};

use crate::assembly::ModelPayload;
use crate::config::{EngineVersion, ParallelismPlan, RunConfig};
use crate::error::Result;

/// Run settings handed to the sampler.
///
/// Everything process-wide (core counts, thread budgets) is resolved here
/// so the sampler never needs to consult the environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerRun {
    /// Posterior draws per chain.
    pub n_iter: usize,
    /// Number of chains.
    pub n_chains: usize,
    /// Target acceptance probability.
    pub adapt_delta: f64,
    /// Maximum tree depth.
    pub max_treedepth: u32,
    /// Engine generation.
    pub engine: EngineVersion,
    /// How chains share cores.
    pub parallelism: ParallelismPlan,
    /// Optional seed.
    pub seed: Option<u64>,
}

impl SamplerRun {
    /// Derive the sampler settings from a run configuration.
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            n_iter: config.n_iter,
            n_chains: config.n_chains,
            adapt_delta: config.adapt_delta,
            max_treedepth: config.max_treedepth,
            engine: config.engine,
            parallelism: config.parallelism(),
            seed: config.seed,
        }
    }
}

/// External inference engine.
///
/// Implementations block until every chain has finished. Failures are
/// returned as [`Error::Sampler`](crate::Error::Sampler) and are never retried.
pub trait Sampler {
    /// Sample the posterior of the model described by `payload`.
    fn sample(&self, payload: &ModelPayload, run: &SamplerRun) -> Result<PosteriorFit>;
}

impl<S: Sampler + ?Sized> Sampler for &S {
    fn sample(&self, payload: &ModelPayload, run: &SamplerRun) -> Result<PosteriorFit> {
        (**self).sample(payload, run)
    }
}
