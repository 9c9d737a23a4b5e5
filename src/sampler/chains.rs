//! Independent chains run concurrently and pooled into a single fit.

use std::collections::BTreeMap;

use super::fit::{ParamArray, PosteriorFit};
use super::{Sampler, SamplerRun};
use crate::assembly::ModelPayload;
use crate::config::DrawsAxis;
use crate::error::{Error, Result};
use crate::thread_pool;

/// Engine that runs one chain at a time.
pub trait ChainSampler: Sync {
    /// Run chain `chain` (0-based) and return its draws.
    fn sample_chain(&self, payload: &ModelPayload, run: &SamplerRun, chain: usize)
        -> Result<PosteriorFit>;
}

/// Adapter running `n_chains` chains of a [`ChainSampler`] in parallel.
///
/// Concurrency is bounded by `run.parallelism.concurrent_chains`. Draws are
/// pooled in chain order with the draws axis leading. If any chain fails the
/// whole run fails; partial results are discarded.
#[derive(Debug, Clone)]
pub struct ParallelChains<S> {
    inner: S,
}

impl<S: ChainSampler> ParallelChains<S> {
    /// Wrap a single-chain sampler.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// The wrapped sampler.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: ChainSampler> Sampler for ParallelChains<S> {
    fn sample(&self, payload: &ModelPayload, run: &SamplerRun) -> Result<PosteriorFit> {
        tracing::info!(
            chains = run.n_chains,
            concurrent = run.parallelism.concurrent_chains,
            threads_per_chain = run.parallelism.threads_per_chain,
            "running sampler chains"
        );
        let results = run_chains(&self.inner, payload, run);

        let mut chains = Vec::with_capacity(results.len());
        for (chain, result) in results.into_iter().enumerate() {
            match result {
                Ok(fit) => chains.push(fit),
                Err(err) => {
                    return Err(Error::ChainFailed { chain, source: Box::new(err) });
                }
            }
        }
        pool_chains(&chains)
    }
}

#[cfg(feature = "parallel")]
fn run_chains<S: ChainSampler>(
    sampler: &S,
    payload: &ModelPayload,
    run: &SamplerRun,
) -> Vec<Result<PosteriorFit>> {
    use rayon::prelude::*;

    thread_pool::install(run.parallelism.concurrent_chains, || {
        (0..run.n_chains)
            .into_par_iter()
            .map(|chain| sampler.sample_chain(payload, run, chain))
            .collect()
    })
}

#[cfg(not(feature = "parallel"))]
fn run_chains<S: ChainSampler>(
    sampler: &S,
    payload: &ModelPayload,
    run: &SamplerRun,
) -> Vec<Result<PosteriorFit>> {
    thread_pool::install(run.parallelism.concurrent_chains, || {
        (0..run.n_chains)
            .map(|chain| sampler.sample_chain(payload, run, chain))
            .collect()
    })
}

/// Bring a per-group array to draws-leading orientation.
fn leading(array: &ParamArray, axis: DrawsAxis) -> ParamArray {
    match (axis, array.transposed()) {
        (DrawsAxis::Trailing, Some(t)) => t,
        _ => array.clone(),
    }
}

/// Concatenate chain fits along the draws axis.
fn pool_chains(chains: &[PosteriorFit]) -> Result<PosteriorFit> {
    let Some(first) = chains.first() else {
        return Err(Error::EmptyPosterior);
    };

    let mut pooled: BTreeMap<&str, (Vec<usize>, Vec<f64>)> = BTreeMap::new();
    for (chain, fit) in chains.iter().enumerate() {
        if fit.params().len() != first.params().len() {
            return Err(Error::ChainFailed {
                chain,
                source: Box::new(Error::ShapeMismatch {
                    what: "parameters per chain".to_string(),
                    expected: first.params().len(),
                    actual: fit.params().len(),
                }),
            });
        }
        for (name, array) in fit.params() {
            let array = leading(array, fit.draws_axis());
            let shape = array.shape();
            if chain == 0 {
                pooled.insert(name.as_str(), (shape.to_vec(), array.values().to_vec()));
                continue;
            }
            let Some((pooled_shape, values)) = pooled.get_mut(name.as_str()) else {
                return Err(Error::ChainFailed {
                    chain,
                    source: Box::new(Error::MissingParameter { name: name.clone() }),
                });
            };
            if pooled_shape.len() != shape.len() || pooled_shape.get(1..) != shape.get(1..) {
                return Err(Error::ParameterShape {
                    name: name.clone(),
                    expected: pooled_shape.clone(),
                    actual: shape.to_vec(),
                });
            }
            if let (Some(total), Some(draws)) = (pooled_shape.first_mut(), shape.first()) {
                *total += draws;
            }
            values.extend_from_slice(array.values());
        }
    }

    let mut fit = PosteriorFit::new(DrawsAxis::Leading);
    for (name, (shape, values)) in pooled {
        fit.insert(name, ParamArray::new(shape, values)?);
    }
    Ok(fit)
}
