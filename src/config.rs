//! Configuration for assembling, sampling and decomposing a regression run.

use serde::{Deserialize, Serialize};

/// Configuration options for `NonErgodicRegression`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Posterior draws per chain (default: 600).
    pub n_iter: usize,

    /// Number of MCMC chains (default: 4).
    pub n_chains: usize,

    /// Target average acceptance probability during adaptation (default: 0.8).
    pub adapt_delta: f64,

    /// Maximum tree depth, i.e. at most 2^depth evaluations per iteration (default: 10).
    pub max_treedepth: u32,

    /// Engine generation; decides the orientation of per-group sample arrays.
    pub engine: EngineVersion,

    /// Allow multi-threaded chains when enough cores are available (default: false).
    pub parallel_chains: bool,

    /// Cores the caller is willing to hand to the sampler.
    ///
    /// `None` is treated as a single core. Detection is the caller's job;
    /// nothing in this crate inspects the host.
    pub available_cores: Option<usize>,

    /// Run the sampler or reuse a cached fit.
    pub fit_source: FitSource,

    /// Output name; also the fit-cache key.
    pub output_name: String,

    /// Ergodic anelastic attenuation coefficient, the prior mean of the cell coefficients.
    pub c_a_erg: f64,

    /// How earthquake and station groups are numbered.
    pub group_ordering: GroupOrdering,

    /// Largest acceptable |Rrup - sum of valid cell distances| in km before warning (default: 1.0).
    pub path_misfit_tolerance: f64,

    /// Optional deterministic seed forwarded to the sampler.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            n_iter: 600,
            n_chains: 4,
            adapt_delta: 0.8,
            max_treedepth: 10,
            engine: EngineVersion::V2,
            parallel_chains: false,
            available_cores: None,
            fit_source: FitSource::Sample,
            output_name: "nonerg".to_string(),
            c_a_erg: 0.0,
            group_ordering: GroupOrdering::FirstAppearance,
            path_misfit_tolerance: 1.0,
            seed: None,
        }
    }
}

/// Generation of the external inference engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EngineVersion {
    /// Per-group arrays are stored draws x groups.
    #[default]
    V2,
    /// Per-group arrays are stored groups x draws.
    V3,
}

impl EngineVersion {
    /// Position of the draws axis in per-group arrays produced by this engine.
    pub fn draws_axis(self) -> DrawsAxis {
        match self {
            EngineVersion::V2 => DrawsAxis::Leading,
            EngineVersion::V3 => DrawsAxis::Trailing,
        }
    }
}

/// Where the draws live in a per-group sample array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawsAxis {
    /// `[draws, groups]`.
    Leading,
    /// `[groups, draws]`.
    Trailing,
}

/// Source of the posterior fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FitSource {
    /// Run the sampler and store the fit in the cache.
    #[default]
    Sample,
    /// Skip sampling and load the fit stored under `output_name`.
    Reuse,
}

/// Numbering of earthquake and station groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GroupOrdering {
    /// Groups numbered in order of first appearance in the records table.
    #[default]
    FirstAppearance,
    /// Groups numbered in ascending key order.
    Sorted,
}

/// Resolved parallelism handed to the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelismPlan {
    /// Cores usable after reserving one for the caller.
    pub usable_cores: usize,
    /// Chains run at the same time.
    pub concurrent_chains: usize,
    /// Threads each chain may use internally.
    pub threads_per_chain: usize,
}

impl RunConfig {
    /// Resolve how chains share the available cores.
    ///
    /// One core is always reserved. Chains get extra threads only when
    /// `parallel_chains` is set and there are more usable cores than chains.
    pub fn parallelism(&self) -> ParallelismPlan {
        let cores = self.available_cores.unwrap_or(1);
        let usable_cores = cores.saturating_sub(1).max(1);
        let n_chains = self.n_chains.max(1);

        if !self.parallel_chains || usable_cores <= n_chains {
            ParallelismPlan {
                usable_cores,
                concurrent_chains: n_chains.min(usable_cores),
                threads_per_chain: 1,
            }
        } else {
            ParallelismPlan {
                usable_cores,
                concurrent_chains: n_chains,
                threads_per_chain: usable_cores / n_chains,
            }
        }
    }

    /// Set posterior draws per chain.
    pub fn n_iter(mut self, n: usize) -> Self {
        self.n_iter = n;
        self
    }

    /// Set the number of chains.
    pub fn n_chains(mut self, n: usize) -> Self {
        self.n_chains = n;
        self
    }

    /// Set the adaptation target acceptance probability.
    pub fn adapt_delta(mut self, delta: f64) -> Self {
        self.adapt_delta = delta;
        self
    }

    /// Set the maximum tree depth.
    pub fn max_treedepth(mut self, depth: u32) -> Self {
        self.max_treedepth = depth;
        self
    }

    /// Select the engine generation.
    pub fn engine(mut self, engine: EngineVersion) -> Self {
        self.engine = engine;
        self
    }

    /// Enable or disable multi-threaded chains.
    pub fn parallel_chains(mut self, yes: bool) -> Self {
        self.parallel_chains = yes;
        self
    }

    /// Declare how many cores the sampler may use.
    pub fn available_cores(mut self, cores: usize) -> Self {
        self.available_cores = Some(cores);
        self
    }

    /// Choose between sampling and reusing a cached fit.
    pub fn fit_source(mut self, source: FitSource) -> Self {
        self.fit_source = source;
        self
    }

    /// Set the output name (and cache key).
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = name.into();
        self
    }

    /// Set the ergodic anelastic attenuation coefficient.
    pub fn c_a_erg(mut self, value: f64) -> Self {
        self.c_a_erg = value;
        self
    }

    /// Set the group numbering.
    pub fn group_ordering(mut self, ordering: GroupOrdering) -> Self {
        self.group_ordering = ordering;
        self
    }

    /// Set the path-misfit warning tolerance in km.
    pub fn path_misfit_tolerance(mut self, km: f64) -> Self {
        self.path_misfit_tolerance = km;
        self
    }

    /// Set the sampler seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
