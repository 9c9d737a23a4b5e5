//! Main `NonErgodicRegression` entry point.

use std::time::Instant;

use crate::assembly::{assemble, AssembledModel, ModelInputs};
use crate::config::RunConfig;
use crate::data::CellInfoTable;
use crate::decomposition::{
    aleatory_terms, decompose_residuals, hyperposterior_table, summarize_cells,
    summarize_hyperparameters, synthesize_coefficients, GroupSummaries,
};
use crate::error::Result;
use crate::posterior::{extract_posterior, ColumnLayout};
use crate::result::{RegressionOutcome, RunMetadata};
use crate::sampler::{load_or_sample, FitCache, FitOrigin, PosteriorFit, Sampler};

/// Non-ergodic regression pipeline.
///
/// Runs assemble → sample (or reuse) → extract → summarize → decompose.
///
/// # Example
///
/// ```ignore
/// use nonergodic_gmm::{NonErgodicRegression, ModelInputs, MemoryFitCache};
///
/// let outcome = NonErgodicRegression::new()
///     .n_iter(1000)
///     .n_chains(4)
///     .run(&inputs, &my_sampler, &MemoryFitCache::new())?;
///
/// println!("phi_0 = {:.3}", outcome.aleatory.phi_0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NonErgodicRegression {
    config: RunConfig,
}

impl NonErgodicRegression {
    /// Create with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with an explicit configuration.
    pub fn with_config(config: RunConfig) -> Self {
        Self { config }
    }

    /// Current configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Set posterior draws per chain.
    pub fn n_iter(mut self, n: usize) -> Self {
        self.config = self.config.n_iter(n);
        self
    }

    /// Set the number of chains.
    pub fn n_chains(mut self, n: usize) -> Self {
        self.config = self.config.n_chains(n);
        self
    }

    /// Replace the configuration through a closure.
    pub fn configure(mut self, f: impl FnOnce(RunConfig) -> RunConfig) -> Self {
        self.config = f(self.config);
        self
    }

    /// Assemble the payload without sampling.
    pub fn assemble(&self, inputs: &ModelInputs<'_>) -> Result<AssembledModel> {
        assemble(inputs, &self.config)
    }

    /// Run the full pipeline.
    ///
    /// Input-alignment errors abort before the sampler is called. Sampler
    /// failures are propagated unchanged.
    pub fn run<S, C>(
        &self,
        inputs: &ModelInputs<'_>,
        sampler: &S,
        cache: &C,
    ) -> Result<RegressionOutcome>
    where
        S: Sampler + ?Sized,
        C: FitCache + ?Sized,
    {
        let start = Instant::now();
        let model = self.assemble(inputs)?;
        let (fit, origin) = load_or_sample(sampler, cache, &model.payload, &self.config)?;

        let mut outcome = self.postprocess(&model, inputs.cells, &fit, origin)?;
        outcome.metadata.runtime_secs = start.elapsed().as_secs_f64();
        Ok(outcome)
    }

    /// Decompose a fit of an already assembled model.
    ///
    /// The fit may come from the sampler or from a cache; both are handled
    /// identically.
    pub fn postprocess(
        &self,
        model: &AssembledModel,
        cells: &CellInfoTable,
        fit: &PosteriorFit,
        origin: FitOrigin,
    ) -> Result<RegressionOutcome> {
        let start = Instant::now();

        let layout = ColumnLayout::for_model(model);
        let posterior = extract_posterior(fit, &layout)?;
        let summaries = GroupSummaries::from_samples(&posterior)?;

        let coefficients = synthesize_coefficients(model, &summaries)?;
        let residuals = decompose_residuals(model, &coefficients, &summaries)?;
        let cell_rows = summarize_cells(model, &summaries, cells, self.config.c_a_erg)?;
        let aleatory = aleatory_terms(&posterior)?;

        let metadata = RunMetadata {
            output_name: self.config.output_name.clone(),
            engine: self.config.engine,
            fit_origin: origin,
            n_records: model.payload.n_records,
            n_earthquakes: model.payload.n_eq,
            n_stations: model.payload.n_sta,
            n_cells: model.payload.n_cell,
            n_draws: posterior.n_draws(),
            runtime_secs: start.elapsed().as_secs_f64(),
        };

        tracing::info!(
            draws = metadata.n_draws,
            records = metadata.n_records,
            phi_0 = aleatory.phi_0,
            tau_0 = aleatory.tau_0,
            "decomposed posterior"
        );

        Ok(RegressionOutcome {
            hyperparameters: summarize_hyperparameters(&posterior),
            hyperposterior: hyperposterior_table(&posterior),
            posterior,
            cells: cell_rows,
            coefficients,
            residuals,
            aleatory,
            diagnostics: model.diagnostics.clone(),
            metadata,
        })
    }
}
