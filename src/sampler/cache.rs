//! Fit reuse: skip sampling by loading a fit stored under the run's output name.

use std::collections::HashMap;
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::fit::PosteriorFit;
use super::{Sampler, SamplerRun};
use crate::assembly::ModelPayload;
use crate::config::{FitSource, RunConfig};
use crate::error::{Error, Result};

/// Storage for fits, keyed by output name.
pub trait FitCache {
    /// Fetch the fit stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<PosteriorFit>>;

    /// Store `fit` under `key`, replacing any previous fit.
    fn store(&self, key: &str, fit: &PosteriorFit) -> Result<()>;
}

/// Cache that never holds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl FitCache for NoCache {
    fn load(&self, _key: &str) -> Result<Option<PosteriorFit>> {
        Ok(None)
    }

    fn store(&self, _key: &str, _fit: &PosteriorFit) -> Result<()> {
        Ok(())
    }
}

/// In-process cache.
#[derive(Debug, Default)]
pub struct MemoryFitCache {
    fits: Mutex<HashMap<String, PosteriorFit>>,
}

impl MemoryFitCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FitCache for MemoryFitCache {
    fn load(&self, key: &str) -> Result<Option<PosteriorFit>> {
        let fits = self.fits.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(fits.get(key).cloned())
    }

    fn store(&self, key: &str, fit: &PosteriorFit) -> Result<()> {
        let mut fits = self.fits.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        fits.insert(key.to_string(), fit.clone());
        Ok(())
    }
}

/// Directory of JSON files named `<key>_fit.json`.
#[derive(Debug, Clone)]
pub struct JsonFitCache {
    dir: PathBuf,
}

impl JsonFitCache {
    /// Cache rooted at `dir`; the directory is created on first store.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File a fit for `key` is stored in.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}_fit.json", key))
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FitCache for JsonFitCache {
    fn load(&self, key: &str) -> Result<Option<PosteriorFit>> {
        let path = self.path_for(key);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_reader(BufReader::new(file))?))
    }

    fn store(&self, key: &str, fit: &PosteriorFit) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let file = fs::File::create(self.path_for(key))?;
        serde_json::to_writer(BufWriter::new(file), fit)?;
        Ok(())
    }
}

/// Where a fit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitOrigin {
    /// Produced by the sampler in this run.
    Sampled,
    /// Loaded from the cache.
    Cached,
}

/// Load the cached fit or run the sampler, per `config.fit_source`.
///
/// With [`FitSource::Sample`] the sampler runs and the fit is stored under
/// `config.output_name`. With [`FitSource::Reuse`] the cached fit is returned
/// and a missing entry is a [`Error::CacheMiss`]. Either way the caller gets
/// a fit it can post-process identically.
pub fn load_or_sample<S, C>(
    sampler: &S,
    cache: &C,
    payload: &ModelPayload,
    config: &RunConfig,
) -> Result<(PosteriorFit, FitOrigin)>
where
    S: Sampler + ?Sized,
    C: FitCache + ?Sized,
{
    let key = config.output_name.as_str();
    match config.fit_source {
        FitSource::Reuse => {
            let fit = cache.load(key)?.ok_or_else(|| Error::CacheMiss { key: key.to_string() })?;
            tracing::info!(key, "reusing cached posterior fit");
            Ok((fit, FitOrigin::Cached))
        }
        FitSource::Sample => {
            let run = SamplerRun::from_config(config);
            let fit = sampler.sample(payload, &run)?;
            cache.store(key, &fit)?;
            tracing::debug!(key, "stored posterior fit");
            Ok((fit, FitOrigin::Sampled))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DrawsAxis;
    use crate::sampler::ParamArray;

    fn fit() -> PosteriorFit {
        PosteriorFit::new(DrawsAxis::Leading).with("dc_0", ParamArray::scalar(vec![0.1, 0.2]))
    }

    #[test]
    fn test_memory_cache_roundtrip() {
        let cache = MemoryFitCache::new();
        assert!(cache.load("run").unwrap().is_none());
        cache.store("run", &fit()).unwrap();
        assert_eq!(cache.load("run").unwrap(), Some(fit()));
    }

    #[test]
    fn test_json_cache_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFitCache::new(dir.path());
        assert!(cache.load("absent").unwrap().is_none());
    }

    #[test]
    fn test_json_cache_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFitCache::new(dir.path().join("fits"));
        cache.store("run", &fit()).unwrap();
        assert!(cache.path_for("run").exists());
        assert_eq!(cache.load("run").unwrap(), Some(fit()));
    }
}
