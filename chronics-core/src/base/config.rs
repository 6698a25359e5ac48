//! Configuration of a time series handler.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Configuration of a time series handler.
///
/// The driver builds one per handler at episode start and applies it with
/// [`HandlerState::build`](super::HandlerState::build); saved alongside
/// the episode seed it is enough to replay an episode exactly.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct HandlerConfig {
    /// The quantity the handler supplies (e.g. `load_p`).
    pub array_name: String,

    /// Maximum number of steps to serve; `-1` means unbounded.
    pub max_iter: i64,

    /// Hard cap on episode length in steps, independent of `max_iter`.
    pub max_episode_duration: Option<u64>,

    /// Supported forecast lead-times, in steps ahead.
    pub h_forecast: Vec<usize>,

    /// Storage location, for handlers backed by on-disk data.
    pub path: Option<PathBuf>,

    /// Advisory chunk size for handlers streaming from disk.
    /// Handlers without a notion of storage ignore it.
    pub chunk_size: Option<usize>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            array_name: String::new(),
            max_iter: -1,
            max_episode_duration: None,
            h_forecast: vec![5],
            path: None,
            chunk_size: None,
        }
    }
}

impl HandlerConfig {
    /// Creates a configuration for the named quantity.
    pub fn new(array_name: impl Into<String>) -> Self {
        Self {
            array_name: array_name.into(),
            ..Default::default()
        }
    }

    /// Sets the maximum number of steps to serve.
    pub fn max_iter(mut self, v: i64) -> Self {
        self.max_iter = v;
        self
    }

    /// Sets the hard cap on episode length in steps.
    pub fn max_episode_duration(mut self, v: u64) -> Self {
        self.max_episode_duration = Some(v);
        self
    }

    /// Sets the supported forecast lead-times.
    pub fn h_forecast(mut self, v: &[usize]) -> Self {
        self.h_forecast = v.to_vec();
        self
    }

    /// Sets the storage location.
    pub fn path(mut self, v: impl Into<PathBuf>) -> Self {
        self.path = Some(v.into());
        self
    }

    /// Sets the advisory chunk size for streaming storage.
    pub fn chunk_size(mut self, v: usize) -> Self {
        self.chunk_size = Some(v);
        self
    }

    /// Constructs [`HandlerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`HandlerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
