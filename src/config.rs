use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::{IdCacheError, Result};

const DEFAULT_CAPACITY: u64 = 10_000;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 120;
const DEFAULT_UPDATE_TTL_SECS: u32 = 5;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// maximum number of hard-cache entries kept per cached type, defaults to 10000.
    /// Once full, entries may be evicted before their ttl runs out and the next
    /// `get` reloads them, so capacity pressure trades the once-per-ttl load bound for memory.
    pub capacity: u64,
    /// minimum number of seconds between two registry sweeps, defaults to 120
    pub sweep_interval_secs: u64,
    /// ttl used when `push_update` re-arms the hard cache from a live instance, defaults to 5
    pub update_ttl_secs: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            update_ttl_secs: DEFAULT_UPDATE_TTL_SECS,
        }
    }
}

impl CacheConfig {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())
            .map_err(|e| IdCacheError::IoError(format!("failed to load config file {:?}: {}", path.as_ref(), e)))?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<CacheConfig>(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(IdCacheError::Config("capacity must be greater than 0".into()));
        }
        Ok(())
    }
}
