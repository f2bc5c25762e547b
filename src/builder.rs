use std::sync::Arc;

use crate::{
    CacheConfig, CacheRegistry, Result,
    utils::time::{Clock, SystemClock},
};

pub struct CacheRegistryBuilder {
    config: CacheConfig,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for CacheRegistryBuilder {
    fn default() -> Self {
        Self {
            config: CacheConfig::default(),
            clock: None,
        }
    }
}

impl CacheRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: CacheConfig,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn capacity(
        mut self,
        capacity: u64,
    ) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn sweep_interval_secs(
        mut self,
        secs: u64,
    ) -> Self {
        self.config.sweep_interval_secs = secs;
        self
    }

    pub fn update_ttl_secs(
        mut self,
        secs: u32,
    ) -> Self {
        self.config.update_ttl_secs = secs;
        self
    }

    pub fn clock(
        mut self,
        clock: Arc<dyn Clock>,
    ) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(&self) -> Result<CacheRegistry> {
        self.config.validate()?;
        let clock = match &self.clock {
            Some(clock) => clock.clone(),
            None => Arc::new(SystemClock),
        };

        Ok(CacheRegistry::new(self.config.clone(), clock))
    }
}
