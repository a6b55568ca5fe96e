//! Thread-safe configuration caching with arc-swap for lock-free reads.

use crate::schema::Config;
use arc_swap::ArcSwap;
use polyglot_common::Result;
use std::sync::Arc;

/// Thread-safe configuration cache using arc-swap for lock-free reads.
#[derive(Debug)]
pub struct ConfigCache {
    config: ArcSwap<Config>,
}

impl ConfigCache {
    /// Creates a new configuration cache with the given initial configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
        }
    }

    /// Gets the current configuration.
    pub fn get(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Validates `config` and swaps it in; the previous value is kept on failure.
    pub fn update(&self, config: Config) -> Result<()> {
        config.validate()?;
        self.config.store(Arc::new(config));
        Ok(())
    }
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
