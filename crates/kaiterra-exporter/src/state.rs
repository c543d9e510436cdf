//! Shared application state.

use std::sync::Arc;

use crate::config::Config;
use crate::fetcher::{FetchError, Fetcher};
use crate::process::ProcessCollector;

/// State shared across all request handlers. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    fetcher: Fetcher,
    process: ProcessCollector,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, FetchError> {
        let fetcher = Fetcher::new(&config)?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                fetcher,
                process: ProcessCollector::new(),
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.inner.fetcher
    }

    pub fn process(&self) -> &ProcessCollector {
        &self.inner.process
    }
}
