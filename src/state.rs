//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::scroll::ParserPolicy;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The process-wide parser policy, fixed at startup.
    pub fn policy(&self) -> &ParserPolicy {
        &self.inner.config.parser
    }
}
