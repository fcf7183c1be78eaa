use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    services::{
        providers::PosterProvider, recommendations::Recommender, title_resolver::MatchMode,
    },
};

use super::sessions::SessionStore;

/// Request defaults and limits taken from [`Config`]
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub match_mode: MatchMode,
    pub default_batch_size: usize,
    pub max_batch_size: usize,
    pub session_idle_ttl: Duration,
    pub max_sessions: usize,
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            match_mode: config.match_mode,
            default_batch_size: config.default_batch_size,
            max_batch_size: config.max_batch_size,
            session_idle_ttl: Duration::from_secs(config.session_idle_ttl_secs),
            max_sessions: config.max_sessions,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Shared application state
///
/// The recommender is immutable and shared without locking. The session store is
/// the only mutable state: one live cursor per session id.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub sessions: Arc<SessionStore>,
    pub posters: Option<Arc<dyn PosterProvider>>,
    pub settings: SessionSettings,
}

impl AppState {
    pub fn new(recommender: Arc<Recommender>, settings: SessionSettings) -> Self {
        Self {
            recommender,
            sessions: Arc::new(SessionStore::new(
                settings.session_idle_ttl,
                settings.max_sessions,
            )),
            posters: None,
            settings,
        }
    }

    /// Enables poster enrichment of batches
    pub fn with_posters(mut self, provider: Arc<dyn PosterProvider>) -> Self {
        self.posters = Some(provider);
        self
    }
}
