use serde::Deserialize;

use crate::services::{
    title_resolver::MatchMode,
    vectorizer::{FeatureSource, FeatureVectorizer, Weighting},
};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the pipe-delimited MovieLens item file
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Term weighting for feature vectors
    #[serde(default)]
    pub feature_weighting: Weighting,

    /// Which item fields feed the feature vectors
    #[serde(default)]
    pub feature_source: FeatureSource,

    /// Extra stop terms, comma separated
    #[serde(default)]
    pub stop_words: Vec<String>,

    /// Also drop common English words
    #[serde(default)]
    pub english_stop_words: bool,

    /// Title matching used when a request does not name one
    #[serde(default)]
    pub match_mode: MatchMode,

    /// Batch size used when a request does not name one
    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,

    /// Largest batch a single request may ask for
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Seconds a session may sit idle before its cursor is dropped
    #[serde(default = "default_session_idle_ttl_secs")]
    pub session_idle_ttl_secs: u64,

    /// Most sessions held at once; the least recently used is evicted beyond this
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// OMDb API key; posters are disabled when unset
    #[serde(default)]
    pub omdb_api_key: Option<String>,

    /// OMDb API base URL
    #[serde(default = "default_omdb_api_url")]
    pub omdb_api_url: String,

    /// Redis connection URL; poster lookups go uncached when unset
    #[serde(default)]
    pub redis_url: Option<String>,
}

fn default_catalog_path() -> String {
    "ml-100k/u.item".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_batch_size() -> usize {
    5
}

fn default_max_batch_size() -> usize {
    100
}

fn default_session_idle_ttl_secs() -> u64 {
    1800
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_omdb_api_url() -> String {
    "http://www.omdbapi.com".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            host: default_host(),
            port: default_port(),
            feature_weighting: Weighting::default(),
            feature_source: FeatureSource::default(),
            stop_words: Vec::new(),
            english_stop_words: false,
            match_mode: MatchMode::default(),
            default_batch_size: default_batch_size(),
            max_batch_size: default_max_batch_size(),
            session_idle_ttl_secs: default_session_idle_ttl_secs(),
            max_sessions: default_max_sessions(),
            omdb_api_key: None,
            omdb_api_url: default_omdb_api_url(),
            redis_url: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from explicit key/value pairs (upper-case keys)
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.default_batch_size == 0 || self.max_batch_size == 0 {
            anyhow::bail!("Batch sizes must be positive");
        }
        if self.session_idle_ttl_secs == 0 || self.max_sessions == 0 {
            anyhow::bail!("SESSION_IDLE_TTL_SECS and MAX_SESSIONS must be positive");
        }
        if self.default_batch_size > self.max_batch_size {
            anyhow::bail!(
                "DEFAULT_BATCH_SIZE ({}) exceeds MAX_BATCH_SIZE ({})",
                self.default_batch_size,
                self.max_batch_size
            );
        }
        Ok(())
    }

    /// Vectorizer matching the configured weighting, source and stop list
    pub fn vectorizer(&self) -> FeatureVectorizer {
        let vectorizer = FeatureVectorizer::new(self.feature_weighting, self.feature_source)
            .with_stop_words(&self.stop_words);
        if self.english_stop_words {
            vectorizer.with_english_stop_words()
        } else {
            vectorizer
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
