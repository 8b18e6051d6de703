use std::env;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://openlibrary.org";
pub const DEFAULT_LANGUAGE: &str = "eng";
pub const DEFAULT_RETRY_DELAY_MS: u64 = 250;
pub const DEFAULT_CACHE_NAMESPACE: &str = "openlib:";

const ENV_BASE_URL: &str = "NEXT_BOOK_BASE_URL";
const ENV_LANGUAGE: &str = "NEXT_BOOK_LANGUAGE";
const ENV_USER_AGENT: &str = "NEXT_BOOK_USER_AGENT";
const ENV_RETRY_DELAY_MS: &str = "NEXT_BOOK_RETRY_DELAY_MS";

/// Settings for a [`CatalogClient`](crate::CatalogClient).
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Root of the catalog API, without a trailing slash.
    pub base_url: String,
    /// Language filter sent with searches and edition lookups.
    pub language: String,
    pub user_agent: Option<String>,
    /// Pause after a failed subject query in the category fetchers.
    pub retry_delay_ms: u64,
    /// Prefix of every session cache key.
    pub cache_namespace: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            user_agent: None,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            cache_namespace: DEFAULT_CACHE_NAMESPACE.to_string(),
        }
    }
}

impl CatalogConfig {
    /// Defaults overlaid with any `NEXT_BOOK_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = CatalogConfig::default();
        if let Ok(base_url) = env::var(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Ok(language) = env::var(ENV_LANGUAGE) {
            config.language = language;
        }
        if let Ok(user_agent) = env::var(ENV_USER_AGENT) {
            config.user_agent = Some(user_agent);
        }
        if let Ok(delay) = env::var(ENV_RETRY_DELAY_MS) {
            match delay.parse() {
                Ok(ms) => config.retry_delay_ms = ms,
                Err(_) => warn!(value = %delay, "ignoring invalid {}", ENV_RETRY_DELAY_MS),
            }
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub(crate) fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
