use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use card_binder_domain::DEFAULT_PAGE_SIZE;
use tracing::{debug, warn};

/// What the window does when a selection could not be saved remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    Alert,
    Silent,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "alert" => Ok(Self::Alert),
            "silent" => Ok(Self::Silent),
            other => Err(format!("expected alert or silent, got {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub title: String,
    pub page_size: usize,
    pub failure_policy: FailurePolicy,
    pub cache_dir: String,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            title: "Card collection".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            failure_policy: FailurePolicy::Alert,
            cache_dir: "cache".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// Reads `.env` (if any) and the process environment.
    pub fn from_env() -> Self {
        if dotenv::dotenv().is_ok() {
            debug!("loaded .env");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let page_size = match try_load(&lookup, "CARD_BINDER_PAGE_SIZE", defaults.page_size) {
            0 => {
                warn!("CARD_BINDER_PAGE_SIZE must be at least 1, using default");
                defaults.page_size
            }
            size => size,
        };

        Self {
            api_base_url: lookup("CARD_BINDER_API_URL")
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.api_base_url),
            title: lookup("CARD_BINDER_TITLE")
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.title),
            page_size,
            failure_policy: try_load(
                &lookup,
                "CARD_BINDER_ON_SYNC_FAILURE",
                defaults.failure_policy,
            ),
            cache_dir: lookup("CARD_BINDER_CACHE_DIR")
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.cache_dir),
            request_timeout_secs: try_load(
                &lookup,
                "CARD_BINDER_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            ),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|error| {
        warn!("Invalid {key} value {raw:?}: {error}, using default");
        default
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(AppConfig::from_lookup(|_| None), AppConfig::default());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("CARD_BINDER_API_URL", "http://binder.local:8080"),
            ("CARD_BINDER_PAGE_SIZE", "50"),
            ("CARD_BINDER_ON_SYNC_FAILURE", "Silent"),
            ("CARD_BINDER_CACHE_DIR", "/tmp/binder"),
            ("CARD_BINDER_TIMEOUT_SECS", "3"),
        ]));

        assert_eq!(config.api_base_url, "http://binder.local:8080");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.failure_policy, FailurePolicy::Silent);
        assert_eq!(config.cache_dir, "/tmp/binder");
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("CARD_BINDER_PAGE_SIZE", "0"),
            ("CARD_BINDER_ON_SYNC_FAILURE", "explode"),
            ("CARD_BINDER_TIMEOUT_SECS", "soon"),
            ("CARD_BINDER_API_URL", "   "),
        ]));

        assert_eq!(config, AppConfig::default());
    }
}
