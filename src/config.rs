use std::{env, path::PathBuf, time::Duration};
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/reports.json";
const DEFAULT_BACKEND_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 1;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retries: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retries: DEFAULT_RETRIES,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup so tests can avoid touching the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT);
        let data_path = lookup("APP_DATA_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let base_url = lookup("BACKEND_API_URL")
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let timeout_secs = parse_or(
            "BACKEND_TIMEOUT_SECS",
            lookup("BACKEND_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        );
        let retries = parse_or("BACKEND_RETRIES", lookup("BACKEND_RETRIES"), DEFAULT_RETRIES);

        Self {
            port,
            data_path,
            backend: BackendConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
                retries,
            },
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("ignoring malformed {key}={value:?}");
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, PathBuf::from("data/reports.json"));
        assert_eq!(config.backend.base_url, "http://localhost:5000/api");
        assert_eq!(config.backend.timeout, Duration::from_secs(30));
        assert_eq!(config.backend.retries, 1);
    }

    #[test]
    fn backend_url_loses_trailing_slash() {
        let config = config_from(&[("BACKEND_API_URL", "https://example.test/api/")]);
        assert_eq!(config.backend.base_url, "https://example.test/api");
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let config = config_from(&[
            ("PORT", "eighty"),
            ("BACKEND_TIMEOUT_SECS", "5"),
            ("BACKEND_RETRIES", "-1"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.backend.timeout, Duration::from_secs(5));
        assert_eq!(config.backend.retries, 1);
    }
}
