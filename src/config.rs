use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const APP_ID: &str = "id.hukum.HukumChat";
pub const APP_NAME: &str = "NLP Hukum AI";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

const ENV_BACKEND_URL: &str = "HUKUM_CHAT_BACKEND_URL";
const ENV_TIMEOUT_SECS: &str = "HUKUM_CHAT_TIMEOUT_SECS";
const ENV_HISTORY: &str = "HUKUM_CHAT_HISTORY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid backend URL '{value}': {reason}")]
    InvalidBackendUrl { value: String, reason: String },

    #[error("Invalid request timeout '{0}': expected a positive number of seconds")]
    InvalidTimeout(String),

    #[error("Cannot locate a data directory: neither XDG_DATA_HOME nor HOME is set")]
    NoDataDir,
}

/// Runtime settings for the chat client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub backend_url: Url,
    /// `None` leaves outbound requests unbounded.
    pub request_timeout: Option<Duration>,
    /// Where conversation history is kept; `None` keeps everything in memory.
    pub history_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: Url::parse(DEFAULT_BACKEND_URL).expect("default backend URL is valid"),
            request_timeout: None,
            history_path: None,
        }
    }
}

impl ClientConfig {
    /// Read settings from the process environment. A bad variable only
    /// resets its own setting; the rejected variables come back alongside
    /// the config.
    pub fn from_env_lenient() -> (Self, Vec<ConfigError>) {
        Self::from_lookup_lenient(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Unset or blank
    /// variables fall back to defaults; the first invalid one is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (config, mut errors) = Self::from_lookup_lenient(lookup);
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors.remove(0))
        }
    }

    pub fn from_lookup_lenient<F>(lookup: F) -> (Self, Vec<ConfigError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        let mut errors = Vec::new();

        if let Some(raw) = get(ENV_BACKEND_URL) {
            match parse_backend_url(raw.trim()) {
                Ok(url) => config.backend_url = url,
                Err(e) => errors.push(e),
            }
        }

        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            match parse_timeout(&raw) {
                Ok(timeout) => config.request_timeout = Some(timeout),
                Err(e) => errors.push(e),
            }
        }

        if let Some(raw) = get(ENV_HISTORY) {
            if matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on") {
                match default_history_path(&get) {
                    Ok(path) => config.history_path = Some(path),
                    Err(e) => errors.push(e),
                }
            }
        }

        (config, errors)
    }

    pub fn chat_endpoint(&self) -> Url {
        join(&self.backend_url, "api/chat")
    }

    pub fn health_endpoint(&self) -> Url {
        join(&self.backend_url, "")
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}

fn parse_backend_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidBackendUrl {
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBackendUrl {
            value: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Append `path` below the base URL, keeping any path prefix the base has
/// (a reverse proxy mounting the backend under `/legal/` stays intact).
fn join(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    url.set_path(&format!("{}/{}", prefix, path));
    url
}

fn default_history_path<F>(get: &F) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let data_dir = get("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| get("HOME").map(|home| PathBuf::from(home).join(".local/share")))
        .ok_or(ConfigError::NoDataDir)?;
    Ok(data_dir.join("hukum-chat").join("history.db"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.history_path, None);
        assert_eq!(
            config.chat_endpoint().as_str(),
            "http://localhost:8000/api/chat"
        );
        assert_eq!(config.health_endpoint().as_str(), "http://localhost:8000/");
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("HUKUM_CHAT_BACKEND_URL", "https://legal.example.org/proxy/"),
            ("HUKUM_CHAT_TIMEOUT_SECS", "45"),
            ("HUKUM_CHAT_HISTORY", "true"),
            ("XDG_DATA_HOME", "/tmp/data"),
        ]))
        .unwrap();

        assert_eq!(
            config.chat_endpoint().as_str(),
            "https://legal.example.org/proxy/api/chat"
        );
        assert_eq!(config.request_timeout, Some(Duration::from_secs(45)));
        assert_eq!(
            config.history_path,
            Some(PathBuf::from("/tmp/data/hukum-chat/history.db"))
        );
    }

    #[test]
    fn test_history_falls_back_to_home() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("HUKUM_CHAT_HISTORY", "1"),
            ("HOME", "/home/ana"),
        ]))
        .unwrap();
        assert_eq!(
            config.history_path,
            Some(PathBuf::from("/home/ana/.local/share/hukum-chat/history.db"))
        );
    }

    #[test]
    fn test_history_disabled_values() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("HUKUM_CHAT_HISTORY", "0"),
            ("HOME", "/home/ana"),
        ]))
        .unwrap();
        assert_eq!(config.history_path, None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[("HUKUM_CHAT_BACKEND_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBackendUrl { .. }));

        let err = ClientConfig::from_lookup(lookup(&[("HUKUM_CHAT_BACKEND_URL", "ftp://host")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBackendUrl { .. }));

        let err = ClientConfig::from_lookup(lookup(&[("HUKUM_CHAT_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));

        let err = ClientConfig::from_lookup(lookup(&[("HUKUM_CHAT_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));

        let err = ClientConfig::from_lookup(lookup(&[("HUKUM_CHAT_HISTORY", "yes")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoDataDir));
    }

    #[test]
    fn test_lenient_keeps_valid_settings() {
        let (config, errors) = ClientConfig::from_lookup_lenient(lookup(&[
            ("HUKUM_CHAT_BACKEND_URL", "https://legal.example.org/"),
            ("HUKUM_CHAT_TIMEOUT_SECS", "abc"),
        ]));

        assert_eq!(config.backend_url.as_str(), "https://legal.example.org/");
        assert_eq!(config.request_timeout, None);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfigError::InvalidTimeout(_)));

        let (config, errors) = ClientConfig::from_lookup_lenient(lookup(&[
            ("HUKUM_CHAT_BACKEND_URL", "not a url"),
            ("HUKUM_CHAT_TIMEOUT_SECS", "20"),
        ]));
        assert_eq!(config.backend_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(20)));
        assert_eq!(errors.len(), 1);
    }
}
