use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{api, env as env_keys, network};
use crate::errors::ConfigError;
use crate::services::policy::AccessPolicyConfig;

/// Startup configuration for the server process.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub base_url: String,
    pub http_timeout: Duration,
    pub default_profile: Option<String>,
    pub access: AccessPolicyConfig,
    pub openapi_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = resolve_api_key(&lookup).ok_or(ConfigError::MissingApiKey)?;
        let http_timeout = parse_timeout(lookup(env_keys::HTTP_TIMEOUT).as_deref())?;
        let default_profile = non_empty(lookup(env_keys::DEFAULT_PROFILE));
        let openapi_path = non_empty(lookup(env_keys::OPENAPI_PATH)).map(PathBuf::from);

        Ok(Self {
            api_key,
            base_url: api::BASE_URL.to_string(),
            http_timeout,
            default_profile,
            access: AccessPolicyConfig::from_lookup(&lookup),
            openapi_path,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The direct variable wins; otherwise the key file is read and trimmed.
fn resolve_api_key(lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    if let Some(key) = lookup(env_keys::API_KEY).filter(|k| !k.is_empty()) {
        return Some(key);
    }
    let path = non_empty(lookup(env_keys::API_KEY_FILE))?;
    tracing::debug!(path = %path, "Reading API key from file");
    match std::fs::read_to_string(&path) {
        Ok(contents) => non_empty(Some(contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::error!(path = %path, "API key file not found");
            None
        }
        Err(err) => {
            tracing::error!(path = %path, error = %err, "Failed to read API key file");
            None
        }
    }
}

fn parse_timeout(raw: Option<&str>) -> Result<Duration, ConfigError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Duration::from_secs_f64(network::DEFAULT_HTTP_TIMEOUT_SECS));
    };
    match raw.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => Ok(Duration::from_secs_f64(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::policy::ProfileSet;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = Settings::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let settings = Settings::from_lookup(lookup_from(&[("NEXTDNS_API_KEY", "k")])).unwrap();
        assert_eq!(settings.api_key, "k");
        assert_eq!(settings.base_url, "https://api.nextdns.io");
        assert_eq!(settings.http_timeout, Duration::from_secs(30));
        assert!(settings.default_profile.is_none());
        assert_eq!(settings.access.readable, ProfileSet::All);
        assert!(settings.openapi_path.is_none());
    }

    #[test]
    fn timeout_accepts_fractions_and_rejects_garbage() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("NEXTDNS_API_KEY", "k"),
            ("NEXTDNS_HTTP_TIMEOUT", "2.5"),
        ]))
        .unwrap();
        assert_eq!(settings.http_timeout, Duration::from_millis(2500));

        for raw in ["abc", "0", "-3"] {
            let err = Settings::from_lookup(lookup_from(&[
                ("NEXTDNS_API_KEY", "k"),
                ("NEXTDNS_HTTP_TIMEOUT", raw),
            ]))
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidTimeout(_)), "{raw}");
        }
    }

    #[test]
    fn unreadable_key_file_counts_as_missing() {
        let err = Settings::from_lookup(lookup_from(&[(
            "NEXTDNS_API_KEY_FILE",
            "/nonexistent/nextdns/key",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }
}
