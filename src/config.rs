//! Runtime configuration from the environment (and an optional `.env`)

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use directories::BaseDirs;

use crate::types::{Result, SoberError};

/// Default generative-text model
pub const DEFAULT_INSIGHT_MODEL: &str = "gemini-2.5-flash";

/// Default cloud change-poll interval in seconds
const DEFAULT_POLL_SECS: u64 = 5;

/// Cloud project credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding local logs, settings and the auth session
    pub data_dir: PathBuf,
    /// None when the cloud store is not configured
    pub firebase: Option<FirebaseConfig>,
    pub insight_api_key: Option<String>,
    pub insight_model: String,
    pub poll_interval: Duration,
}

impl Config {
    /// Load `.env` (if present) and read configuration from the environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = match get("SOBERSTATS_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        let firebase = match (get("FIREBASE_API_KEY"), get("FIREBASE_PROJECT_ID")) {
            (Some(api_key), Some(project_id)) => Some(FirebaseConfig { api_key, project_id }),
            _ => None,
        };

        let poll_secs = get("SOBERSTATS_POLL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_POLL_SECS);

        Ok(Self {
            data_dir,
            firebase,
            insight_api_key: get("GEMINI_API_KEY").or_else(|| get("API_KEY")),
            insight_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_INSIGHT_MODEL.into()),
            poll_interval: Duration::from_secs(poll_secs),
        })
    }

    /// Cloud credentials, or a config error naming what is missing
    pub fn require_firebase(&self) -> Result<&FirebaseConfig> {
        self.firebase.as_ref().ok_or_else(|| {
            SoberError::Config(
                "cloud sync is not configured: set FIREBASE_API_KEY and FIREBASE_PROJECT_ID".into(),
            )
        })
    }
}

/// `~/.soberstats`
fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new()
        .ok_or_else(|| SoberError::Config("Cannot determine home directory".into()))?;
    Ok(base_dirs.home_dir().join(".soberstats"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_config() {
        let config = Config::from_lookup(lookup(&[("SOBERSTATS_DATA_DIR", "/tmp/sober")])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/sober"));
        assert!(config.firebase.is_none());
        assert!(config.insight_api_key.is_none());
        assert_eq!(config.insight_model, DEFAULT_INSIGHT_MODEL);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert!(config.require_firebase().is_err());
    }

    #[test]
    fn test_firebase_requires_both_values() {
        let config = Config::from_lookup(lookup(&[
            ("SOBERSTATS_DATA_DIR", "/tmp/sober"),
            ("FIREBASE_API_KEY", "key"),
        ]))
        .unwrap();
        assert!(config.firebase.is_none());

        let config = Config::from_lookup(lookup(&[
            ("SOBERSTATS_DATA_DIR", "/tmp/sober"),
            ("FIREBASE_API_KEY", "key"),
            ("FIREBASE_PROJECT_ID", "proj"),
        ]))
        .unwrap();
        assert_eq!(config.require_firebase().unwrap().project_id, "proj");
    }

    #[test]
    fn test_insight_key_alias_and_empty_values() {
        let config = Config::from_lookup(lookup(&[
            ("SOBERSTATS_DATA_DIR", "/tmp/sober"),
            ("GEMINI_API_KEY", " "),
            ("API_KEY", "fallback-key"),
        ]))
        .unwrap();
        assert_eq!(config.insight_api_key.as_deref(), Some("fallback-key"));
    }

    #[test]
    fn test_invalid_poll_interval_falls_back() {
        let config = Config::from_lookup(lookup(&[
            ("SOBERSTATS_DATA_DIR", "/tmp/sober"),
            ("SOBERSTATS_POLL_SECS", "soon"),
        ]))
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(5));

        let config = Config::from_lookup(lookup(&[
            ("SOBERSTATS_DATA_DIR", "/tmp/sober"),
            ("SOBERSTATS_POLL_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(30));
    }
}
