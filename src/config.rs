use std::env;
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Gemini API key. Without one every analysis uses the heuristic scorer.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Forces the heuristic scorer even when a key is configured.
    pub demo_mode: bool,
    /// Overrides the default history file location.
    pub history_path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            demo_mode: false,
            history_path: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            api_key: non_empty("GEMINI_API_KEY"),
            model: non_empty("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: non_empty("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            demo_mode: non_empty("FRAUD_SCAN_DEMO_MODE")
                .map(|value| parse_flag(&value))
                .unwrap_or(false),
            history_path: non_empty("FRAUD_SCAN_HISTORY_PATH").map(PathBuf::from),
            timeout_secs: non_empty("FRAUD_SCAN_TIMEOUT_SECS")
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    /// The model is only consulted with a key and outside demo mode.
    pub fn uses_model(&self) -> bool {
        self.api_key.is_some() && !self.demo_mode
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config, Config::default());
        assert!(!config.uses_model());
    }

    #[test]
    fn reads_every_setting() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("GEMINI_BASE_URL", "http://127.0.0.1:9000/v1beta"),
            ("FRAUD_SCAN_HISTORY_PATH", "/tmp/history.json"),
            ("FRAUD_SCAN_TIMEOUT_SECS", "5"),
        ]));

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.base_url, "http://127.0.0.1:9000/v1beta");
        assert_eq!(config.history_path, Some(PathBuf::from("/tmp/history.json")));
        assert_eq!(config.timeout_secs, 5);
        assert!(config.uses_model());
    }

    #[test]
    fn demo_mode_overrides_the_key() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "secret"),
            ("FRAUD_SCAN_DEMO_MODE", "TRUE"),
        ]));
        assert!(config.demo_mode);
        assert!(!config.uses_model());
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")]));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn unparsable_timeout_falls_back() {
        let config = Config::from_lookup(lookup(&[("FRAUD_SCAN_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
