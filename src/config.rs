//! Session store options.
//!
//! Options can be built in code or read from a TOML table:
//!
//! ```toml
//! session_delim = ":"
//! session_exp = 86400
//! peer_exp = 604800
//! redis_url = "redis://127.0.0.1:6379"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_DELIMITER: &str = ":";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct SessionOptions {
    /// Expiry for peer and secret-chat entries, seconds
    #[serde(alias = "peerExp", alias = "peer-exp")]
    pub peer_exp: Option<u64>,
    /// Expiry for scalar login fields, seconds
    #[serde(alias = "sessionExp", alias = "session-exp")]
    pub session_exp: Option<u64>,
    #[serde(alias = "sessionDelim", alias = "session-delim")]
    pub session_delim: String,
    #[serde(alias = "redisUrl", alias = "redis-url")]
    pub redis_url: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            peer_exp: None,
            session_exp: None,
            session_delim: DEFAULT_DELIMITER.to_string(),
            redis_url: None,
        }
    }
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peer_exp(mut self, secs: u64) -> Self {
        self.peer_exp = Some(secs);
        self
    }

    pub fn session_exp(mut self, secs: u64) -> Self {
        self.session_exp = Some(secs);
        self
    }

    pub fn delimiter(mut self, delim: impl Into<String>) -> Self {
        self.session_delim = delim.into();
        self
    }

    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let options: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_delim.is_empty() {
            return Err(ConfigError::EmptyDelimiter);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = SessionOptions::default();
        assert_eq!(options.session_delim, ":");
        assert_eq!(options.peer_exp, None);
        assert_eq!(options.session_exp, None);
        assert_eq!(options.redis_url, None);
    }

    #[test]
    fn test_parse_partial_toml() {
        let options = SessionOptions::from_toml_str("session_exp = 5\n").unwrap();
        assert_eq!(options.session_exp, Some(5));
        assert_eq!(options.session_delim, ":");
    }

    #[test]
    fn test_parse_camel_case_aliases() {
        let options = SessionOptions::from_toml_str(
            "peerExp = 60\nsessionDelim = \"|\"\nredisUrl = \"redis://db:6380\"\n",
        )
        .unwrap();
        assert_eq!(options.peer_exp, Some(60));
        assert_eq!(options.session_delim, "|");
        assert_eq!(options.redis_url.as_deref(), Some("redis://db:6380"));
    }

    #[test]
    fn test_parse_kebab_case_keys() {
        let options = SessionOptions::from_toml_str(
            "peer-exp = 60\nsession-exp = 5\nsession-delim = \"|\"\nredis-url = \"redis://db\"\n",
        )
        .unwrap();
        assert_eq!(options.peer_exp, Some(60));
        assert_eq!(options.session_exp, Some(5));
        assert_eq!(options.session_delim, "|");
        assert_eq!(options.redis_url.as_deref(), Some("redis://db"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = SessionOptions::from_toml_str("peer_expiry = 60\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_empty_delimiter_rejected() {
        assert_eq!(
            SessionOptions::from_toml_str("session_delim = \"\"\n"),
            Err(ConfigError::EmptyDelimiter)
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "peer_exp = 3600").unwrap();

        let options = SessionOptions::from_toml_file(file.path()).unwrap();
        assert_eq!(options.peer_exp, Some(3600));
    }

    #[test]
    fn test_missing_file() {
        let result = SessionOptions::from_toml_file(Path::new("/nonexistent/options.toml"));
        assert!(matches!(result, Err(ConfigError::Read(_))));
    }
}
