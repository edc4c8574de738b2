//! Client configuration read from the environment.

use std::path::PathBuf;

use crate::session::{FileSessionStore, MemorySessionStore, SessionContext};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Where the session entries are persisted. `None` keeps them in memory.
    pub session_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session_dir: None,
        }
    }

    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = Some(dir.into());
        self
    }

    /// `DRIVER_API_URL` (default `http://localhost:8080`) and
    /// `DRIVER_SESSION_DIR` (optional).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup("DRIVER_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let config = Self::new(base_url.trim());
        match lookup("DRIVER_SESSION_DIR").filter(|v| !v.trim().is_empty()) {
            Some(dir) => config.with_session_dir(dir),
            None => config,
        }
    }

    pub fn session_context(&self) -> SessionContext {
        match &self.session_dir {
            Some(dir) => SessionContext::new(FileSessionStore::new(dir)),
            None => SessionContext::new(MemorySessionStore::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, "http://localhost:8080");
        assert!(config.session_dir.is_none());
    }

    #[test]
    fn reads_url_and_session_dir() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("DRIVER_API_URL", "https://api.example.com/"),
            ("DRIVER_SESSION_DIR", "/tmp/driver-session"),
        ]));
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.session_dir, Some(PathBuf::from("/tmp/driver-session")));
    }

    #[test]
    fn blank_url_falls_back_to_default() {
        let config = ClientConfig::from_lookup(lookup(&[("DRIVER_API_URL", "  ")]));
        assert_eq!(config.base_url, DEFAULT_API_URL);
    }
}
