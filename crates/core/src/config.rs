use std::{path::PathBuf, time::Duration};

pub const API_URL_ENV: &str = "VIDLENS_API_URL";
pub const STATE_DIR_ENV: &str = "VIDLENS_STATE_DIR";
pub const TIMEOUT_ENV: &str = "VIDLENS_TIMEOUT_SECS";

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Processing a long video synchronously can take minutes.
const DEFAULT_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL including the `/api` prefix, without trailing slash
    pub api_url: String,
    /// Directory holding the durable key/value file
    pub state_dir: PathBuf,
    /// Transport timeout handed to reqwest
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            state_dir: default_state_dir(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var(API_URL_ENV)
                .map(|url| normalize_api_url(&url))
                .unwrap_or(defaults.api_url),
            state_dir: std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.state_dir),
            timeout: std::env::var(TIMEOUT_ENV)
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = normalize_api_url(api_url);
        self
    }

    pub fn with_state_dir(mut self, state_dir: PathBuf) -> Self {
        self.state_dir = state_dir;
        self
    }

    pub fn storage_path(&self) -> PathBuf {
        self.state_dir.join("storage.json")
    }
}

pub fn default_state_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("vidlens")
}

fn normalize_api_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, "http://localhost:8000/api");
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert!(config.storage_path().ends_with("vidlens/storage.json"));
    }

    #[test]
    fn api_url_override_drops_trailing_slash() {
        let config = ClientConfig::default().with_api_url("http://example.com/api/ ");
        assert_eq!(config.api_url, "http://example.com/api");
    }
}
