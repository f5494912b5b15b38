//! Client configuration from the environment

use std::time::Duration;

pub const DEFAULT_API_HOST: &str = "https://api.wit.ai";
/// Date-stamped API version sent as the `v` query parameter
pub const DEFAULT_API_VERSION: &str = "20170307";
pub const DEFAULT_MAX_STEPS: u32 = 5;
pub const DEFAULT_SESSION_ID: &str = "session-id-01";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the Wit client and the console driver
#[derive(Debug, Clone)]
pub struct WitConfig {
    /// Client access token (Settings > Access Token in the Wit console)
    pub access_token: String,
    pub api_host: String,
    pub api_version: String,
    /// Step budget for each turn
    pub max_steps: u32,
    /// Session id used by the interactive console
    pub session_id: String,
    pub timeout: Duration,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for WitConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            api_host: DEFAULT_API_HOST.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            max_steps: DEFAULT_MAX_STEPS,
            session_id: DEFAULT_SESSION_ID.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_json: false,
        }
    }
}

impl WitConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparseable numbers fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            access_token: lookup("WIT_ACCESS_TOKEN").unwrap_or_default(),
            api_host: lookup("WIT_API_HOST").unwrap_or(defaults.api_host),
            api_version: lookup("WIT_API_VERSION").unwrap_or(defaults.api_version),
            max_steps: lookup("WIT_MAX_STEPS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_steps),
            session_id: lookup("WIT_SESSION_ID").unwrap_or(defaults.session_id),
            timeout: lookup("WIT_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map_or(defaults.timeout, Duration::from_secs),
            log_json: lookup("WIT_LOG_JSON").is_some_and(|v| v != "0" && !v.is_empty()),
        }
    }

    pub fn has_access_token(&self) -> bool {
        !self.access_token.trim().is_empty()
    }
}
