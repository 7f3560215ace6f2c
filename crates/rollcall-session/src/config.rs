//! Lifecycle configuration.

use std::time::Duration;

use rollcall_token::DEFAULT_TOKEN_WINDOW;
use serde::{Deserialize, Serialize};

/// Configuration for session lifecycle behavior.
///
/// Sensible defaults are provided; override only the fields you care
/// about with struct-update syntax:
///
/// ```rust
/// use rollcall_session::SessionConfig;
///
/// let config = SessionConfig { token_window_secs: 60, ..SessionConfig::default() };
/// assert_eq!(config.max_name_len, 120);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long (in seconds) a freshly issued token stays valid.
    ///
    /// Default: 300 (5 minutes).
    pub token_window_secs: u64,

    /// Maximum length of a session name, in characters, after trimming.
    ///
    /// Default: 120.
    pub max_name_len: usize,
}

impl SessionConfig {
    /// The token window as a `Duration`.
    pub fn token_window(&self) -> Duration {
        Duration::from_secs(self.token_window_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_window_secs: DEFAULT_TOKEN_WINDOW.as_secs(),
            max_name_len: 120,
        }
    }
}
