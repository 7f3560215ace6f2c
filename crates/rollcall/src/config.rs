//! Service-wide configuration.

use rollcall_session::SessionConfig;
use serde::{Deserialize, Serialize};

use crate::RollcallError;

/// Configuration for a [`Rollcall`](crate::Rollcall) service.
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```rust
/// use rollcall::RollcallConfig;
///
/// let config = RollcallConfig::from_json(r#"{ "token_window_secs": 120 }"#).unwrap();
/// assert_eq!(config.token_window_secs, 120);
/// assert_eq!(config.max_name_len, 120);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollcallConfig {
    /// Seconds a freshly issued QR token stays valid. Default: 300.
    pub token_window_secs: u64,

    /// Longest accepted session name, in characters. Default: 120.
    pub max_name_len: usize,
}

impl RollcallConfig {
    /// Parses a JSON object. Missing keys take their defaults.
    ///
    /// # Errors
    /// [`RollcallError::Config`] if the input is not valid JSON for this type.
    pub fn from_json(json: &str) -> Result<Self, RollcallError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The lifecycle subset handed to the session manager.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            token_window_secs: self.token_window_secs,
            max_name_len: self.max_name_len,
        }
    }
}

impl Default for RollcallConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            token_window_secs: session.token_window_secs,
            max_name_len: session.max_name_len,
        }
    }
}
