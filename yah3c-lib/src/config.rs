use crate::auth::{ChallengeMode, Credentials};
use crate::error::H3cError;
use crate::session::SessionOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration as read from a file or the command line. Every field is
/// optional until [`Config::try_from`] validates the merged result.
///
/// ```json
/// {
///   "interface": "eth0",
///   "username": "alice",
///   "password": "secret",
///   "challenge_mode": "hashed",
///   "dhcp_command": "dhclient",
///   "daemon": true
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialConfig {
    pub interface: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub challenge_mode: Option<ChallengeMode>,
    pub dhcp_command: Option<String>,
    pub daemon: Option<bool>,
}

impl PartialConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, H3cError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| H3cError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, H3cError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Values set in `other` win.
    pub fn merge(self, other: PartialConfig) -> PartialConfig {
        PartialConfig {
            interface: other.interface.or(self.interface),
            username: other.username.or(self.username),
            password: other.password.or(self.password),
            challenge_mode: other.challenge_mode.or(self.challenge_mode),
            dhcp_command: other.dhcp_command.or(self.dhcp_command),
            daemon: other.daemon.or(self.daemon),
        }
    }
}

/// Validated session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub interface: String,
    pub username: String,
    pub password: String,
    pub challenge_mode: ChallengeMode,
    pub dhcp_command: Option<String>,
    pub daemon: bool,
}

impl TryFrom<PartialConfig> for Config {
    type Error = H3cError;

    fn try_from(partial: PartialConfig) -> Result<Self, Self::Error> {
        let missing = |name: &str| H3cError::Config(format!("missing required option '{}'", name));
        Ok(Config {
            interface: partial.interface.ok_or_else(|| missing("interface"))?,
            username: partial.username.ok_or_else(|| missing("username"))?,
            password: partial.password.ok_or_else(|| missing("password"))?,
            challenge_mode: partial.challenge_mode.unwrap_or_default(),
            dhcp_command: partial.dhcp_command.filter(|cmd| !cmd.is_empty()),
            daemon: partial.daemon.unwrap_or(false),
        })
    }
}

impl Config {
    pub fn credentials(&self) -> Result<Credentials, H3cError> {
        Credentials::new(&self.username, &self.password, self.challenge_mode)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            interface: self.interface.clone(),
            dhcp_command: self.dhcp_command.clone(),
            daemon: self.daemon,
        }
    }
}
