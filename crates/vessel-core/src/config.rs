//! Environment configuration
//!
//! An environment describes one remote host to sync with and the ports to
//! forward while a session is running. Documents are YAML:
//!
//! ```yaml
//! remote:
//!   hostname: example.com
//!   user: deploy
//!   identityfile: ~/.ssh/id_ed25519
//!   port: 22
//!   path: /srv/app
//! forwarding:
//!   - "8080:localhost:80"
//! ```

use crate::error::{ConfigError, ValidationError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Connection parameters for the remote host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Hostname or IP address
    pub hostname: String,

    /// SSH username
    pub user: String,

    /// Path to the SSH private key
    #[serde(rename = "identityfile")]
    pub identity_file: String,

    /// SSH port
    pub port: u32,

    /// Remote directory to sync against
    #[serde(rename = "path")]
    pub remote_path: String,

    /// Friendly name for the host (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl RemoteConfig {
    /// Get the SSH connection string (user@host)
    pub fn connection_string(&self) -> String {
        format!("{}@{}", self.user, self.hostname)
    }

    /// Get display address (user@host:port)
    pub fn display_address(&self) -> String {
        format!("{}@{}:{}", self.user, self.hostname, self.port)
    }

    /// Alias when one is set, hostname otherwise
    pub fn display_name(&self) -> &str {
        match self.alias.as_deref() {
            Some(alias) if !alias.is_empty() => alias,
            _ => &self.hostname,
        }
    }
}

/// Configuration for one remote environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub remote: RemoteConfig,

    /// Port forwarding rules, applied in order
    pub forwarding: Vec<String>,
}

impl EnvironmentConfig {
    /// Check the config is complete enough to start a session.
    ///
    /// Returns the first violation found. Forwarding is checked first, then
    /// hostname, user, identity file, remote path and port.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.forwarding.is_empty() {
            return Err(ValidationError::NoForwarding);
        }

        let remote = &self.remote;

        if remote.hostname.is_empty() {
            return Err(ValidationError::NoHostname);
        }

        if remote.user.is_empty() {
            return Err(ValidationError::NoUser);
        }

        if remote.identity_file.is_empty() {
            return Err(ValidationError::NoIdentityFile);
        }

        if remote.remote_path.is_empty() {
            return Err(ValidationError::NoRemotePath);
        }

        if remote.port == 0 {
            return Err(ValidationError::NoPort);
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Parse a config from YAML text without validating it
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Load a config from a YAML file without validating it
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a config and reject it unless it validates
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load_from(path)?;

        config.validate().map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(config)
    }
}
