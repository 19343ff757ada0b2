//! Error types for config handling and storage provisioning

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A required config field or list is missing or empty.
///
/// Variants are listed in the order the validator checks them.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no forwarding ports are defined")]
    NoForwarding,

    #[error("no remote hostname (to SSH in with) defined")]
    NoHostname,

    #[error("no remote user (to SSH in with) defined")]
    NoUser,

    #[error("no remote identity file (SSH key) defined")]
    NoIdentityFile,

    #[error("no remote file path to sync with defined")]
    NoRemotePath,

    #[error("no remote port (to SSH into) defined")]
    NoPort,
}

impl ValidationError {
    /// Key of the offending field as it appears in the config document
    pub fn field(&self) -> &'static str {
        match self {
            Self::NoForwarding => "forwarding",
            Self::NoHostname => "hostname",
            Self::NoUser => "user",
            Self::NoIdentityFile => "identityfile",
            Self::NoRemotePath => "path",
            Self::NoPort => "port",
        }
    }
}

/// Loading an environment config from disk failed
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

/// Provisioning a storage directory failed
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("could not find home directory")]
    HomeDirResolution,

    #[error("could not create {name} directory {} as a file with that name already exists", path.display())]
    PathConflict { name: String, path: PathBuf },

    #[error("could not create {name} directory {}: {source}", path.display())]
    DirectoryCreate {
        name: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("stat error on {}: {source}", path.display())]
    StatFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid app name: {0:?}")]
    InvalidAppName(String),
}

impl StorageError {
    /// Path the error refers to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::PathConflict { path, .. }
            | Self::DirectoryCreate { path, .. }
            | Self::StatFailed { path, .. } => Some(path.as_path()),
            Self::HomeDirResolution | Self::InvalidAppName(_) => None,
        }
    }
}
