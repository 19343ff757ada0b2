//! Standard paths used by Vessel
//!
//! Everything here is pure path arithmetic. Nothing touches the filesystem;
//! see [`crate::storage`] for the operations that create directories.

use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};

/// Name of the Vessel root directory under home
pub const ROOT_DIR: &str = ".vessel";

/// Name of the per-app environments directory
pub const ENVS_DIR: &str = "envs";

/// Name of the helper binaries directory
pub const BIN_DIR: &str = "bin";

/// Standard Vessel paths, anchored at a resolved home directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    home: PathBuf,
}

impl Paths {
    /// Use an already-resolved home directory
    pub fn from_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Resolve the current user's home directory
    pub fn discover() -> Result<Self, StorageError> {
        let home = dirs::home_dir().ok_or(StorageError::HomeDirResolution)?;
        Ok(Self::from_home(home))
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Vessel root (~/.vessel)
    pub fn root(&self) -> PathBuf {
        self.home.join(ROOT_DIR)
    }

    /// Environments root (~/.vessel/envs)
    pub fn envs_root(&self) -> PathBuf {
        self.root().join(ENVS_DIR)
    }

    /// Per-app state directory (~/.vessel/envs/<app>)
    pub fn app_dir(&self, app: &str) -> Result<PathBuf, StorageError> {
        check_app_name(app)?;
        Ok(self.envs_root().join(app))
    }

    /// Helper binaries directory (~/.vessel/bin)
    pub fn bin_dir(&self) -> PathBuf {
        self.root().join(BIN_DIR)
    }

    /// Cached environment directory for an app (~/envs/<app>).
    ///
    /// Unlike [`Paths::app_dir`] this sits directly under home, outside the
    /// Vessel root. Existing installs depend on this location.
    pub fn app_env_dir(&self, app: &str) -> Result<PathBuf, StorageError> {
        check_app_name(app)?;
        Ok(self.home.join(ENVS_DIR).join(app))
    }
}

/// An app name must be exactly one normal path component
fn check_app_name(app: &str) -> Result<(), StorageError> {
    let mut components = Path::new(app).components();

    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == app => Ok(()),
        _ => Err(StorageError::InvalidAppName(app.to_string())),
    }
}
