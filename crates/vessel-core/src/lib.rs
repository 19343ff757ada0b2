//! Vessel Core - config validation and on-disk layout
//!
//! Before a sync or forwarding session starts, Vessel checks the loaded
//! environment config is complete and makes sure `~/.vessel` holds the
//! directories the session needs.

pub mod config;
pub mod error;
pub mod paths;
pub mod storage;

pub use config::{EnvironmentConfig, RemoteConfig};
pub use error::{ConfigError, StorageError, ValidationError};
pub use paths::Paths;
pub use storage::{SessionDirs, Storage};
