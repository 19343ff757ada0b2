//! Storage directory provisioning
//!
//! Creates the Vessel directory tree on demand:
//!
//! ```text
//! ~/.vessel/              root
//! ~/.vessel/envs/         environments root
//! ~/.vessel/envs/<app>/   per-app state
//! ~/.vessel/bin/          helper binaries
//! ```
//!
//! Every ensure operation is idempotent. An existing directory is left alone,
//! a missing one is created with mode 0750, and anything else sitting at the
//! path is reported as a conflict and never removed.

use crate::error::StorageError;
use crate::paths::Paths;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Permission bits for every directory Vessel creates
pub const DIR_MODE: u32 = 0o750;

/// Directories a sync session needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDirs {
    pub app_dir: PathBuf,
    pub bin_dir: PathBuf,
}

/// Ensures the Vessel directory tree exists under a home directory
#[derive(Debug, Clone)]
pub struct Storage {
    paths: Paths,
}

impl Storage {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    /// Storage rooted at the current user's home directory
    pub fn discover() -> Result<Self, StorageError> {
        Ok(Self::new(Paths::discover()?))
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Ensure ~/.vessel exists
    pub fn ensure_root(&self) -> Result<PathBuf, StorageError> {
        ensure_dir(&self.paths.root(), "vessel")
    }

    /// Ensure ~/.vessel/envs exists
    pub fn ensure_envs_root(&self) -> Result<PathBuf, StorageError> {
        ensure_dir(&self.paths.envs_root(), "vessel envs")
    }

    /// Ensure ~/.vessel/envs/<app> exists, creating its parents first
    pub fn ensure_app_dir(&self, app: &str) -> Result<PathBuf, StorageError> {
        let app_dir = self.paths.app_dir(app)?;

        self.ensure_root()?;
        self.ensure_envs_root()?;

        ensure_dir(&app_dir, "vessel app")
    }

    /// Ensure ~/.vessel/bin exists, creating the root first.
    ///
    /// The environments root is not required.
    pub fn ensure_bin_dir(&self) -> Result<PathBuf, StorageError> {
        self.ensure_root()?;
        ensure_dir(&self.paths.bin_dir(), "vessel bin")
    }

    /// Ensure the app and bin directories a session runs against
    pub fn ensure_session(&self, app: &str) -> Result<SessionDirs, StorageError> {
        let app_dir = self.ensure_app_dir(app)?;
        let bin_dir = self.ensure_bin_dir()?;

        Ok(SessionDirs { app_dir, bin_dir })
    }
}

/// Make sure a single directory exists at `path`.
///
/// `name` describes the directory in error messages. Parents are never
/// created; a missing parent surfaces as [`StorageError::DirectoryCreate`].
pub fn ensure_dir(path: &Path, name: &str) -> Result<PathBuf, StorageError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => {
            debug!(path = %path.display(), "{} directory already exists", name);
            Ok(path.to_path_buf())
        }
        Ok(_) => Err(conflict(path, name)),
        Err(e) if e.kind() == ErrorKind::NotFound => create_dir(path, name),
        Err(source) => Err(StorageError::StatFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn create_dir(path: &Path, name: &str) -> Result<PathBuf, StorageError> {
    match dir_builder().create(path) {
        Ok(()) => {
            info!(path = %path.display(), "created {} directory", name);
            Ok(path.to_path_buf())
        }
        // Another process created it between the stat and the mkdir
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            if path.is_dir() {
                debug!(path = %path.display(), "{} directory created concurrently", name);
                Ok(path.to_path_buf())
            } else {
                Err(conflict(path, name))
            }
        }
        Err(source) => Err(StorageError::DirectoryCreate {
            name: name.to_string(),
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(unix)]
fn dir_builder() -> fs::DirBuilder {
    use std::os::unix::fs::DirBuilderExt;

    let mut builder = fs::DirBuilder::new();
    builder.mode(DIR_MODE);
    builder
}

#[cfg(not(unix))]
fn dir_builder() -> fs::DirBuilder {
    fs::DirBuilder::new()
}

fn conflict(path: &Path, name: &str) -> StorageError {
    StorageError::PathConflict {
        name: name.to_string(),
        path: path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn storage_in(home: &Path) -> Storage {
        Storage::new(Paths::from_home(home))
    }

    #[test]
    fn test_ensure_root_is_idempotent() -> Result<()> {
        let home = tempdir()?;
        let storage = storage_in(home.path());
        let expected = home.path().join(".vessel");

        let first = storage.ensure_root()?;
        assert_eq!(first, expected);
        assert!(expected.is_dir());

        let second = storage.ensure_root()?;
        assert_eq!(second, first);
        assert!(expected.is_dir());
        Ok(())
    }

    #[test]
    fn test_existing_directory_is_untouched() -> Result<()> {
        let home = tempdir()?;
        let root = home.path().join(".vessel");
        fs::create_dir(&root)?;
        fs::write(root.join("keep.txt"), "data")?;

        storage_in(home.path()).ensure_root()?;

        assert_eq!(fs::read_to_string(root.join("keep.txt"))?, "data");
        Ok(())
    }

    #[test]
    fn test_file_in_the_way_is_a_conflict() -> Result<()> {
        let home = tempdir()?;
        let root = home.path().join(".vessel");
        fs::write(&root, "not a directory")?;

        let err = storage_in(home.path()).ensure_root().unwrap_err();

        match &err {
            StorageError::PathConflict { path, .. } => assert_eq!(path, &root),
            other => panic!("expected conflict, got {:?}", other),
        }
        assert!(err.to_string().contains(".vessel"));

        // The file is never replaced
        assert!(root.is_file());
        assert_eq!(fs::read_to_string(&root)?, "not a directory");
        Ok(())
    }

    #[test]
    fn test_ensure_app_dir_creates_chain() -> Result<()> {
        let home = tempdir()?;
        let storage = storage_in(home.path());

        let app_dir = storage.ensure_app_dir("myapp")?;

        assert_eq!(app_dir, home.path().join(".vessel/envs/myapp"));
        assert!(home.path().join(".vessel").is_dir());
        assert!(home.path().join(".vessel/envs").is_dir());
        assert!(app_dir.is_dir());

        assert_eq!(storage.ensure_app_dir("myapp")?, app_dir);
        Ok(())
    }

    #[test]
    fn test_ensure_app_dir_stops_when_root_fails() -> Result<()> {
        let tmp = tempdir()?;
        // Home does not exist, so creating the root fails
        let home = tmp.path().join("missing-home");
        let storage = storage_in(&home);

        let err = storage.ensure_app_dir("myapp").unwrap_err();

        match &err {
            StorageError::DirectoryCreate { path, source, .. } => {
                assert_eq!(path, &home.join(".vessel"));
                assert_eq!(source.kind(), ErrorKind::NotFound);
            }
            other => panic!("expected create failure, got {:?}", other),
        }
        assert!(!home.exists());
        assert!(!home.join(".vessel/envs/myapp").exists());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_ensure_app_dir_stops_when_root_is_denied() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir()?;
        let home = tmp.path().join("locked-home");
        fs::create_dir(&home)?;
        fs::set_permissions(&home, fs::Permissions::from_mode(0o500))?;

        // Privileged users ignore the mode bits; nothing to check then
        let access_check = home.join("access-check");
        if fs::create_dir(&access_check).is_ok() {
            fs::remove_dir(&access_check)?;
            fs::set_permissions(&home, fs::Permissions::from_mode(0o700))?;
            return Ok(());
        }

        let result = storage_in(&home).ensure_app_dir("myapp");
        fs::set_permissions(&home, fs::Permissions::from_mode(0o700))?;

        match result {
            Err(StorageError::DirectoryCreate { path, source, .. }) => {
                assert_eq!(path, home.join(".vessel"));
                assert_eq!(source.kind(), ErrorKind::PermissionDenied);
            }
            other => panic!("expected create failure, got {:?}", other),
        }
        assert!(!home.join(".vessel").exists());
        assert!(!home.join(".vessel/envs/myapp").exists());
        Ok(())
    }

    #[test]
    fn test_ensure_app_dir_stops_when_envs_root_conflicts() -> Result<()> {
        let home = tempdir()?;
        fs::create_dir(home.path().join(".vessel"))?;
        fs::write(home.path().join(".vessel/envs"), "")?;

        let err = storage_in(home.path()).ensure_app_dir("myapp").unwrap_err();

        assert!(matches!(err, StorageError::PathConflict { .. }));
        assert!(home.path().join(".vessel/envs").is_file());
        Ok(())
    }

    #[test]
    fn test_invalid_app_name_creates_nothing() -> Result<()> {
        let home = tempdir()?;

        let err = storage_in(home.path())
            .ensure_app_dir("../outside")
            .unwrap_err();

        assert!(matches!(err, StorageError::InvalidAppName(_)));
        assert!(!home.path().join(".vessel").exists());
        Ok(())
    }

    #[test]
    fn test_ensure_bin_dir_from_empty_home() -> Result<()> {
        let home = tempdir()?;
        let storage = storage_in(home.path());

        let bin = storage.ensure_bin_dir()?;

        assert_eq!(bin, home.path().join(".vessel/bin"));
        assert_eq!(bin, storage.paths().bin_dir());
        assert!(bin.is_dir());
        // Bin does not pull in the envs root
        assert!(!home.path().join(".vessel/envs").exists());
        Ok(())
    }

    #[test]
    fn test_ensure_bin_dir_stops_on_root_conflict() -> Result<()> {
        let home = tempdir()?;
        fs::write(home.path().join(".vessel"), "")?;

        let err = storage_in(home.path()).ensure_bin_dir().unwrap_err();

        assert!(matches!(err, StorageError::PathConflict { .. }));
        Ok(())
    }

    #[test]
    fn test_missing_parent_is_a_create_failure() -> Result<()> {
        let home = tempdir()?;
        let target = home.path().join("a/b");

        let err = ensure_dir(&target, "test").unwrap_err();

        assert!(matches!(err, StorageError::DirectoryCreate { .. }));
        assert!(!home.path().join("a").exists());
        Ok(())
    }

    #[test]
    fn test_create_dir_recovers_when_directory_appeared() -> Result<()> {
        let home = tempdir()?;
        let dir = home.path().join("raced");
        fs::create_dir(&dir)?;

        // Another process won the race after our stat
        assert_eq!(create_dir(&dir, "test")?, dir);
        assert!(dir.is_dir());
        Ok(())
    }

    #[test]
    fn test_create_dir_reports_file_that_appeared() -> Result<()> {
        let home = tempdir()?;
        let file = home.path().join("raced");
        fs::write(&file, "")?;

        match create_dir(&file, "test") {
            Err(StorageError::PathConflict { name, path }) => {
                assert_eq!(name, "test");
                assert_eq!(path, file);
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert!(file.is_file());
        Ok(())
    }

    #[test]
    fn test_discover_uses_home_directory() {
        match (Storage::discover(), dirs::home_dir()) {
            (Ok(storage), Some(home)) => {
                assert_eq!(storage.paths().home(), home.as_path());
                assert_eq!(storage.paths().root(), home.join(".vessel"));
            }
            (Err(StorageError::HomeDirResolution), None) => {}
            (result, home) => panic!("unexpected {:?} for home {:?}", result, home),
        }
    }

    #[test]
    fn test_home_resolution_error_has_no_path() {
        let err = StorageError::HomeDirResolution;
        assert_eq!(err.to_string(), "could not find home directory");
        assert!(err.path().is_none());
    }

    #[test]
    fn test_ensure_session() -> Result<()> {
        let home = tempdir()?;
        let storage = storage_in(home.path());

        let dirs = storage.ensure_session("myapp")?;

        assert_eq!(dirs.app_dir, home.path().join(".vessel/envs/myapp"));
        assert_eq!(dirs.bin_dir, home.path().join(".vessel/bin"));
        assert!(dirs.app_dir.is_dir());
        assert!(dirs.bin_dir.is_dir());
        Ok(())
    }

    #[test]
    fn test_resolvers_do_not_touch_disk() -> Result<()> {
        let home = tempdir()?;
        let storage = storage_in(home.path());

        let bin = storage.paths().bin_dir();
        let env = storage.paths().app_env_dir("myapp")?;

        assert_eq!(bin, storage.paths().bin_dir());
        assert_eq!(env, home.path().join("envs/myapp"));
        assert_eq!(fs::read_dir(home.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_stat_failure() -> Result<()> {
        let home = tempdir()?;
        let file = home.path().join("plain");
        fs::write(&file, "")?;

        // A path beneath a regular file cannot be stat'ed
        let err = ensure_dir(&file.join("child"), "test").unwrap_err();

        if cfg!(unix) {
            assert!(matches!(err, StorageError::StatFailed { .. }));
        }
        assert!(err.path().is_some());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_created_directories_are_not_world_accessible() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let home = tempdir()?;
        let storage = storage_in(home.path());

        let bin = storage.ensure_bin_dir()?;
        let mode = fs::metadata(&bin)?.permissions().mode() & 0o777;

        assert_eq!(mode & !DIR_MODE, 0, "mode {:o}", mode);
        assert_eq!(mode & 0o700, 0o700);
        Ok(())
    }
}
