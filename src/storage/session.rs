//! Session-scoped persistence of the GitHub settings
//!
//! Settings live in `$XDG_RUNTIME_DIR/lappbak/session.json`, which the OS
//! wipes at logout. Without a runtime dir the OS temp dir is used instead.

use super::RemoteStoreConfig;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const SESSION_FILE: &str = "session.json";

/// Stores a [`RemoteStoreConfig`] for the lifetime of the login session
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Store rooted in an explicit directory
    pub fn at(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Store in `LAPPBAK_SESSION_DIR`, else the user's runtime dir, else the temp dir
    pub fn default_location() -> Self {
        let dir = std::env::var_os("LAPPBAK_SESSION_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("XDG_RUNTIME_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(std::env::temp_dir)
                    .join("lappbak")
            });
        Self::at(dir)
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    /// Load saved settings, `None` if nothing was saved this session
    pub fn load(&self) -> Result<Option<RemoteStoreConfig>> {
        let path = self.path();
        if !path.exists() {
            log::debug!("No session settings at {}", path.display());
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)?;
        let config = serde_json::from_str(&text).map_err(Error::InvalidJson)?;
        Ok(Some(config))
    }

    /// Write settings through an owner-only temp file renamed into place.
    ///
    /// The directory is created 0700, and one owned by another user is refused.
    pub fn save(&self, config: &RemoteStoreConfig) -> Result<()> {
        create_private_dir(&self.dir)?;
        let text = serde_json::to_string_pretty(config).map_err(Error::InvalidJson)?;

        let mut file = tempfile::NamedTempFile::new_in(&self.dir)?;
        ensure_owned(&self.dir, file.as_file())?;
        secure_dir(&self.dir)?;
        secure_file(file.as_file())?;
        file.write_all(text.as_bytes())?;
        file.as_file().sync_all()?;

        let path = self.path();
        file.persist(&path).map_err(|e| e.error)?;
        log::debug!("Saved session settings to {}", path.display());
        Ok(())
    }

    /// Forget saved settings. Clearing an empty store is fine.
    pub fn clear(&self) -> Result<bool> {
        let path = self.path();
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)?;
        log::debug!("Removed {}", path.display());
        Ok(true)
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)?;
    if !std::fs::symlink_metadata(dir)?.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("{} is not a directory", dir.display()),
        )
        .into());
    }
    Ok(())
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// Refuse a directory someone else owns; `ours` is a file just created in it
#[cfg(unix)]
fn ensure_owned(dir: &Path, ours: &File) -> Result<()> {
    use std::os::unix::fs::MetadataExt;
    let owner = std::fs::metadata(dir)?.uid();
    if owner != ours.metadata()?.uid() {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("{} is owned by another user", dir.display()),
        )
        .into());
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_owned(_dir: &Path, _ours: &File) -> Result<()> {
    Ok(())
}

/// Owner-only access to the directory (0700)
#[cfg(unix)]
fn secure_dir(dir: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}

#[cfg(not(unix))]
fn secure_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

/// Owner read/write only (0600); the file holds a token
#[cfg(unix)]
fn secure_file(file: &File) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn secure_file(_file: &File) -> Result<()> {
    Ok(())
}
