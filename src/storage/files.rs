//! Backup files on the local disk

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Saves backups into a directory and loads a user-chosen backup file
#[derive(Debug, Clone)]
pub struct LocalFiles {
    output_dir: PathBuf,
    selected: Option<PathBuf>,
}

impl LocalFiles {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            selected: None,
        }
    }

    /// The file [`LocalFiles::load`] reads; without one, loading is a no-op
    pub fn with_selected(mut self, file: Option<impl AsRef<Path>>) -> Self {
        self.selected = file.map(|f| f.as_ref().to_path_buf());
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `content` to `{output_dir}/{filename}`
    pub fn save(&self, content: &str, filename: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(filename);
        if path.exists() {
            log::warn!("Overwriting {}", path.display());
        }
        std::fs::write(&path, content)?;
        log::debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(path)
    }

    /// Raw text of the selected file, `None` if no file was chosen
    pub fn load(&self) -> Result<Option<String>> {
        let Some(path) = &self.selected else {
            log::debug!("No file selected");
            return Ok(None);
        };
        log::debug!("Reading {}", path.display());
        Ok(Some(std::fs::read_to_string(path)?))
    }
}
