//! Output artifacts: chart images and the report document

pub mod markdown;
pub mod svg;

pub use markdown::*;
pub use svg::*;

use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Formatting error")]
    Fmt(#[from] std::fmt::Error),

    #[error("Invalid artifact name: {0:?}")]
    InvalidName(String),
}

pub type SinkResult<T> = Result<T, SinkError>;

/// Directory every artifact of one report run is written to
#[derive(Debug, Clone)]
pub struct ArtifactDir {
    dir: PathBuf,
}

impl ArtifactDir {
    pub fn new<P: AsRef<Path>>(dir: P) -> SinkResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Write (or replace) a file directly inside the directory
    pub fn write(&self, file_name: &str, contents: &[u8]) -> SinkResult<PathBuf> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return Err(SinkError::InvalidName(file_name.to_string()));
        }
        let path = self.dir.join(file_name);
        let mut f = File::create(&path)?;
        f.write_all(contents)?;
        debug!(path = %path.display(), bytes = contents.len(), "wrote artifact");
        Ok(path)
    }
}
