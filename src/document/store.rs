use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::SessionDocument;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session file malformed: {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SessionDocument {
    /// Load the document, creating an empty one on first use
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "session file missing, creating it");
            let doc = Self::default();
            doc.save(path)?;
            return Ok(doc);
        }

        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            action: "read",
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Rewrite the whole document: temp file in the same directory, then rename
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let io = |action: &'static str| {
            move |source: std::io::Error| StoreError::Io {
                action,
                path: path.to_path_buf(),
                source,
            }
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io("create directory for"))?;

        let mut content = serde_json::to_string_pretty(self).map_err(|source| {
            StoreError::Malformed {
                path: path.to_path_buf(),
                source,
            }
        })?;
        content.push('\n');

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io("create temp file for"))?;
        tmp.write_all(content.as_bytes()).map_err(io("write"))?;
        tmp.flush().map_err(io("flush"))?;
        tmp.persist(path).map_err(|e| StoreError::Io {
            action: "replace",
            path: path.to_path_buf(),
            source: e.error,
        })?;

        Ok(())
    }
}
