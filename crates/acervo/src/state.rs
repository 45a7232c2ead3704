use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read state file at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse state file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write state file to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    pub viewer_visible: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            viewer_visible: true,
        }
    }
}

impl AppState {
    pub fn load_or_default(path: &Path) -> Result<Self, StorageError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| StorageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| StorageError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn persist(&self, path: &Path) -> Result<(), StorageError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| StorageError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let serialized = toml::to_string_pretty(self)?;
        fs::write(path, serialized).map_err(|source| StorageError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// The "show embedded viewer" flag. Storage failures never reach the
/// caller: a failed read yields the default, a failed write keeps the new
/// value for this process only.
#[derive(Debug, Clone)]
pub struct ViewerPreference {
    path: PathBuf,
    state: AppState,
}

impl ViewerPreference {
    pub fn load(path: PathBuf) -> Self {
        let state = AppState::load_or_default(&path).unwrap_or_else(|err| {
            debug!(error = %err, "ignoring unreadable state file");
            AppState::default()
        });
        Self { path, state }
    }

    pub fn visible(&self) -> bool {
        self.state.viewer_visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.state.viewer_visible = visible;
        if let Err(err) = self.state.persist(&self.path) {
            warn!(error = %err, "viewer preference kept for this session only");
        }
    }

    pub fn toggle(&mut self) -> bool {
        let visible = !self.visible();
        self.set_visible(visible);
        visible
    }
}
