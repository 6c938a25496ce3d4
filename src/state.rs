//! Viewer state kept between runs (`state.toml`).
//!
//! Only the last viewed catalog index is stored. The file lives in the
//! platform's data directory unless the config names another path.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::ViewCatalog;
use crate::error::Result;

/// What the viewer remembers across runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerState {
    /// Catalog index shown when the viewer last stopped.
    pub last_view: usize,
}

impl ViewerState {
    pub fn new(last_view: usize) -> Self {
        Self { last_view }
    }

    /// `state.toml` in the platform data directory.
    ///
    /// On Linux: `~/.local/share/cubeview/state.toml`
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "cubeview")
            .map(|dirs| dirs.data_dir().join("state.toml"))
    }

    /// Read saved state. A missing file is `Ok(None)`, a first run.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Some(toml::from_str(&text)?))
    }

    /// Write the state, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The saved index, if it still names a catalog item.
    pub fn valid_view(&self) -> Option<usize> {
        ViewCatalog::new()
            .item_at(self.last_view)
            .ok()
            .map(|item| item.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("cubeview-state-{}-{name}", std::process::id()))
            .join("state.toml")
    }

    #[test]
    fn save_then_load_restores_the_view() {
        let path = temp_path("roundtrip");
        ViewerState::new(3).save(&path).unwrap();

        let loaded = ViewerState::load(&path).unwrap();
        assert_eq!(loaded, Some(ViewerState::new(3)));

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn missing_file_is_a_first_run() {
        let path = temp_path("missing");
        assert_eq!(ViewerState::load(&path).unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_a_config_error() {
        let path = temp_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "last_view = \"three\"").unwrap();

        let result = ViewerState::load(&path);
        assert!(matches!(result, Err(crate::error::CubeError::Config(_))));

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn out_of_range_view_is_not_restored() {
        assert_eq!(ViewerState::new(4).valid_view(), Some(4));
        assert_eq!(ViewerState::new(5).valid_view(), None);
    }
}
