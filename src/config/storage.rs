//! Session storage configuration

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Directory for session files; sessions live in memory when absent
    pub session_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn is_persistent(&self) -> bool {
        self.session_dir.is_some()
    }
}
