//! Configuration for a play session.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tw_core::DataPaths;
use tw_story::SCENE_HISTORY_LIMIT;

/// Configuration for a play session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// RNG seed for reproducible checks.
    pub seed: u64,
    /// Directory holding every persisted file.
    pub data_dir: PathBuf,
    /// Scenes remembered for going back (at least 1).
    pub history_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            data_dir: PathBuf::from("./data"),
            history_limit: SCENE_HISTORY_LIMIT,
        }
    }
}

impl SessionConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the scene history length (at least 1).
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// File layout under the data directory.
    pub fn data_paths(&self) -> DataPaths {
        DataPaths::new(&self.data_dir)
    }
}
