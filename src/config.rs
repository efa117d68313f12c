use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CfError, Result};
use crate::rating_matrix::RatingMatrix;
use crate::types::{Mode, TargetCell};

pub const DEFAULT_NEIGHBORS: usize = 2;

fn default_neighbors() -> usize {
    DEFAULT_NEIGHBORS
}

/// Everything needed to run a single prediction.
///
/// ```toml
/// k = 2
/// mode = "user-based"
///
/// [target]
/// row = 0
/// col = 3
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionConfig {
    #[serde(default = "default_neighbors")]
    pub k: usize,
    #[serde(default)]
    pub mode: Mode,
    pub target: TargetCell,
}

impl PredictionConfig {
    pub fn new(target: TargetCell) -> Self {
        Self { k: DEFAULT_NEIGHBORS, mode: Mode::default(), target }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let input = fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }

    /// Checks the options that can be verified before ranking. Whether `k`
    /// neighbours are actually available is only known after ranking.
    pub fn validate(&self, matrix: &RatingMatrix) -> Result<()> {
        if self.k == 0 {
            return Err(CfError::InvalidNeighborCount(self.k));
        }
        matrix.get_cell(self.target)?;
        Ok(())
    }
}
