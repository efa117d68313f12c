use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::types::{Mode, SimilarityRecord};

/// Outcome of a prediction run, including the ranked neighbours it was
/// derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub target_row: usize,
    pub target_col: usize,
    pub mode: Mode,
    pub k: usize,
    pub predicted_rating: f64,
    /// Every eligible neighbour, most similar first. The first `k` entries
    /// were used for the prediction.
    pub neighbors: Vec<SimilarityRecord>,
    /// Candidates skipped because their similarity was undefined.
    pub excluded: Vec<usize>,
}

impl Prediction {
    pub fn used_neighbors(&self) -> &[SimilarityRecord] {
        &self.neighbors[..self.k.min(self.neighbors.len())]
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entity = match self.mode {
            Mode::UserBased => "user",
            Mode::ItemBased => "item",
        };

        writeln!(f, "Ranked {entity} neighbours ({}):", self.mode)?;
        for (position, neighbor) in self.neighbors.iter().enumerate() {
            let marker = if position < self.k { '*' } else { ' ' };
            writeln!(f, " {marker} {entity} {:>3}  similarity {:.6}", neighbor.index, neighbor.similarity)?;
        }
        if !self.excluded.is_empty() {
            writeln!(f, "   excluded (undefined similarity): {:?}", self.excluded)?;
        }
        write!(
            f,
            "Considering the top {} similar {entity}s, the predicted rating of user {} for item {} is {:.4}",
            self.k, self.target_row, self.target_col, self.predicted_rating
        )
    }
}
