use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CfError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => f.write_str("row"),
            Axis::Column => f.write_str("column"),
        }
    }
}

/// Which entities are compared with each other.
///
/// In user-based mode the rows of the matrix (users) are compared and the
/// neighbours are other users who rated the target item. In item-based mode
/// the columns (items) are compared and the neighbours are other items the
/// target user has rated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    UserBased,
    ItemBased,
}

impl Mode {
    /// Axis along which candidates are enumerated and vectors are taken.
    pub fn comparison_axis(&self) -> Axis {
        match self {
            Mode::UserBased => Axis::Row,
            Mode::ItemBased => Axis::Column,
        }
    }

    /// Index of the target entity on the comparison axis.
    pub fn target_index(&self, target: TargetCell) -> usize {
        match self {
            Mode::UserBased => target.row,
            Mode::ItemBased => target.col,
        }
    }

    /// The cell holding `candidate`'s known rating for the predicted slot.
    pub fn neighbor_cell(&self, target: TargetCell, candidate: usize) -> TargetCell {
        match self {
            Mode::UserBased => TargetCell::new(candidate, target.col),
            Mode::ItemBased => TargetCell::new(target.row, candidate),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::UserBased => f.write_str("user-based"),
            Mode::ItemBased => f.write_str("item-based"),
        }
    }
}

impl FromStr for Mode {
    type Err = CfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "user-based" | "user" => Ok(Mode::UserBased),
            "item-based" | "item" => Ok(Mode::ItemBased),
            other => Err(CfError::UnknownMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetCell {
    pub row: usize,
    pub col: usize,
}

impl TargetCell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for TargetCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A candidate together with its similarity to the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityRecord {
    pub index: usize,
    pub similarity: f64,
}

impl SimilarityRecord {
    pub fn new(index: usize, similarity: f64) -> Self {
        Self { index, similarity }
    }
}
