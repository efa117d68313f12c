use std::fmt;

use thiserror::Error;

use crate::types::Axis;

pub type Result<T> = std::result::Result<T, CfError>;

#[derive(Debug, Error)]
pub enum CfError {
    #[error("{axis} index {index} is out of bounds (len {len})")]
    IndexOutOfBounds { axis: Axis, index: usize, len: usize },

    #[error("similarity is undefined: {0}")]
    UndefinedSimilarity(&'static str),

    #[error("need {required} neighbours but only {available} are eligible")]
    InsufficientNeighbors { required: usize, available: usize },

    #[error("similarities of the selected neighbours sum to zero")]
    DivisionByZero,

    #[error("vectors differ in length: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("neighbour count must be at least 1, got {0}")]
    InvalidNeighborCount(usize),

    #[error("unknown mode '{0}', expected user-based or item-based")]
    UnknownMode(String),

    #[error("invalid rating matrix: {0}")]
    InvalidMatrix(String),

    #[error("cell ({row}, {col}) is rated more than once")]
    DuplicateRating { row: usize, col: usize },

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Step of a prediction run, reported alongside the error that aborted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Load,
    Rank,
    Select,
    Aggregate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Rank => "rank",
            Stage::Select => "select",
            Stage::Aggregate => "aggregate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: CfError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: CfError) -> Self {
        Self { stage, source }
    }
}
