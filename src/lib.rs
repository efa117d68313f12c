//! Neighbourhood-based collaborative filtering over dense rating matrices.
//!
//! A missing rating is predicted from the `k` most similar users (or items)
//! that have rated the slot in question, weighting their ratings by cosine
//! similarity.
//!
//! ```
//! use knn_cf::{datasets, engine, PredictionConfig, TargetCell};
//!
//! let matrix = datasets::user_based_example();
//! let prediction = engine::run(&matrix, &PredictionConfig::new(TargetCell::new(0, 3))).unwrap();
//! assert!((prediction.predicted_rating - 4.0786).abs() < 1e-3);
//! ```

pub mod config;
pub mod datasets;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod loader;
pub mod predictor;
pub mod ranking;
pub mod rating_matrix;
pub mod report;
pub mod similarity;
pub mod types;

#[cfg(feature = "python")]
mod python;

pub use crate::config::PredictionConfig;
pub use crate::error::{CfError, PipelineError, Result, Stage};
pub use crate::ranking::{rank, Ranking};
pub use crate::rating_matrix::RatingMatrix;
pub use crate::report::Prediction;
pub use crate::types::{Axis, Mode, SimilarityRecord, TargetCell};
