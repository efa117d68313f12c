use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::config::PredictionConfig;
use crate::error::{CfError, PipelineError, Stage};
use crate::predictor::weighted_average;
use crate::ranking::rank;
use crate::rating_matrix::RatingMatrix;
use crate::report::Prediction;
use crate::types::{Mode, TargetCell};

/// Runs one prediction: load (validate), rank, select the top `k`, aggregate.
///
/// The matrix is only read, so independent runs may share it across threads.
pub fn run(matrix: &RatingMatrix, config: &PredictionConfig) -> Result<Prediction, PipelineError> {
    let _span = info_span!("predict", cell = %config.target, mode = %config.mode, k = config.k).entered();

    config
        .validate(matrix)
        .map_err(|e| PipelineError::new(Stage::Load, e))?;

    let ranking = rank(matrix, config.target, config.mode)
        .map_err(|e| PipelineError::new(Stage::Rank, e))?;

    let neighbors = ranking
        .top_k(config.k)
        .map_err(|e| PipelineError::new(Stage::Select, e))?;

    let predicted_rating = weighted_average(neighbors, matrix, config.target, config.mode)
        .map_err(|e| PipelineError::new(Stage::Aggregate, e))?;

    info!(predicted_rating, eligible = ranking.len(), "prediction finished");

    let excluded = ranking.undefined().to_vec();
    Ok(Prediction {
        target_row: config.target.row,
        target_col: config.target.col,
        mode: config.mode,
        k: config.k,
        predicted_rating,
        neighbors: ranking.into_records(),
        excluded,
    })
}

/// Prediction outcome for a single cell of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct CellPrediction {
    pub row: usize,
    pub col: usize,
    #[serde(flatten)]
    pub outcome: CellOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status")]
pub enum CellOutcome {
    Predicted { rating: f64 },
    Failed { stage: Stage, reason: String },
}

impl CellPrediction {
    pub fn rating(&self) -> Option<f64> {
        match self.outcome {
            CellOutcome::Predicted { rating } => Some(rating),
            CellOutcome::Failed { .. } => None,
        }
    }
}

/// Predicts every unrated cell of `matrix`, in row-major order.
///
/// Cells are processed in parallel; every run owns its ranking, the matrix
/// is shared read-only.
pub fn predict_missing(matrix: &RatingMatrix, k: usize, mode: Mode) -> Result<Vec<CellPrediction>, CfError> {
    if k == 0 {
        return Err(CfError::InvalidNeighborCount(k));
    }

    let cells = matrix.unrated_cells();
    info!(cells = cells.len(), k, %mode, "predicting unrated cells");

    let predictions: Vec<CellPrediction> = cells
        .into_par_iter()
        .map(|cell: TargetCell| {
            let config = PredictionConfig::new(cell).with_k(k).with_mode(mode);
            let outcome = match run(matrix, &config) {
                Ok(prediction) => CellOutcome::Predicted { rating: prediction.predicted_rating },
                Err(error) => CellOutcome::Failed { stage: error.stage, reason: error.source.to_string() },
            };
            CellPrediction { row: cell.row, col: cell.col, outcome }
        })
        .collect();

    let failed = predictions.iter().filter(|p| p.rating().is_none()).count();
    if failed > 0 {
        warn!(failed, "some cells could not be predicted");
    }

    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{item_based_example, user_based_example};

    #[test]
    fn test_user_based_run() {
        let matrix = user_based_example();
        let config = PredictionConfig::new(TargetCell::new(0, 3));

        let prediction = run(&matrix, &config).unwrap();

        assert!((prediction.predicted_rating - 4.078627478572335).abs() < 1e-9);
        let used: Vec<usize> = prediction.used_neighbors().iter().map(|n| n.index).collect();
        assert_eq!(used, vec![1, 2]);
        assert_eq!(prediction.neighbors.len(), 3);
    }

    #[test]
    fn test_item_based_run() {
        let matrix = item_based_example();
        let config = PredictionConfig::new(TargetCell::new(2, 3)).with_mode(Mode::ItemBased);

        let prediction = run(&matrix, &config).unwrap();

        assert!((prediction.predicted_rating - 2.365703617643).abs() < 1e-9);
        let used: Vec<usize> = prediction.used_neighbors().iter().map(|n| n.index).collect();
        assert_eq!(used, vec![2, 1]);
    }

    #[test]
    fn test_failures_report_their_stage() {
        let matrix = user_based_example();

        let error = run(&matrix, &PredictionConfig::new(TargetCell::new(0, 3)).with_k(0)).unwrap_err();
        assert_eq!(error.stage, Stage::Load);

        let error = run(&matrix, &PredictionConfig::new(TargetCell::new(0, 7))).unwrap_err();
        assert_eq!(error.stage, Stage::Load);
        assert!(matches!(error.source, CfError::IndexOutOfBounds { .. }));

        let error = run(&matrix, &PredictionConfig::new(TargetCell::new(0, 3)).with_k(5)).unwrap_err();
        assert_eq!(error.stage, Stage::Select);
        assert!(matches!(error.source, CfError::InsufficientNeighbors { required: 5, available: 3 }));
        assert!(error.to_string().starts_with("select stage failed"));
    }

    #[test]
    fn test_empty_target_has_no_neighbors() {
        let matrix = RatingMatrix::from_rows(&[
            [0u32, 0, 0, 0],
            [3, 4, 0, 5],
            [2, 0, 1, 4],
        ])
        .unwrap();

        for k in 1..4 {
            let error = run(&matrix, &PredictionConfig::new(TargetCell::new(0, 3)).with_k(k)).unwrap_err();
            assert_eq!(error.stage, Stage::Select);
            assert!(matches!(error.source, CfError::InsufficientNeighbors { available: 0, .. }));
        }
    }

    #[test]
    fn test_disjoint_ratings_leave_no_neighbors() {
        // Users 1 and 2 rated the target item but share no other item with user 0.
        let matrix = RatingMatrix::from_rows(&[
            [5u32, 0, 0, 0],
            [0, 3, 0, 4],
            [0, 0, 2, 1],
        ])
        .unwrap();

        let ranking = rank(&matrix, TargetCell::new(0, 3), Mode::UserBased).unwrap();
        assert!(ranking.is_empty());
        assert_eq!(ranking.undefined(), &[1, 2]);

        let error = run(&matrix, &PredictionConfig::new(TargetCell::new(0, 3)).with_k(1)).unwrap_err();
        assert_eq!(error.stage, Stage::Select);
        assert!(matches!(error.source, CfError::InsufficientNeighbors { required: 1, available: 0 }));
    }

    #[test]
    fn test_stored_target_rating_does_not_change_prediction() {
        let matrix = user_based_example();
        let config = PredictionConfig::new(TargetCell::new(0, 3));
        let filled = matrix.with_rating(0, 3, 1).unwrap();

        let blank = run(&matrix, &config).unwrap();
        let rated = run(&filled, &config).unwrap();

        assert_eq!(blank.predicted_rating, rated.predicted_rating);
        assert_eq!(blank.neighbors, rated.neighbors);
    }

    #[test]
    fn test_predict_missing_covers_every_unrated_cell() {
        let matrix = user_based_example();

        let predictions = predict_missing(&matrix, 2, Mode::UserBased).unwrap();
        let cells: Vec<TargetCell> = predictions.iter().map(|p| TargetCell::new(p.row, p.col)).collect();
        assert_eq!(cells, matrix.unrated_cells());

        let u1_i4 = predictions.iter().find(|p| p.row == 0 && p.col == 3).unwrap();
        assert!((u1_i4.rating().unwrap() - 4.078627478572335).abs() < 1e-9);

        for prediction in &predictions {
            if let Some(rating) = prediction.rating() {
                assert!(rating >= 1.0 - 1e-9 && rating <= 5.0 + 1e-9);
            }
        }
    }

    #[test]
    fn test_predict_missing_rejects_zero_k() {
        assert!(matches!(
            predict_missing(&user_based_example(), 0, Mode::ItemBased),
            Err(CfError::InvalidNeighborCount(0))
        ));
    }
}
