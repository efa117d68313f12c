use tracing::debug;

use crate::error::{CfError, Result};
use crate::ranking::Ranking;
use crate::rating_matrix::RatingMatrix;
use crate::types::{Mode, SimilarityRecord, TargetCell};

/// Similarity-weighted average of the neighbours' known ratings for the
/// target slot.
pub fn weighted_average(
    neighbors: &[SimilarityRecord],
    matrix: &RatingMatrix,
    target: TargetCell,
    mode: Mode,
) -> Result<f64> {
    let mut weighted_sum: f64 = 0.0;
    let mut weight_sum: f64 = 0.0;

    for neighbor in neighbors {
        let rating = matrix.get_cell(mode.neighbor_cell(target, neighbor.index))?;
        weighted_sum += neighbor.similarity * rating as f64;
        weight_sum += neighbor.similarity;
    }

    if weight_sum == 0.0 {
        return Err(CfError::DivisionByZero);
    }

    let prediction = weighted_sum / weight_sum;
    if !prediction.is_finite() {
        return Err(CfError::DivisionByZero);
    }

    debug!(cell = %target, neighbors = neighbors.len(), prediction, "aggregated neighbours");

    Ok(prediction)
}

/// Predicts the rating of `target` from the `k` best neighbours in `ranking`.
pub fn predict(
    ranking: &Ranking,
    matrix: &RatingMatrix,
    target: TargetCell,
    mode: Mode,
    k: usize,
) -> Result<f64> {
    let neighbors = ranking.top_k(k)?;
    weighted_average(neighbors, matrix, target, mode)
}
