use serde::Serialize;
use tracing::debug;

use crate::error::{CfError, Result};
use crate::rating_matrix::{RatingMatrix, UNRATED};
use crate::similarity::cosine_similarity;
use crate::types::{Mode, SimilarityRecord, TargetCell};

/// Eligible neighbours of a target cell, most similar first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    records: Vec<SimilarityRecord>,
    undefined: Vec<usize>,
}

impl Ranking {
    /// Builds a ranking from unordered records. The sort is stable, so equal
    /// similarities keep their first-seen order.
    pub fn from_records(mut records: Vec<SimilarityRecord>) -> Self {
        records.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        Self { records, undefined: Vec::new() }
    }

    pub fn records(&self) -> &[SimilarityRecord] {
        &self.records
    }

    /// Candidates that rated the target slot but whose similarity to the
    /// target could not be computed.
    pub fn undefined(&self) -> &[usize] {
        &self.undefined
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SimilarityRecord> {
        self.records.iter()
    }

    pub fn top_k(&self, k: usize) -> Result<&[SimilarityRecord]> {
        if k == 0 {
            return Err(CfError::InvalidNeighborCount(k));
        }
        if self.records.len() < k {
            return Err(CfError::InsufficientNeighbors { required: k, available: self.records.len() });
        }
        Ok(&self.records[..k])
    }

    pub fn into_records(self) -> Vec<SimilarityRecord> {
        self.records
    }
}

/// Rating vector of the target entity with the predicted slot cleared, so a
/// rating already stored there takes no part in the similarities.
fn masked_target_vector(matrix: &RatingMatrix, target: TargetCell, mode: Mode) -> Result<Vec<u32>> {
    let mut vector = matrix
        .vector(mode.comparison_axis(), mode.target_index(target))?
        .into_owned();
    let slot = match mode {
        Mode::UserBased => target.col,
        Mode::ItemBased => target.row,
    };
    vector[slot] = UNRATED;
    Ok(vector)
}

/// Scores every eligible candidate against the target and ranks them.
///
/// Candidates are the other entities on the comparison axis of `mode` that
/// hold a rating in the slot being predicted. Candidates with an undefined
/// similarity are left out of the ranking and listed in
/// [`Ranking::undefined`].
pub fn rank(matrix: &RatingMatrix, target: TargetCell, mode: Mode) -> Result<Ranking> {
    let axis = mode.comparison_axis();
    let target_index = mode.target_index(target);

    // Validates the target cell before any candidate is touched.
    matrix.get_cell(target)?;
    let target_vector = masked_target_vector(matrix, target, mode)?;

    let num_candidates = matrix.len_along(axis);
    let mut records: Vec<SimilarityRecord> = Vec::with_capacity(num_candidates.saturating_sub(1));
    let mut undefined = Vec::new();

    for candidate in (0..num_candidates).filter(|&candidate| candidate != target_index) {
        if matrix.get_cell(mode.neighbor_cell(target, candidate))? == UNRATED {
            continue;
        }

        let candidate_vector = matrix.vector(axis, candidate)?;
        match cosine_similarity(&target_vector, &candidate_vector) {
            Ok(similarity) => {
                debug!(candidate, similarity, "scored candidate");
                records.push(SimilarityRecord::new(candidate, similarity));
            }
            Err(CfError::UndefinedSimilarity(reason)) => {
                debug!(candidate, reason, "skipping candidate with undefined similarity");
                undefined.push(candidate);
            }
            Err(other) => return Err(other),
        }
    }

    let mut ranking = Ranking::from_records(records);
    ranking.undefined = undefined;

    debug!(cell = %target, %mode, eligible = ranking.len(), undefined = ranking.undefined.len(), "ranked candidates");

    Ok(ranking)
}
