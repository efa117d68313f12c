//! Leave-one-out accuracy of the predictor on the known ratings of a matrix.

use std::fmt;

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::PredictionConfig;
use crate::engine::run;
use crate::error::{CfError, Result};
use crate::rating_matrix::{RatingMatrix, UNRATED};
use crate::types::{Mode, TargetCell};

/// Running sums of squared and absolute prediction errors.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ErrorAccumulator {
    count: usize,
    sum_of_squares: f64,
    sum_of_absolutes: f64,
}

impl ErrorAccumulator {
    pub fn add(&mut self, actual: f64, predicted: f64) {
        let delta = actual - predicted;
        self.sum_of_squares += delta * delta;
        self.sum_of_absolutes += delta.abs();
        self.count += 1;
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.count += other.count;
        self.sum_of_squares += other.sum_of_squares;
        self.sum_of_absolutes += other.sum_of_absolutes;
        self
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn rmse(&self) -> Option<f64> {
        (self.count > 0).then(|| (self.sum_of_squares / self.count as f64).sqrt())
    }

    pub fn mae(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum_of_absolutes / self.count as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub mode: Mode,
    pub k: usize,
    pub evaluated: usize,
    pub skipped: usize,
    pub rmse: Option<f64>,
    pub mae: Option<f64>,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Leave-one-out evaluation ({}, k = {})", self.mode, self.k)?;
        writeln!(f, "  evaluated: {}", self.evaluated)?;
        writeln!(f, "  skipped:   {}", self.skipped)?;
        match (self.rmse, self.mae) {
            (Some(rmse), Some(mae)) => write!(f, "  rmse: {rmse:.4}\n  mae:  {mae:.4}"),
            _ => write!(f, "  no rating could be predicted"),
        }
    }
}

fn hide_and_predict(matrix: &RatingMatrix, cell: TargetCell, k: usize, mode: Mode) -> Option<(f64, f64)> {
    let actual = matrix.get_cell(cell).ok()?;
    let snapshot = matrix.with_rating(cell.row, cell.col, UNRATED).ok()?;
    let config = PredictionConfig::new(cell).with_k(k).with_mode(mode);
    let prediction = run(&snapshot, &config).ok()?;
    Some((actual as f64, prediction.predicted_rating))
}

/// Hides each known rating in turn and predicts it from the remaining ones.
///
/// Cells that cannot be predicted (too few neighbours, undefined
/// similarities) are counted as skipped.
pub fn leave_one_out(matrix: &RatingMatrix, k: usize, mode: Mode) -> Result<EvaluationReport> {
    if k == 0 {
        return Err(CfError::InvalidNeighborCount(k));
    }

    let cells = matrix.rated_cells();
    let total = cells.len();

    let errors = cells
        .into_par_iter()
        .filter_map(|cell| hide_and_predict(matrix, cell, k, mode))
        .fold(ErrorAccumulator::default, |mut errors, (actual, predicted)| {
            errors.add(actual, predicted);
            errors
        })
        .reduce(ErrorAccumulator::default, ErrorAccumulator::merge);

    let report = EvaluationReport {
        mode,
        k,
        evaluated: errors.count(),
        skipped: total - errors.count(),
        rmse: errors.rmse(),
        mae: errors.mae(),
    };

    info!(evaluated = report.evaluated, skipped = report.skipped, rmse = ?report.rmse, "evaluation finished");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{item_based_example, user_based_example};

    #[test]
    fn test_accumulator() {
        let mut errors = ErrorAccumulator::default();
        assert_eq!(errors.rmse(), None);

        errors.add(4.0, 3.0);
        errors.add(2.0, 5.0);

        assert_eq!(errors.count(), 2);
        assert!((errors.rmse().unwrap() - 5f64.sqrt()).abs() < 1e-12);
        assert!((errors.mae().unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_merge() {
        let mut left = ErrorAccumulator::default();
        left.add(1.0, 2.0);
        let mut right = ErrorAccumulator::default();
        right.add(3.0, 1.0);

        let mut both = ErrorAccumulator::default();
        both.add(1.0, 2.0);
        both.add(3.0, 1.0);

        assert_eq!(left.merge(right), both);
    }

    #[test]
    fn test_leave_one_out_accounts_for_every_rating() {
        for (matrix, mode) in [
            (user_based_example(), Mode::UserBased),
            (item_based_example(), Mode::ItemBased),
        ] {
            let report = leave_one_out(&matrix, 2, mode).unwrap();

            assert_eq!(report.evaluated + report.skipped, matrix.num_rated());
            assert!(report.evaluated > 0);
            let rmse = report.rmse.unwrap();
            assert!(rmse.is_finite() && rmse >= 0.0 && rmse <= 4.0);
            assert!(report.mae.unwrap() <= rmse + 1e-12);
        }
    }

    #[test]
    fn test_leave_one_out_with_nothing_to_predict() {
        let matrix = RatingMatrix::from_rows(&[[5u32, 0], [0, 3]]).unwrap();
        let report = leave_one_out(&matrix, 1, Mode::UserBased).unwrap();

        assert_eq!(report.evaluated, 0);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.rmse, None);
        assert!(report.to_string().contains("no rating could be predicted"));
    }
}
