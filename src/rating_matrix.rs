use std::borrow::Cow;
use std::fmt;

use crate::error::{CfError, Result};
use crate::types::{Axis, TargetCell};

/// Rating value reserved for "not rated".
pub const UNRATED: u32 = 0;

/// Largest number of cells a dense matrix may hold (1 GiB of ratings).
pub const MAX_CELLS: usize = 1 << 28;

/// Number of cells of a `num_rows` x `num_cols` matrix, rejecting shapes that
/// overflow or exceed [`MAX_CELLS`].
pub fn checked_len(num_rows: usize, num_cols: usize) -> Result<usize> {
    match num_rows.checked_mul(num_cols) {
        Some(len) if len <= MAX_CELLS => Ok(len),
        Some(len) => Err(CfError::InvalidMatrix(format!(
            "shape {num_rows}x{num_cols} has {len} cells, at most {MAX_CELLS} are supported"
        ))),
        None => Err(CfError::InvalidMatrix(format!("shape {num_rows}x{num_cols} overflows"))),
    }
}

/// Dense, immutable user-item rating matrix.
///
/// Ratings live in a single row-major buffer; every read resolves its
/// position through one bounds-checked offset computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingMatrix {
    num_rows: usize,
    num_cols: usize,
    ratings: Vec<u32>,
}

impl RatingMatrix {
    pub fn new(num_rows: usize, num_cols: usize, ratings: Vec<u32>) -> Result<Self> {
        let expected = checked_len(num_rows, num_cols)?;

        if ratings.len() != expected {
            return Err(CfError::InvalidMatrix(format!(
                "expected {expected} ratings for shape {num_rows}x{num_cols}, got {}",
                ratings.len()
            )));
        }

        Ok(Self { num_rows, num_cols, ratings })
    }

    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> Result<Self> {
        let num_rows = rows.len();
        let num_cols = rows.first().map(|row| row.as_ref().len()).unwrap_or(0);

        let mut ratings = Vec::with_capacity(num_rows * num_cols);
        for (row_index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != num_cols {
                return Err(CfError::InvalidMatrix(format!(
                    "row {row_index} has {} ratings, expected {num_cols}",
                    row.len()
                )));
            }
            ratings.extend_from_slice(row);
        }

        Self::new(num_rows, num_cols, ratings)
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows, self.num_cols)
    }

    /// Number of entries along `axis`.
    pub fn len_along(&self, axis: Axis) -> usize {
        match axis {
            Axis::Row => self.num_rows,
            Axis::Column => self.num_cols,
        }
    }

    fn check(&self, axis: Axis, index: usize) -> Result<()> {
        let len = self.len_along(axis);
        if index >= len {
            return Err(CfError::IndexOutOfBounds { axis, index, len });
        }
        Ok(())
    }

    fn offset(&self, row: usize, col: usize) -> Result<usize> {
        self.check(Axis::Row, row)?;
        self.check(Axis::Column, col)?;
        Ok(row * self.num_cols + col)
    }

    pub fn get(&self, row: usize, col: usize) -> Result<u32> {
        let offset = self.offset(row, col)?;
        Ok(self.ratings[offset])
    }

    pub fn get_cell(&self, cell: TargetCell) -> Result<u32> {
        self.get(cell.row, cell.col)
    }

    pub fn is_rated(&self, row: usize, col: usize) -> Result<bool> {
        Ok(self.get(row, col)? != UNRATED)
    }

    pub fn row(&self, row: usize) -> Result<&[u32]> {
        self.check(Axis::Row, row)?;
        let start = row * self.num_cols;
        Ok(&self.ratings[start..start + self.num_cols])
    }

    pub fn column(&self, col: usize) -> Result<Vec<u32>> {
        self.check(Axis::Column, col)?;
        Ok(self.ratings.iter().skip(col).step_by(self.num_cols).copied().collect())
    }

    /// Rating vector of the entity at `index` along `axis`.
    pub fn vector(&self, axis: Axis, index: usize) -> Result<Cow<'_, [u32]>> {
        match axis {
            Axis::Row => self.row(index).map(Cow::Borrowed),
            Axis::Column => self.column(index).map(Cow::Owned),
        }
    }

    /// Returns a new snapshot with a single cell replaced.
    pub fn with_rating(&self, row: usize, col: usize, rating: u32) -> Result<Self> {
        let offset = self.offset(row, col)?;
        let mut ratings = self.ratings.clone();
        ratings[offset] = rating;
        Ok(Self { num_rows: self.num_rows, num_cols: self.num_cols, ratings })
    }

    fn cells(&self) -> impl Iterator<Item = (TargetCell, u32)> + '_ {
        let num_cols = self.num_cols;
        self.ratings
            .iter()
            .enumerate()
            .map(move |(offset, &rating)| (TargetCell::new(offset / num_cols, offset % num_cols), rating))
    }

    pub fn rated_cells(&self) -> Vec<TargetCell> {
        self.cells()
            .filter(|&(_, rating)| rating != UNRATED)
            .map(|(cell, _)| cell)
            .collect()
    }

    pub fn unrated_cells(&self) -> Vec<TargetCell> {
        self.cells()
            .filter(|&(_, rating)| rating == UNRATED)
            .map(|(cell, _)| cell)
            .collect()
    }

    pub fn num_rated(&self) -> usize {
        self.ratings.iter().filter(|&&rating| rating != UNRATED).count()
    }
}

impl fmt::Display for RatingMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.num_cols == 0 {
            return Ok(());
        }
        for row in self.ratings.chunks(self.num_cols) {
            for rating in row {
                write!(f, "\t{rating}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> RatingMatrix {
        RatingMatrix::from_rows(&[[1u32, 0, 3], [0, 5, 6]]).unwrap()
    }

    #[test]
    fn test_accessors() {
        let matrix = small();

        assert_eq!(matrix.shape(), (2, 3));
        assert_eq!(matrix.get(1, 2).unwrap(), 6);
        assert_eq!(matrix.row(0).unwrap(), &[1, 0, 3]);
        assert_eq!(matrix.column(1).unwrap(), vec![0, 5]);
        assert_eq!(matrix.vector(Axis::Column, 2).unwrap().as_ref(), &[3, 6]);
        assert!(!matrix.is_rated(0, 1).unwrap());
        assert_eq!(matrix.num_rated(), 4);
    }

    #[test]
    fn test_out_of_bounds_access_is_rejected() {
        let matrix = small();

        assert!(matches!(
            matrix.get(2, 0),
            Err(CfError::IndexOutOfBounds { axis: Axis::Row, index: 2, len: 2 })
        ));
        assert!(matches!(
            matrix.get(0, 3),
            Err(CfError::IndexOutOfBounds { axis: Axis::Column, index: 3, len: 3 })
        ));
        assert!(matrix.row(5).is_err());
        assert!(matrix.column(3).is_err());
    }

    #[test]
    fn test_shape_is_validated() {
        assert!(matches!(RatingMatrix::new(2, 2, vec![1, 2, 3]), Err(CfError::InvalidMatrix(_))));
        assert!(matches!(
            RatingMatrix::from_rows(&[vec![1u32, 2], vec![3]]),
            Err(CfError::InvalidMatrix(_))
        ));
    }

    #[test]
    fn test_oversized_shapes_are_rejected() {
        assert_eq!(checked_len(3, 4).unwrap(), 12);
        assert!(matches!(checked_len(usize::MAX, 2), Err(CfError::InvalidMatrix(_))));
        assert!(matches!(checked_len(100_000, 100_000), Err(CfError::InvalidMatrix(_))));
        assert!(matches!(RatingMatrix::new(usize::MAX, 2, vec![]), Err(CfError::InvalidMatrix(_))));
    }

    #[test]
    fn test_with_rating_leaves_original_untouched() {
        let matrix = small();
        let updated = matrix.with_rating(0, 1, 4).unwrap();

        assert_eq!(matrix.get(0, 1).unwrap(), 0);
        assert_eq!(updated.get(0, 1).unwrap(), 4);
    }

    #[test]
    fn test_rated_and_unrated_cells() {
        let matrix = small();

        assert_eq!(matrix.unrated_cells(), vec![TargetCell::new(0, 1), TargetCell::new(1, 0)]);
        assert_eq!(matrix.rated_cells().len(), 4);
    }

    #[test]
    fn test_display_prints_grid() {
        assert_eq!(small().to_string(), "\t1\t0\t3\n\t0\t5\t6\n");
    }
}
