//! Readers that turn text input into a [`RatingMatrix`].
//!
//! Two layouts are understood: a dense grid with one user per line, and
//! sparse `row,col,rating` triplets which are assembled through a
//! [`sprs::TriMat`] before being expanded into the dense matrix.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use sprs::{CsMat, TriMat};
use tracing::{info, warn};

use crate::error::{CfError, Result};
use crate::rating_matrix::{checked_len, RatingMatrix, UNRATED};

fn content_lines(input: &str) -> impl Iterator<Item = (usize, &str)> {
    input
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn parse_field<T: std::str::FromStr>(line: usize, field: &str, what: &str) -> Result<T> {
    field.trim().parse::<T>().map_err(|_| CfError::Parse {
        line,
        message: format!("invalid {what} '{}'", field.trim()),
    })
}

/// Parses a dense grid: one row per line, ratings separated by whitespace or
/// commas. Blank lines and lines starting with `#` are ignored.
pub fn parse_dense(input: &str) -> Result<RatingMatrix> {
    let mut rows: Vec<Vec<u32>> = Vec::new();

    for (line, content) in content_lines(input) {
        let row = content
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|field| !field.is_empty())
            .map(|field| parse_field::<u32>(line, field, "rating"))
            .collect::<Result<Vec<u32>>>()?;

        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                return Err(CfError::Parse {
                    line,
                    message: format!("expected {} ratings, found {}", first.len(), row.len()),
                });
            }
        }
        rows.push(row);
    }

    RatingMatrix::from_rows(&rows)
}

/// Parses `row,col,rating` triplets. Without an explicit `shape`, the matrix
/// is sized to the largest indices seen.
pub fn parse_triplets(input: &str, shape: Option<(usize, usize)>) -> Result<RatingMatrix> {
    let mut triplets: Vec<(usize, usize, u32)> = Vec::new();
    let mut seen: HashSet<(usize, usize)> = HashSet::new();

    for (line, content) in content_lines(input) {
        let fields: Vec<&str> = content.split(',').collect();
        if fields.len() != 3 {
            return Err(CfError::Parse {
                line,
                message: format!("expected row,col,rating but found {} fields", fields.len()),
            });
        }

        let row = parse_field::<usize>(line, fields[0], "row")?;
        let col = parse_field::<usize>(line, fields[1], "column")?;
        let rating = parse_field::<u32>(line, fields[2], "rating")?;

        if rating == UNRATED {
            warn!(line, row, col, "skipping zero rating, zero marks an unrated cell");
            continue;
        }
        if !seen.insert((row, col)) {
            return Err(CfError::DuplicateRating { row, col });
        }
        triplets.push((row, col, rating));
    }

    let (num_rows, num_cols) = match shape {
        Some(shape) => shape,
        None => infer_shape(&triplets)?,
    };

    from_triplets(num_rows, num_cols, &triplets)
}

/// Smallest shape holding every triplet.
fn infer_shape(triplets: &[(usize, usize, u32)]) -> Result<(usize, usize)> {
    triplets.iter().try_fold((0, 0), |(rows, cols), &(row, col, _)| {
        match (row.checked_add(1), col.checked_add(1)) {
            (Some(row_end), Some(col_end)) => Ok((rows.max(row_end), cols.max(col_end))),
            _ => Err(CfError::InvalidMatrix(format!("triplet index ({row}, {col}) is too large"))),
        }
    })
}

/// Assembles a dense matrix from `(row, col, rating)` triplets.
pub fn from_triplets(
    num_rows: usize,
    num_cols: usize,
    triplets: &[(usize, usize, u32)],
) -> Result<RatingMatrix> {
    let len = checked_len(num_rows, num_cols)?;

    let mut input = TriMat::new((num_rows, num_cols));
    for &(row, col, rating) in triplets {
        if row >= num_rows || col >= num_cols {
            return Err(CfError::InvalidMatrix(format!(
                "triplet ({row}, {col}) lies outside a {num_rows}x{num_cols} matrix"
            )));
        }
        input.add_triplet(row, col, rating);
    }

    let representations: CsMat<u32> = input.to_csr();

    let mut ratings = vec![UNRATED; len];
    for (&rating, (row, col)) in representations.iter() {
        ratings[row * num_cols + col] = rating;
    }

    RatingMatrix::new(num_rows, num_cols, ratings)
}

/// Loads a matrix from disk. Files with a `.csv` extension are read as
/// triplets, everything else as a dense grid.
pub fn load_path(path: &Path, shape: Option<(usize, usize)>) -> Result<RatingMatrix> {
    let input = fs::read_to_string(path)?;

    let is_triplets = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let matrix = if is_triplets {
        parse_triplets(&input, shape)?
    } else {
        parse_dense(&input)?
    };

    info!(path = %path.display(), rows = matrix.num_rows(), cols = matrix.num_cols(), rated = matrix.num_rated(), "loaded rating matrix");

    Ok(matrix)
}
