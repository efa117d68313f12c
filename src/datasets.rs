//! Small embedded rating matrices, handy for demos and tests.

use crate::rating_matrix::RatingMatrix;

const USER_BASED_RATINGS: [[u32; 6]; 6] = [
    [4, 3, 0, 0, 5, 1],
    [5, 5, 4, 5, 4, 0],
    [4, 0, 5, 3, 4, 2],
    [0, 3, 3, 0, 4, 5],
    [4, 4, 0, 0, 0, 4],
    [1, 0, 2, 4, 2, 5],
];

const ITEM_BASED_RATINGS: [[u32; 5]; 5] = [
    [0, 4, 5, 2, 5],
    [0, 2, 4, 4, 3],
    [5, 3, 2, 0, 5],
    [2, 4, 0, 1, 1],
    [3, 0, 3, 4, 0],
];

fn from_const<const M: usize>(rows: &[[u32; M]]) -> RatingMatrix {
    let ratings: Vec<u32> = rows.iter().flatten().copied().collect();
    match RatingMatrix::new(rows.len(), M, ratings) {
        Ok(matrix) => matrix,
        Err(_) => unreachable!("embedded matrices are rectangular"),
    }
}

/// 6 users × 6 items. The classic question is how user 0 would rate item 3.
pub fn user_based_example() -> RatingMatrix {
    from_const(&USER_BASED_RATINGS)
}

/// 5 users × 5 items. The classic question is how user 2 would rate item 3.
pub fn item_based_example() -> RatingMatrix {
    from_const(&ITEM_BASED_RATINGS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        assert_eq!(user_based_example().shape(), (6, 6));
        assert_eq!(item_based_example().shape(), (5, 5));
        assert_eq!(user_based_example().get(5, 3).unwrap(), 4);
        assert_eq!(item_based_example().get(2, 3).unwrap(), 0);
    }
}
