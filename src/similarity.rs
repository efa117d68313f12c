use crate::error::{CfError, Result};
use crate::rating_matrix::UNRATED;

/// Euclidean norm over the rated (non-zero) entries of a rating vector.
pub fn l2norm(ratings: &[u32]) -> f64 {
    let mut sum_of_squares: f64 = 0.0;
    for &rating in ratings.iter().filter(|&&rating| rating != UNRATED) {
        let value = rating as f64;
        sum_of_squares += value * value;
    }
    sum_of_squares.sqrt()
}

/// Cosine similarity of two rating vectors.
///
/// The dot product only runs over co-rated positions (both entries non-zero),
/// while each norm covers every rated position of its own vector. Pairs with
/// an empty norm or without a single co-rated position have no meaningful
/// similarity and yield [`CfError::UndefinedSimilarity`].
pub fn cosine_similarity(a: &[u32], b: &[u32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(CfError::DimensionMismatch { left: a.len(), right: b.len() });
    }

    let mut dot: f64 = 0.0;
    let mut co_rated = 0usize;
    for (&x, &y) in a.iter().zip(b.iter()) {
        if x != UNRATED && y != UNRATED {
            dot += x as f64 * y as f64;
            co_rated += 1;
        }
    }

    let denominator = l2norm(a) * l2norm(b);
    if denominator == 0.0 {
        return Err(CfError::UndefinedSimilarity("one of the vectors has no ratings"));
    }
    if co_rated == 0 {
        return Err(CfError::UndefinedSimilarity("the vectors share no co-rated position"));
    }

    Ok(dot / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_norm_ignores_unrated() {
        assert!((l2norm(&[3, 0, 4]) - 5.0).abs() < 1e-12);
        assert_eq!(l2norm(&[0, 0]), 0.0);
    }

    #[test]
    fn test_denominator_spans_all_rated_positions() {
        // co-rated: position 0 only -> 4 * 5 = 20
        // norms: sqrt(16 + 9) = 5, sqrt(25 + 16) = sqrt(41)
        let similarity = cosine_similarity(&[4, 3, 0], &[5, 0, 4]).unwrap();
        assert!((similarity - 20.0 / (5.0 * 41f64.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn test_known_pair_from_user_matrix() {
        let u1 = [4, 3, 0, 0, 5, 1];
        let u2 = [5, 5, 4, 5, 4, 0];
        let similarity = cosine_similarity(&u1, &u2).unwrap();
        assert!((similarity - 0.7445360186625927).abs() < 1e-9);
    }

    #[test]
    fn test_empty_vector_is_undefined() {
        assert!(matches!(
            cosine_similarity(&[0, 0, 0], &[1, 2, 3]),
            Err(CfError::UndefinedSimilarity(_))
        ));
    }

    #[test]
    fn test_disjoint_vectors_are_undefined() {
        assert!(matches!(
            cosine_similarity(&[1, 0, 0], &[0, 2, 3]),
            Err(CfError::UndefinedSimilarity(_))
        ));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            cosine_similarity(&[1, 2], &[1, 2, 3]),
            Err(CfError::DimensionMismatch { left: 2, right: 3 })
        ));
    }

    fn ratings(len: usize) -> impl Strategy<Value = Vec<u32>> {
        prop::collection::vec(0u32..=5, len)
    }

    proptest! {
        #[test]
        fn similarity_is_symmetric((a, b) in (1usize..12).prop_flat_map(|len| (ratings(len), ratings(len)))) {
            match (cosine_similarity(&a, &b), cosine_similarity(&b, &a)) {
                (Ok(ab), Ok(ba)) => prop_assert_eq!(ab, ba),
                (Err(_), Err(_)) => {}
                (left, right) => prop_assert!(false, "asymmetric outcome: {:?} vs {:?}", left, right),
            }
        }

        #[test]
        fn self_similarity_saturates(a in (1usize..12).prop_flat_map(ratings)) {
            prop_assume!(a.iter().any(|&rating| rating != 0));
            let similarity = cosine_similarity(&a, &a).unwrap();
            prop_assert!((similarity - 1.0).abs() < 1e-9);
        }

        #[test]
        fn similarity_is_finite_and_bounded(
            (a, b) in (1usize..12).prop_flat_map(|len| (ratings(len), ratings(len)))
        ) {
            if let Ok(similarity) = cosine_similarity(&a, &b) {
                prop_assert!(similarity.is_finite());
                prop_assert!(similarity > 0.0 && similarity <= 1.0 + 1e-9);
            }
        }
    }
}
