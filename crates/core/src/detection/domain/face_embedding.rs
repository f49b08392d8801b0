use std::sync::Arc;

use crate::shared::bounding_box::BoundingBox;

/// Fixed-length identity vector for one face.
///
/// Immutable after construction; clones share the same buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceEmbedding {
    values: Arc<[f32]>,
}

impl FaceEmbedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Euclidean distance. Embeddings of different length never match,
    /// so their distance is infinite.
    pub fn distance(&self, other: &FaceEmbedding) -> f64 {
        if self.len() != other.len() {
            return f64::INFINITY;
        }
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| {
                let d = *a as f64 - *b as f64;
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Whether `other` lies within `tolerance` (inclusive) of this embedding.
    pub fn matches(&self, other: &FaceEmbedding, tolerance: f64) -> bool {
        self.distance(other) <= tolerance
    }
}

impl From<Vec<f32>> for FaceEmbedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

/// One face found in a frame during a single recognition cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    pub bounding_box: BoundingBox,
    pub embedding: FaceEmbedding,
}

impl DetectedFace {
    pub fn new(bounding_box: BoundingBox, embedding: FaceEmbedding) -> Self {
        Self {
            bounding_box,
            embedding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::DEFAULT_TOLERANCE;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_distance_to_self_is_zero() {
        let e = FaceEmbedding::new(vec![0.1, -0.4, 0.9]);
        assert_relative_eq!(e.distance(&e), 0.0);
    }

    #[test]
    fn test_distance_is_euclidean() {
        let a = FaceEmbedding::new(vec![0.0, 0.0]);
        let b = FaceEmbedding::new(vec![3.0, 4.0]);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_relative_eq!(b.distance(&a), 5.0);
    }

    #[test]
    fn test_length_mismatch_is_infinitely_far() {
        let a = FaceEmbedding::new(vec![0.0, 0.0]);
        let b = FaceEmbedding::new(vec![0.0, 0.0, 0.0]);
        assert!(a.distance(&b).is_infinite());
        assert!(!a.matches(&b, f64::MAX));
    }

    #[rstest]
    #[case::well_inside(0.3, true)]
    #[case::on_boundary(0.5, true)]
    #[case::outside(0.7, false)]
    fn test_matches_against_tolerance(#[case] offset: f32, #[case] expected: bool) {
        let a = FaceEmbedding::new(vec![0.0, 1.0]);
        let b = FaceEmbedding::new(vec![offset, 1.0]);
        assert_eq!(a.matches(&b, 0.5), expected);
    }

    /// Unit vectors at the given cosine similarity.
    fn unit_pair(cosine: f32) -> (FaceEmbedding, FaceEmbedding) {
        let a = FaceEmbedding::new(vec![1.0, 0.0]);
        let b = FaceEmbedding::new(vec![cosine, (1.0 - cosine * cosine).sqrt()]);
        (a, b)
    }

    #[rstest]
    #[case::close_default(0.9, DEFAULT_TOLERANCE, true)]
    #[case::typical_same_person_default(0.6, DEFAULT_TOLERANCE, false)]
    #[case::typical_same_person_tuned(0.6, 1.1, true)]
    #[case::stranger_tuned(0.1, 1.1, false)]
    fn test_tolerance_on_unit_embeddings(
        #[case] cosine: f32,
        #[case] tolerance: f64,
        #[case] expected: bool,
    ) {
        let (a, b) = unit_pair(cosine);
        assert_relative_eq!(
            a.distance(&b),
            (2.0 - 2.0 * cosine as f64).sqrt(),
            epsilon = 1e-5
        );
        assert_eq!(a.matches(&b, tolerance), expected);
    }

    #[test]
    fn test_clone_shares_values() {
        let a = FaceEmbedding::from(vec![1.0, 2.0]);
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.len(), 2);
        assert!(!b.is_empty());
    }
}
