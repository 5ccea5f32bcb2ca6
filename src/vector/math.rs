//! Vector arithmetic shared by clustering, gap detection and search.
//!
//! Everything here works on plain `&[f32]` slices and never fails: callers
//! may feed heterogeneous data, so degenerate inputs map to neutral values
//! instead of errors.

/// Epsilon for floating-point comparisons.
const EPSILON: f32 = 1e-10;

/// Computes cosine similarity between two vectors.
///
/// Returns 0.0 when the dimensions differ or either vector has zero norm.
/// The result is not clamped; arbitrary embeddings can score below zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

/// Arithmetic mean of a set of vectors.
///
/// Returns `None` for an empty set or when the vectors do not share a
/// dimension.
pub fn centroid<'a, I>(vectors: I) -> Option<Vec<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut iter = vectors.into_iter();
    let first = iter.next()?;
    let mut sum = first.to_vec();
    let mut count = 1usize;

    for vector in iter {
        if vector.len() != sum.len() {
            return None;
        }
        for (acc, &value) in sum.iter_mut().zip(vector) {
            *acc += value;
        }
        count += 1;
    }

    let count = count as f32;
    for value in sum.iter_mut() {
        *value /= count;
    }
    Some(sum)
}

/// Mean cosine similarity over all unordered pairs.
///
/// Returns 0.0 when fewer than two vectors are given.
pub fn mean_pairwise_similarity(vectors: &[&[f32]]) -> f32 {
    let n = vectors.len();
    if n < 2 {
        return 0.0;
    }

    let mut total = 0.0f32;
    for i in 0..n {
        for j in (i + 1)..n {
            total += cosine_similarity(vectors[i], vectors[j]);
        }
    }
    let pairs = (n * (n - 1) / 2) as f32;
    total / pairs
}

/// Normalizes a vector in-place to unit length.
///
/// Vectors with a norm below epsilon are left as-is.
pub fn normalize_vector(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > EPSILON {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        // Identical vectors
        let a = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);

        // Orthogonal vectors
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < f32::EPSILON);

        // Opposite vectors stay negative
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        let a = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_is_symmetric() {
        let pairs = [
            (vec![0.3, -1.2, 4.0], vec![2.0, 0.5, -0.7]),
            (vec![1.0, 1.0, 1.0], vec![0.1, 0.2, 0.3]),
            (vec![-5.0, 0.0, 2.5], vec![-4.0, 1.0, 2.0]),
        ];
        for (a, b) in &pairs {
            assert_eq!(cosine_similarity(a, b), cosine_similarity(b, a));
        }
    }

    #[test]
    fn test_centroid() {
        let a = [1.0, 0.0, 2.0];
        let b = [3.0, 2.0, 0.0];
        let c = centroid([a.as_slice(), b.as_slice()]).unwrap();
        assert_eq!(c, vec![2.0, 1.0, 1.0]);

        assert!(centroid(std::iter::empty::<&[f32]>()).is_none());
        assert!(centroid([a.as_slice(), [1.0].as_slice()]).is_none());
    }

    #[test]
    fn test_mean_pairwise_similarity() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        let c = [1.0, 0.0];
        // pairs: (a,b)=0, (a,c)=1, (b,c)=0
        let mean = mean_pairwise_similarity(&[a.as_slice(), b.as_slice(), c.as_slice()]);
        assert!((mean - 1.0 / 3.0).abs() < 1e-6);

        assert_eq!(mean_pairwise_similarity(&[a.as_slice()]), 0.0);
    }

    #[test]
    fn test_normalize_vector() {
        let mut vector = vec![3.0, 4.0];
        normalize_vector(&mut vector);

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < f32::EPSILON);
        assert!((vector[0] - 0.6).abs() < f32::EPSILON);
        assert!((vector[1] - 0.8).abs() < f32::EPSILON);
    }
}
