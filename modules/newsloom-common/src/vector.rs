//! Pure vector operations shared by relevance scoring, feedback profiling,
//! and clustering: cosine similarity, centroid mean, and EMA blending.
//!
//! A single dimension-mismatch policy applies everywhere a multi-vector
//! function (`mean_vector`) is involved: mismatched vectors are skipped
//! rather than causing an error. `ema_blend` instead prefers the non-empty
//! side outright when dimensions differ, and `cosine_similarity` returns 0
//! for any size/zero-norm disagreement.

/// Cosine similarity between two vectors. Returns 0.0 if either vector is
/// empty, if they differ in length, or if either has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f64
}

/// Mean of a set of vectors of identical dimension. Vectors whose length
/// differs from the first non-empty vector encountered are skipped. Returns
/// an empty vector if there's nothing to average.
pub fn mean_vector<'a, I>(vectors: I) -> Vec<f32>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut sum: Vec<f32> = Vec::new();
    let mut count = 0u32;

    for v in vectors {
        if v.is_empty() {
            continue;
        }
        if sum.is_empty() {
            sum = vec![0.0; v.len()];
        } else if v.len() != sum.len() {
            continue;
        }
        for (s, x) in sum.iter_mut().zip(v.iter()) {
            *s += x;
        }
        count += 1;
    }

    if count == 0 {
        return Vec::new();
    }
    sum.iter().map(|s| s / count as f32).collect()
}

/// Exponential-moving-average blend of a `recent` vector into a `historical`
/// one: `w * recent + (1 - w) * historical`. If the dimensions disagree, the
/// recent vector wins outright. Blending a zero-length vector with a
/// non-empty one yields the non-empty one, on either side.
pub fn ema_blend(recent: &[f32], historical: &[f32], w: f32) -> Vec<f32> {
    if recent.is_empty() {
        return historical.to_vec();
    }
    if historical.is_empty() {
        return recent.to_vec();
    }
    if recent.len() != historical.len() {
        return recent.to_vec();
    }
    recent
        .iter()
        .zip(historical.iter())
        .map(|(r, h)| w * r + (1.0 - w) * h)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn cosine_opposite_is_negative_one() {
        let sim = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_empty_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[]), 0.0);
    }

    #[test]
    fn cosine_dimension_mismatch_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn cosine_zero_norm_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn mean_vector_averages_matching_dims() {
        let a = vec![1.0, 1.0];
        let b = vec![3.0, 3.0];
        let mean = mean_vector(vec![a.as_slice(), b.as_slice()]);
        assert_eq!(mean, vec![2.0, 2.0]);
    }

    #[test]
    fn mean_vector_skips_mismatched_dims() {
        let a = vec![1.0, 1.0];
        let b = vec![9.0, 9.0, 9.0]; // mismatched, skipped
        let c = vec![3.0, 3.0];
        let mean = mean_vector(vec![a.as_slice(), b.as_slice(), c.as_slice()]);
        assert_eq!(mean, vec![2.0, 2.0]);
    }

    #[test]
    fn mean_vector_empty_input_is_empty() {
        let mean: Vec<f32> = mean_vector(Vec::<&[f32]>::new());
        assert!(mean.is_empty());
    }

    #[test]
    fn mean_vector_skips_empty_vectors() {
        let a: Vec<f32> = vec![];
        let b = vec![4.0, 2.0];
        let mean = mean_vector(vec![a.as_slice(), b.as_slice()]);
        assert_eq!(mean, vec![4.0, 2.0]);
    }

    #[test]
    fn ema_blend_weights_recent_by_w() {
        let recent = vec![1.0, 1.0];
        let historical = vec![0.0, 0.0];
        let blended = ema_blend(&recent, &historical, 0.7);
        assert!((blended[0] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn ema_blend_empty_recent_yields_historical() {
        let historical = vec![5.0, 6.0];
        assert_eq!(ema_blend(&[], &historical, 0.7), historical);
    }

    #[test]
    fn ema_blend_empty_historical_yields_recent() {
        let recent = vec![5.0, 6.0];
        assert_eq!(ema_blend(&recent, &[], 0.7), recent);
    }

    #[test]
    fn ema_blend_dimension_mismatch_prefers_recent() {
        let recent = vec![1.0, 1.0];
        let historical = vec![9.0, 9.0, 9.0];
        assert_eq!(ema_blend(&recent, &historical, 0.7), recent);
    }

    #[test]
    fn ema_blend_both_empty_is_empty() {
        let blended: Vec<f32> = ema_blend(&[], &[], 0.7);
        assert!(blended.is_empty());
    }
}
