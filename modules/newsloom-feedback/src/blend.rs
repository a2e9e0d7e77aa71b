//! Pure profile-blending rules.

use newsloom_common::ema_blend;

/// Recency weight for the EMA blend.
pub const DEFAULT_RECENCY_WEIGHT: f32 = 0.7;

/// Positive profile: seed centroid if there are no likes yet, otherwise
/// the recent positive centroid EMA-blended into whatever historical
/// vector already existed (absent/mismatched historical vectors are
/// handled by `ema_blend` itself, which prefers `recent` outright).
pub fn blend_positive(recent: &[f32], historical: Option<&[f32]>, seed_centroid: &[f32], w: f32) -> Vec<f32> {
    if recent.is_empty() {
        return seed_centroid.to_vec();
    }
    ema_blend(recent, historical.unwrap_or(&[]), w)
}

/// Negative profile: unchanged (possibly absent) if there are no
/// dislikes; otherwise blended the same way as positive.
pub fn blend_negative(recent: &[f32], historical: Option<&[f32]>, w: f32) -> Option<Vec<f32>> {
    if recent.is_empty() {
        return historical.map(|v| v.to_vec());
    }
    Some(ema_blend(recent, historical.unwrap_or(&[]), w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_likes_falls_back_to_seed_centroid() {
        let seed = vec![1.0, 2.0];
        assert_eq!(blend_positive(&[], Some(&[9.0, 9.0]), &seed, DEFAULT_RECENCY_WEIGHT), seed);
    }

    #[test]
    fn likes_blend_with_historical() {
        let recent = vec![1.0, 1.0];
        let historical = vec![0.0, 0.0];
        let blended = blend_positive(&recent, Some(&historical), &[], DEFAULT_RECENCY_WEIGHT);
        assert!((blended[0] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn likes_with_no_historical_yields_recent_outright() {
        let recent = vec![3.0, 4.0];
        assert_eq!(blend_positive(&recent, None, &[], DEFAULT_RECENCY_WEIGHT), recent);
    }

    #[test]
    fn no_dislikes_keeps_existing_negative() {
        let historical = vec![5.0, 6.0];
        assert_eq!(blend_negative(&[], Some(&historical), DEFAULT_RECENCY_WEIGHT), Some(historical));
    }

    #[test]
    fn no_dislikes_and_no_existing_stays_absent() {
        assert_eq!(blend_negative(&[], None, DEFAULT_RECENCY_WEIGHT), None);
    }

    #[test]
    fn dislikes_with_no_existing_uses_recent_outright() {
        let recent = vec![2.0, 2.0];
        assert_eq!(blend_negative(&recent, None, DEFAULT_RECENCY_WEIGHT), Some(recent));
    }

    #[test]
    fn dislikes_blend_with_existing() {
        let recent = vec![1.0, 1.0];
        let historical = vec![0.0, 0.0];
        let blended = blend_negative(&recent, Some(&historical), DEFAULT_RECENCY_WEIGHT).unwrap();
        assert!((blended[0] - 0.7).abs() < 1e-6);
    }
}
