//! Per-section threshold defaults/clamping and the adaptive-threshold
//! adjustment rule.

#[derive(Debug, Clone, Copy)]
pub struct ThresholdConfig {
    pub default: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ThresholdConfig {
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// `count` = pending articles in the section with `score >= current`.
/// Raises by `step` when count > 50, lowers by `step` when count < 5,
/// otherwise unchanged. Always clamped to `[min, max]`.
pub fn adjust(current: f64, count: i64, config: &ThresholdConfig) -> f64 {
    let next = if count > 50 {
        current + config.step
    } else if count < 5 {
        current - config.step
    } else {
        current
    };
    config.clamp(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ThresholdConfig {
        ThresholdConfig { default: 0.3, min: 0.15, max: 0.60, step: 0.05 }
    }

    #[test]
    fn s7_raises_when_above_50_pending() {
        assert_eq!(adjust(0.30, 80, &cfg()), 0.35);
    }

    #[test]
    fn s7_lowers_when_below_5_pending() {
        assert_eq!(adjust(0.30, 3, &cfg()), 0.25);
    }

    #[test]
    fn holds_steady_in_the_middle_band() {
        assert_eq!(adjust(0.30, 20, &cfg()), 0.30);
    }

    #[test]
    fn clamps_to_max() {
        assert_eq!(adjust(0.58, 100, &cfg()), 0.60);
    }

    #[test]
    fn clamps_to_min() {
        assert_eq!(adjust(0.17, 0, &cfg()), 0.15);
    }

    #[test]
    fn boundary_counts_are_inclusive_of_the_held_band() {
        assert_eq!(adjust(0.30, 50, &cfg()), 0.30);
        assert_eq!(adjust(0.30, 5, &cfg()), 0.30);
    }
}
