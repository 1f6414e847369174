//! Air-quality categorization.
//!
//! The API reports air quality as a continuous score. Accessory platforms
//! expect an ordinal category from 1 (excellent) to 5 (poor), so the raw
//! score is bucketed at read time; the cache keeps the raw score.
//!
//! # Example
//!
//! ```
//! use canary_core::AirQuality;
//!
//! let level = AirQuality::from_score(0.45);
//! assert_eq!(level, AirQuality::Fair);
//! assert_eq!(level.as_u8(), 3);
//! ```

use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of each bucket below `Poor`.
const EXCELLENT_MAX: f64 = 0.3;
const GOOD_MAX: f64 = 0.4;
const FAIR_MAX: f64 = 0.5;
const INFERIOR_MAX: f64 = 0.6;

/// Air-quality category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AirQuality {
    Excellent = 1,
    Good = 2,
    Fair = 3,
    Inferior = 4,
    Poor = 5,
}

impl AirQuality {
    /// Bucket a raw score. Boundary values fall into the lower bucket;
    /// anything above 0.6 (or NaN) is `Poor`.
    pub fn from_score(score: f64) -> Self {
        if score <= EXCELLENT_MAX {
            AirQuality::Excellent
        } else if score <= GOOD_MAX {
            AirQuality::Good
        } else if score <= FAIR_MAX {
            AirQuality::Fair
        } else if score <= INFERIOR_MAX {
            AirQuality::Inferior
        } else {
            AirQuality::Poor
        }
    }

    /// The ordinal value (1-5) reported to the accessory platform.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn description(&self) -> &'static str {
        match self {
            AirQuality::Excellent => "Excellent",
            AirQuality::Good => "Good",
            AirQuality::Fair => "Fair",
            AirQuality::Inferior => "Inferior",
            AirQuality::Poor => "Poor",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_midpoints() {
        assert_eq!(AirQuality::from_score(0.25).as_u8(), 1);
        assert_eq!(AirQuality::from_score(0.35).as_u8(), 2);
        assert_eq!(AirQuality::from_score(0.45).as_u8(), 3);
        assert_eq!(AirQuality::from_score(0.55).as_u8(), 4);
        assert_eq!(AirQuality::from_score(0.95).as_u8(), 5);
    }

    #[test]
    fn test_boundaries_fall_into_lower_bucket() {
        assert_eq!(AirQuality::from_score(0.3), AirQuality::Excellent);
        assert_eq!(AirQuality::from_score(0.4), AirQuality::Good);
        assert_eq!(AirQuality::from_score(0.5), AirQuality::Fair);
        assert_eq!(AirQuality::from_score(0.6), AirQuality::Inferior);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(AirQuality::from_score(0.0), AirQuality::Excellent);
        assert_eq!(AirQuality::from_score(-1.0), AirQuality::Excellent);
        assert_eq!(AirQuality::from_score(1.0), AirQuality::Poor);
        assert_eq!(AirQuality::from_score(f64::NAN), AirQuality::Poor);
    }

    #[test]
    fn test_description() {
        assert_eq!(AirQuality::Fair.description(), "Fair");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Higher scores never map to a better category.
        #[test]
        fn bucketing_is_monotonic(a in -1.0f64..2.0, b in -1.0f64..2.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(AirQuality::from_score(lo) <= AirQuality::from_score(hi));
        }

        /// Every score maps into 1..=5.
        #[test]
        fn bucket_in_range(score: f64) {
            let level = AirQuality::from_score(score).as_u8();
            prop_assert!((1..=5).contains(&level));
        }
    }
}
