use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i32,
}

impl RatingSummary {
    /// Summary over `count` approved ratings adding up to `sum`.
    pub fn from_totals(sum: i64, count: i64) -> Self {
        if count <= 0 {
            return Self {
                average: 0.0,
                count: 0,
            };
        }
        Self {
            average: round_one_decimal(sum as f64 / count as f64),
            count: count as i32,
        }
    }
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_five_star_review() {
        assert_eq!(
            RatingSummary::from_totals(5, 1),
            RatingSummary {
                average: 5.0,
                count: 1
            }
        );
    }

    #[test]
    fn mean_is_rounded_to_one_decimal() {
        // 5 + 4 + 4 = 13 / 3 = 4.333..
        assert_eq!(RatingSummary::from_totals(13, 3).average, 4.3);
        // 4 + 5 = 4.5 stays
        assert_eq!(RatingSummary::from_totals(9, 2).average, 4.5);
        // 5 + 5 + 4 = 4.666..
        assert_eq!(RatingSummary::from_totals(14, 3).average, 4.7);
    }

    #[test]
    fn no_reviews_is_zero() {
        let empty = RatingSummary::from_totals(0, 0);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.average, 0.0);
    }
}
