use chrono::{DateTime, Duration, Utc};

use crate::error::{AppError, AppResult};

/// Rush delivery halves the turnaround, rounded up, never below one day.
pub fn rush_days(days: i64) -> i64 {
    (days / 2 + days % 2).max(1)
}

pub fn effective_days(base_days: i64, rush: bool) -> i64 {
    let days = base_days.max(1);
    if rush { rush_days(days) } else { days }
}

pub fn estimate(base_days: i64, rush: bool, from: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
    Duration::try_days(effective_days(base_days, rush))
        .and_then(|turnaround| from.checked_add_signed(turnaround))
        .ok_or_else(|| AppError::BadRequest("Delivery time is out of range".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rush_halves_rounding_up() {
        assert_eq!(rush_days(7), 4);
        assert_eq!(rush_days(6), 3);
        assert_eq!(rush_days(1), 1);
        assert_eq!(rush_days(i64::MAX), i64::MAX / 2 + 1);
    }

    #[test]
    fn estimate_adds_days() {
        let now = Utc.with_ymd_and_hms(2025, 1, 30, 12, 0, 0).unwrap();
        assert_eq!(
            estimate(5, false, now).unwrap(),
            Utc.with_ymd_and_hms(2025, 2, 4, 12, 0, 0).unwrap()
        );
        assert_eq!(
            estimate(5, true, now).unwrap(),
            Utc.with_ymd_and_hms(2025, 2, 2, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn zero_days_counts_as_one() {
        assert_eq!(effective_days(0, false), 1);
    }

    #[test]
    fn out_of_range_turnaround_is_rejected() {
        let err = estimate(1_000_000_000, false, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(estimate(i64::MAX, true, Utc::now()).is_err());
    }
}
