//! Human-readable sequential numbers such as `SGD20250001`.
//!
//! The sequence itself lives in the `number_sequences` table and is reserved
//! with one atomic upsert per number (see `services::sequence_service`).

pub const ORDER_PREFIX: &str = "SGD";

pub fn format_number(prefix: &str, year: i32, seq: i64) -> String {
    format!("{prefix}{year}{seq:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_four_digits() {
        assert_eq!(format_number(ORDER_PREFIX, 2025, 1), "SGD20250001");
        assert_eq!(format_number(ORDER_PREFIX, 2025, 123), "SGD20250123");
    }

    #[test]
    fn widens_past_four_digits() {
        assert_eq!(format_number(ORDER_PREFIX, 2025, 12345), "SGD202512345");
    }

    #[test]
    fn year_is_part_of_the_number() {
        assert_ne!(
            format_number(ORDER_PREFIX, 2025, 1),
            format_number(ORDER_PREFIX, 2026, 1)
        );
        assert_eq!(format_number("LOGO", 2026, 7), "LOGO20260007");
    }
}
