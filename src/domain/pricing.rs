//! Order pricing snapshot. Amounts are integer minor units (cents).

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

pub const TAX_RATE_PERCENT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Pricing {
    pub subtotal: i64,
    pub tax: i64,
    pub discount: i64,
    pub total: i64,
}

fn too_large() -> AppError {
    AppError::BadRequest("Order total is too large".into())
}

/// Tax rounded half-up to the minor unit.
pub fn tax_for(subtotal: i64) -> AppResult<i64> {
    subtotal
        .checked_mul(TAX_RATE_PERCENT)
        .and_then(|scaled| scaled.checked_add(50))
        .map(|scaled| scaled.div_euclid(100))
        .ok_or_else(too_large)
}

/// Price `(unit_price, quantity)` lines. Discount is never populated.
pub fn price_lines(lines: &[(i64, i32)]) -> AppResult<Pricing> {
    if lines.is_empty() {
        return Err(AppError::BadRequest("Order has no items".into()));
    }

    let mut subtotal: i64 = 0;
    for &(unit_price, quantity) in lines {
        if quantity <= 0 {
            return Err(AppError::BadRequest("quantity must be greater than 0".into()));
        }
        let line = unit_price
            .checked_mul(quantity as i64)
            .and_then(|line| subtotal.checked_add(line))
            .ok_or_else(too_large)?;
        subtotal = line;
    }

    let tax = tax_for(subtotal)?;
    let discount = 0;
    let total = subtotal
        .checked_add(tax)
        .and_then(|gross| gross.checked_sub(discount))
        .ok_or_else(too_large)?;
    Ok(Pricing {
        subtotal,
        tax,
        discount,
        total,
    })
}

/// Custom request total: package plus rush surcharge plus kind-specific extras.
pub fn request_total(package_price: i64, rush_cost: i64, extras_cost: i64) -> i64 {
    package_price + rush_cost + extras_cost
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_lines_of_100_and_200() {
        let pricing = price_lines(&[(10_000, 1), (20_000, 1)]).unwrap();
        assert_eq!(
            pricing,
            Pricing {
                subtotal: 30_000,
                tax: 3_000,
                discount: 0,
                total: 33_000,
            }
        );
    }

    #[test]
    fn total_is_subtotal_plus_ten_percent() {
        for lines in [vec![(1_999, 3)], vec![(5, 1)], vec![(250, 4), (1, 1)]] {
            let p = price_lines(&lines).unwrap();
            assert_eq!(p.total, p.subtotal + tax_for(p.subtotal).unwrap());
            assert!((p.total as f64 - p.subtotal as f64 * 1.1).abs() <= 0.5);
        }
    }

    #[test]
    fn tax_rounds_half_up() {
        assert_eq!(tax_for(5).unwrap(), 1);
        assert_eq!(tax_for(4).unwrap(), 0);
        assert_eq!(tax_for(0).unwrap(), 0);
    }

    #[test]
    fn oversized_totals_are_rejected() {
        let err = price_lines(&[(i64::MAX / 5, 1)]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(price_lines(&[(i64::MAX, 2)]).is_err());
        assert!(tax_for(i64::MAX).is_err());
    }

    #[test]
    fn rejects_empty_and_non_positive_quantities() {
        assert!(price_lines(&[]).is_err());
        assert!(price_lines(&[(100, 0)]).is_err());
        assert!(price_lines(&[(100, -2)]).is_err());
    }

    #[test]
    fn request_total_adds_surcharges() {
        assert_eq!(request_total(9_900, 2_500, 1_500), 13_900);
    }
}
