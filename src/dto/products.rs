use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    domain::catalog::{Category, TierMap, validate_delivery_days, validate_prices},
    models::Product,
    validation::not_blank,
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateProductRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "must be at most 200 characters")
    )]
    pub name: String,
    #[validate(length(max = 5000, message = "must be at most 5000 characters"))]
    pub description: Option<String>,
    pub category: Category,
    #[validate(custom(function = "not_blank"))]
    pub subcategory: String,
    #[validate(custom(function = "validate_prices"))]
    pub prices: TierMap,
    #[validate(custom(function = "validate_delivery_days"))]
    pub delivery_days: TierMap,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateProductRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "must be at most 200 characters")
    )]
    pub name: Option<String>,
    #[validate(length(max = 5000, message = "must be at most 5000 characters"))]
    pub description: Option<String>,
    pub category: Option<Category>,
    #[validate(custom(function = "not_blank"))]
    pub subcategory: Option<String>,
    #[validate(custom(function = "validate_prices"))]
    pub prices: Option<TierMap>,
    #[validate(custom(function = "validate_delivery_days"))]
    pub delivery_days: Option<TierMap>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, validation::field_errors};

    fn product(prices: TierMap, delivery_days: TierMap) -> CreateProductRequest {
        CreateProductRequest {
            name: "Sticker Sheet".into(),
            description: None,
            category: Category::Print,
            subcategory: "stickers".into(),
            prices,
            delivery_days,
            is_featured: false,
        }
    }

    fn tiers(base: i64, premium: Option<i64>) -> TierMap {
        TierMap {
            base,
            premium,
            enterprise: None,
        }
    }

    #[test]
    fn oversized_prices_and_turnarounds_are_rejected() {
        let payload = product(tiers(500, Some(i64::MAX / 5)), tiers(1_000_000_000, None));
        let errors = payload.validate().unwrap_err();
        let fields: Vec<_> = field_errors("", &errors).into_iter().map(|f| f.field).collect();
        assert_eq!(fields, ["delivery_days", "prices"]);
        assert!(matches!(AppError::from(errors), AppError::Validation(_)));
    }

    #[test]
    fn bounded_product_passes() {
        assert!(product(tiers(500, Some(900)), tiers(5, Some(3))).validate().is_ok());
    }

    #[test]
    fn partial_update_checks_only_supplied_fields() {
        let update = UpdateProductRequest {
            delivery_days: Some(tiers(0, None)),
            ..Default::default()
        };
        assert!(update.validate().is_err());
        assert!(UpdateProductRequest::default().validate().is_ok());
    }
}
