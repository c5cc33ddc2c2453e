use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use validator::ValidationError;

use crate::{
    error::{AppError, AppResult},
    validation::invalid,
};

/// Highest unit price a product tier may carry, in cents.
pub const MAX_TIER_PRICE: i64 = 100_000_000;
pub const MAX_DELIVERY_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    LogoDesign,
    Embroidery,
    Print,
    Apparel,
    Branding,
    WebDesign,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::LogoDesign,
        Category::Embroidery,
        Category::Print,
        Category::Apparel,
        Category::Branding,
        Category::WebDesign,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::LogoDesign => "logo-design",
            Category::Embroidery => "embroidery",
            Category::Print => "print",
            Category::Apparel => "apparel",
            Category::Branding => "branding",
            Category::WebDesign => "web-design",
        }
    }

    pub fn subcategories(self) -> &'static [&'static str] {
        match self {
            Category::LogoDesign => &["minimal", "mascot", "lettermark", "emblem"],
            Category::Embroidery => &["caps", "shirts", "jackets", "patches"],
            Category::Print => &["business-cards", "flyers", "banners", "stickers"],
            Category::Apparel => &["t-shirts", "hoodies", "polos"],
            Category::Branding => &["brand-kit", "stationery", "social-media"],
            Category::WebDesign => &["landing-page", "website"],
        }
    }

    pub fn ensure_subcategory(self, subcategory: &str) -> AppResult<()> {
        if self.subcategories().contains(&subcategory) {
            Ok(())
        } else {
            Err(AppError::BadRequest(format!(
                "Subcategory {subcategory} does not belong to {}",
                self.as_str()
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Base,
    Premium,
    Enterprise,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Base => "base",
            Tier::Premium => "premium",
            Tier::Enterprise => "enterprise",
        }
    }
}

/// A value per product tier (price in cents or delivery days); only `base`
/// is mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TierMap {
    pub base: i64,
    pub premium: Option<i64>,
    pub enterprise: Option<i64>,
}

impl TierMap {
    pub fn get(&self, tier: Tier) -> Option<i64> {
        match tier {
            Tier::Base => Some(self.base),
            Tier::Premium => self.premium,
            Tier::Enterprise => self.enterprise,
        }
    }

    fn check(&self, max: i64, code: &'static str) -> Result<(), ValidationError> {
        let tiers = [
            (Tier::Base, Some(self.base)),
            (Tier::Premium, self.premium),
            (Tier::Enterprise, self.enterprise),
        ];
        for (tier, value) in tiers {
            match value {
                Some(value) if !(1..=max).contains(&value) => {
                    return Err(invalid(
                        code,
                        format!("{} must be between 1 and {max}", tier.as_str()),
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

pub fn validate_prices(prices: &TierMap) -> Result<(), ValidationError> {
    prices.check(MAX_TIER_PRICE, "price_range")
}

pub fn validate_delivery_days(days: &TierMap) -> Result<(), ValidationError> {
    days.check(MAX_DELIVERY_DAYS, "delivery_days_range")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcategory_must_match_category() {
        assert!(Category::Embroidery.ensure_subcategory("caps").is_ok());
        assert!(Category::Embroidery.ensure_subcategory("flyers").is_err());
    }

    #[test]
    fn missing_tier_is_none() {
        let prices = TierMap {
            base: 100,
            premium: Some(200),
            enterprise: None,
        };
        assert_eq!(prices.get(Tier::Premium), Some(200));
        assert_eq!(prices.get(Tier::Enterprise), None);
    }

    #[test]
    fn tier_values_are_bounded() {
        let ok = TierMap {
            base: 1,
            premium: Some(MAX_TIER_PRICE),
            enterprise: None,
        };
        assert!(validate_prices(&ok).is_ok());

        let huge = TierMap {
            base: 100,
            premium: None,
            enterprise: Some(i64::MAX / 5),
        };
        let err = validate_prices(&huge).unwrap_err();
        assert_eq!(
            err.message.as_deref(),
            Some("enterprise must be between 1 and 100000000")
        );

        let slow = TierMap {
            base: 1_000_000_000,
            premium: None,
            enterprise: None,
        };
        assert!(validate_delivery_days(&slow).is_err());
        let zero = TierMap {
            base: 0,
            premium: None,
            enterprise: None,
        };
        assert!(validate_delivery_days(&zero).is_err());
    }

    #[test]
    fn category_serializes_kebab_case() {
        let json = serde_json::to_string(&Category::LogoDesign).unwrap();
        assert_eq!(json, "\"logo-design\"");
        let parsed: Category = serde_json::from_str("\"web-design\"").unwrap();
        assert_eq!(Category::parse(parsed.as_str()), Some(Category::WebDesign));
        assert_eq!(Category::parse("pottery"), None);
    }
}
