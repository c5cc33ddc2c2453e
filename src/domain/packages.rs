//! Package tiers and kind-specific payloads for custom design requests.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    domain::status::{self, DesignStatus, Lifecycle, RequestStatus},
    error::{AppError, AppResult},
    validation::{invalid, not_blank},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestKind {
    Logo,
    Embroidery,
    Design,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Package {
    Basic,
    Standard,
    Premium,
}

impl Package {
    pub fn as_str(self) -> &'static str {
        match self {
            Package::Basic => "basic",
            Package::Standard => "standard",
            Package::Premium => "premium",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "basic" => Some(Package::Basic),
            "standard" => Some(Package::Standard),
            "premium" => Some(Package::Premium),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PackageInfo {
    pub package: Package,
    pub price: i64,
    pub delivery_days: i64,
    /// Advertised revision rounds; `None` means unlimited. Not enforced.
    pub revisions: Option<u32>,
    pub rush_cost: i64,
}

impl RequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Logo => "logo",
            RequestKind::Embroidery => "embroidery",
            RequestKind::Design => "design",
        }
    }

    pub fn number_prefix(self) -> &'static str {
        match self {
            RequestKind::Logo => "LOGO",
            RequestKind::Embroidery => "EMB",
            RequestKind::Design => "DSN",
        }
    }

    pub fn rush_cost(self) -> i64 {
        match self {
            RequestKind::Logo => 2_500,
            RequestKind::Embroidery => 2_000,
            RequestKind::Design => 5_000,
        }
    }

    pub fn package(self, package: Package) -> PackageInfo {
        use Package::*;
        let (price, delivery_days, revisions) = match (self, package) {
            (RequestKind::Logo, Basic) => (4_900, 5, Some(2)),
            (RequestKind::Logo, Standard) => (9_900, 3, Some(5)),
            (RequestKind::Logo, Premium) => (19_900, 2, None),
            (RequestKind::Embroidery, Basic) => (2_900, 7, Some(1)),
            (RequestKind::Embroidery, Standard) => (5_900, 5, Some(3)),
            (RequestKind::Embroidery, Premium) => (9_900, 3, None),
            (RequestKind::Design, Basic) => (14_900, 10, Some(2)),
            (RequestKind::Design, Standard) => (29_900, 7, Some(4)),
            (RequestKind::Design, Premium) => (59_900, 5, None),
        };
        PackageInfo {
            package,
            price,
            delivery_days,
            revisions,
            rush_cost: self.rush_cost(),
        }
    }

    pub fn packages(self) -> Vec<PackageInfo> {
        [Package::Basic, Package::Standard, Package::Premium]
            .into_iter()
            .map(|p| self.package(p))
            .collect()
    }

    pub fn initial_status(self) -> &'static str {
        "pending"
    }

    pub fn completed_status(self) -> &'static str {
        match self {
            RequestKind::Logo | RequestKind::Embroidery => RequestStatus::completed().as_str(),
            RequestKind::Design => DesignStatus::completed().as_str(),
        }
    }

    /// Validate `from -> to` against this kind's table and return the
    /// normalized target status.
    pub fn transition(self, from: &str, to: &str) -> AppResult<&'static str> {
        match self {
            RequestKind::Logo | RequestKind::Embroidery => {
                let target = to.parse::<RequestStatus>()?;
                Ok(status::check_transition(from, target)?.as_str())
            }
            RequestKind::Design => {
                let target = to.parse::<DesignStatus>()?;
                Ok(status::check_transition(from, target)?.as_str())
            }
        }
    }

    pub fn cancel(self, from: &str) -> AppResult<&'static str> {
        self.transition(from, "cancelled").map_err(|_| {
            AppError::BadRequest(format!("Request cannot be cancelled while {from}"))
        })
    }

    /// Returns the status after a revision request; repeated requests while
    /// already `revision-requested` keep that status.
    pub fn request_revision(self, from: &str) -> AppResult<&'static str> {
        const REVISION: &str = "revision-requested";
        if from == REVISION {
            return Ok(REVISION);
        }
        self.transition(from, REVISION).map_err(|_| {
            AppError::BadRequest(format!("Revisions cannot be requested while {from}"))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    Front,
    Back,
    LeftChest,
    RightChest,
    Sleeve,
    CapFront,
}

impl Placement {
    pub fn surcharge(self) -> i64 {
        match self {
            Placement::Front => 0,
            Placement::Back => 1_500,
            Placement::LeftChest | Placement::RightChest => 500,
            Placement::Sleeve => 800,
            Placement::CapFront => 700,
        }
    }
}

pub const EXTRA_CONCEPT_PRICE: i64 = 3_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct LogoDetails {
    #[validate(
        custom(function = "not_blank"),
        length(max = 120, message = "must be at most 120 characters")
    )]
    pub business_name: String,
    pub industry: Option<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct EmbroideryDetails {
    #[validate(custom(function = "not_blank"))]
    pub garment_type: String,
    #[validate(range(min = 1, max = 10000, message = "must be between 1 and 10000"))]
    pub quantity: i32,
    #[validate(custom(function = "has_placement"))]
    pub placements: Vec<Placement>,
    #[serde(default)]
    pub thread_colors: Vec<String>,
}

fn has_placement(placements: &[Placement]) -> Result<(), ValidationError> {
    if placements.is_empty() {
        return Err(invalid("placements", "must contain at least one placement"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct DesignDetails {
    #[validate(custom(function = "not_blank"))]
    pub design_type: String,
    #[serde(default)]
    pub product_types: Vec<String>,
    #[serde(default)]
    #[validate(range(max = 10, message = "must be at most 10"))]
    pub additional_concepts: u32,
    pub target_audience: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestDetails {
    Logo(LogoDetails),
    Embroidery(EmbroideryDetails),
    Design(DesignDetails),
}

impl RequestDetails {
    pub fn from_json(kind: RequestKind, value: serde_json::Value) -> AppResult<Self> {
        let parsed = match kind {
            RequestKind::Logo => serde_json::from_value(value).map(RequestDetails::Logo),
            RequestKind::Embroidery => {
                serde_json::from_value(value).map(RequestDetails::Embroidery)
            }
            RequestKind::Design => serde_json::from_value(value).map(RequestDetails::Design),
        };
        parsed.map_err(|e| AppError::BadRequest(format!("Invalid {} details: {e}", kind.as_str())))
    }

    pub fn extras_cost(&self) -> i64 {
        match self {
            RequestDetails::Logo(_) => 0,
            RequestDetails::Embroidery(d) => d.placements.iter().map(|p| p.surcharge()).sum(),
            RequestDetails::Design(d) => d.additional_concepts as i64 * EXTRA_CONCEPT_PRICE,
        }
    }
}

impl Validate for RequestDetails {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            RequestDetails::Logo(d) => d.validate(),
            RequestDetails::Embroidery(d) => d.validate(),
            RequestDetails::Design(d) => d.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embroidery_extras_sum_placements() {
        let details = RequestDetails::from_json(
            RequestKind::Embroidery,
            json!({
                "garment_type": "polo",
                "quantity": 20,
                "placements": ["front", "back", "sleeve"]
            }),
        )
        .unwrap();
        assert_eq!(details.extras_cost(), 2_300);
    }

    #[test]
    fn design_extras_price_concepts() {
        let details = RequestDetails::from_json(
            RequestKind::Design,
            json!({ "design_type": "packaging", "additional_concepts": 2 }),
        )
        .unwrap();
        assert_eq!(details.extras_cost(), 6_000);
    }

    #[test]
    fn details_rules_follow_the_kind() {
        let details = RequestDetails::from_json(
            RequestKind::Embroidery,
            json!({ "garment_type": " ", "quantity": 0, "placements": [] }),
        )
        .unwrap();
        let errors = details.validate().unwrap_err();
        let fields: Vec<_> = crate::validation::field_errors("details", &errors)
            .into_iter()
            .map(|f| f.field)
            .collect();
        assert_eq!(
            fields,
            ["details.garment_type", "details.placements", "details.quantity"]
        );

        let design = RequestDetails::from_json(
            RequestKind::Design,
            json!({ "design_type": "packaging", "additional_concepts": 11 }),
        )
        .unwrap();
        assert!(design.validate().is_err());
    }

    #[test]
    fn wrong_payload_for_kind_is_rejected() {
        let err = RequestDetails::from_json(RequestKind::Logo, json!({ "garment_type": "cap" }));
        assert!(matches!(err, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn logo_and_design_tables_differ() {
        assert!(RequestKind::Logo.transition("in-progress", "completed").is_ok());
        assert!(RequestKind::Design.transition("in-progress", "completed").is_err());
        assert_eq!(
            RequestKind::Design.transition("shipped", "completed").unwrap(),
            "completed"
        );
    }

    #[test]
    fn design_cancel_blocked_in_production() {
        assert!(RequestKind::Design.cancel("approved").is_ok());
        assert!(RequestKind::Design.cancel("in-production").is_err());
        assert!(RequestKind::Design.cancel("shipped").is_err());
    }

    #[test]
    fn revision_flow() {
        assert!(RequestKind::Logo.request_revision("pending").is_err());
        assert_eq!(
            RequestKind::Logo.request_revision("in-review").unwrap(),
            "revision-requested"
        );
        assert_eq!(
            RequestKind::Logo.request_revision("revision-requested").unwrap(),
            "revision-requested"
        );
        assert!(RequestKind::Embroidery.request_revision("completed").is_err());
        assert!(RequestKind::Design.request_revision("design-in-progress").is_ok());
    }

    #[test]
    fn premium_packages_advertise_unlimited_revisions() {
        for kind in [RequestKind::Logo, RequestKind::Embroidery, RequestKind::Design] {
            let packages = kind.packages();
            assert_eq!(packages.len(), 3);
            assert_eq!(packages[2].revisions, None);
            assert!(packages[0].price < packages[2].price);
        }
    }
}
