use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    domain::packages::{Package, PackageInfo},
    models::{CustomRequest, RequestMessage, Revision},
    validation::not_blank,
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateCustomRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "must be at most 200 characters")
    )]
    pub title: String,
    #[validate(
        custom(function = "not_blank"),
        length(max = 5000, message = "must be at most 5000 characters")
    )]
    pub description: String,
    pub package: Package,
    #[serde(default)]
    pub rush_delivery: bool,
    /// Kind-specific payload: logo, embroidery or design details.
    #[schema(value_type = Object)]
    pub details: Value,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateCustomRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 5000, message = "must be at most 5000 characters")
    )]
    pub description: Option<String>,
    pub package: Option<Package>,
    pub rush_delivery: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateRequestStatus {
    pub status: String,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RevisionRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 5000, message = "must be at most 5000 characters")
    )]
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddFinalDesignRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 1000, message = "must be at most 1000 characters")
    )]
    pub file_url: String,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomRequestList {
    pub items: Vec<CustomRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomRequestDetail {
    pub request: CustomRequest,
    pub revisions: Vec<Revision>,
    pub messages: Vec<RequestMessage>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PackageList {
    pub items: Vec<PackageInfo>,
}
