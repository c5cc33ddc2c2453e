use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{domain::status::ReviewStatus, models::Review, validation::not_blank};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub title: Option<String>,
    #[validate(
        custom(function = "not_blank"),
        length(max = 2000, message = "must be at most 2000 characters")
    )]
    pub comment: String,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub rating: Option<i32>,
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub title: Option<String>,
    #[validate(
        custom(function = "not_blank"),
        length(max = 2000, message = "must be at most 2000 characters")
    )]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ModerateReviewRequest {
    pub status: ReviewStatus,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub admin_response: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewList {
    pub items: Vec<Review>,
}
