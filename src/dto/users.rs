use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    models::{AuditLog, User},
    policy::{ROLE_ADMIN, ROLE_USER},
    validation::invalid,
};

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(custom(function = "known_role"))]
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

fn known_role(role: &str) -> Result<(), ValidationError> {
    if role == ROLE_USER || role == ROLE_ADMIN {
        Ok(())
    } else {
        Err(invalid("role", "must be user or admin"))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<User>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogList {
    pub items: Vec<AuditLog>,
}
