//! Role-based authorization, checked uniformly through [`ensure_allowed`].

use uuid::Uuid;

use crate::{error::AppError, middleware::auth::AuthUser};

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ManageCatalog,
    PlaceOrder,
    ManageOrders,
    WriteReview,
    ModerateReviews,
    SubmitCustomRequest,
    ManageCustomRequests,
    ManageClients,
    ManageUsers,
    UploadFiles,
    ExportData,
}

pub fn allowed(role: &str, action: Action) -> bool {
    use Action::*;
    match role {
        ROLE_ADMIN => true,
        ROLE_USER => matches!(
            action,
            PlaceOrder | WriteReview | SubmitCustomRequest | UploadFiles
        ),
        _ => false,
    }
}

pub fn ensure_allowed(user: &AuthUser, action: Action) -> Result<(), AppError> {
    if allowed(&user.role, action) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub fn is_admin(user: &AuthUser) -> bool {
    user.role == ROLE_ADMIN
}

/// Owners act on their own records; admins act on any.
pub fn ensure_owner_or_admin(user: &AuthUser, owner_id: Uuid) -> Result<(), AppError> {
    if user.user_id == owner_id || is_admin(user) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role: role.into(),
        }
    }

    #[test]
    fn admin_can_do_everything() {
        for action in [Action::ManageCatalog, Action::ManageClients, Action::ExportData] {
            assert!(allowed(ROLE_ADMIN, action));
        }
    }

    #[test]
    fn users_are_limited_to_customer_actions() {
        assert!(allowed(ROLE_USER, Action::PlaceOrder));
        assert!(allowed(ROLE_USER, Action::WriteReview));
        assert!(!allowed(ROLE_USER, Action::ModerateReviews));
        assert!(!allowed(ROLE_USER, Action::ManageClients));
        assert!(!allowed("guest", Action::PlaceOrder));
    }

    #[test]
    fn ownership_check() {
        let owner = user(ROLE_USER);
        let other = user(ROLE_USER);
        let admin = user(ROLE_ADMIN);
        assert!(ensure_owner_or_admin(&owner, owner.user_id).is_ok());
        assert!(ensure_owner_or_admin(&other, owner.user_id).is_err());
        assert!(ensure_owner_or_admin(&admin, owner.user_id).is_ok());
    }
}
