use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::errors::AuthError;

/// JWT claims. Unlike the teacher's role-based `Claims`, this kernel has no
/// roles beyond "admin or not" (spec.md §6 Authentication) — `is_admin` is
/// the whole authorization surface.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub is_admin: bool,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
}

/// The authenticated caller of a request, resolved by whichever
/// `AuthMode` (`Bearer` or `Trust`) the deployment runs, per spec.md §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Principal {
    /// spec.md §9: "Admin tokens are intentionally denied on owner-scoped
    /// reads" — this is the one access check every owner-only handler uses,
    /// deliberately narrower than "admin OR owner".
    pub fn is_owner(&self, resource_owner: Uuid) -> bool {
        self.user_id == resource_owner
    }

    pub fn is_admin_for_write(&self) -> bool {
        self.is_admin
    }

    /// Gate for admin-only catalog-write endpoints.
    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AuthError::AdminRequired)
        }
    }

    /// Gate for resources spec.md §9 marks owner-only: dashboards,
    /// enrollment state, sessions, logged sets, triggers. Deliberately
    /// rejects admins acting on behalf of another lifter.
    pub fn require_owner(&self, resource_owner: Uuid) -> Result<(), AuthError> {
        if self.user_id == resource_owner {
            Ok(())
        } else {
            Err(AuthError::NotOwner)
        }
    }

    /// Gate for per-lifter resources not on the owner-only list (e.g. lift
    /// maxes), where an admin may act on the lifter's behalf.
    pub fn require_owner_or_admin(&self, resource_owner: Uuid) -> Result<(), AuthError> {
        if self.user_id == resource_owner || self.is_admin {
            Ok(())
        } else {
            Err(AuthError::NotOwner)
        }
    }
}
