//! Ownership rules for objects that belong to a user
use crate::user::Role;

/// The outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allow)
    }

    /// Convert this into a [Result](crate::Result), so that a denial can be
    /// propagated with `?`
    pub fn check(self) -> crate::Result<()> {
        match self {
            Access::Allow => Ok(()),
            Access::Deny => Err(crate::Error::PermissionDenied),
        }
    }
}

/// Decide whether the user `actor_id` with role `actor_role` may modify an
/// object owned by `owner_id`. Owners may always modify their own objects and
/// administrators may modify anybody's.
pub fn authorize(actor_id: i64, owner_id: i64, actor_role: Role) -> Access {
    if actor_id == owner_id || actor_role == Role::Admin {
        Access::Allow
    } else {
        Access::Deny
    }
}
