// ── Roles and access scope ──
//
// The identity provider only hands us a user id. The `profiles` table
// maps it to a role and, for scoped roles, a customer.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    CustomerAdmin,
    BranchManager,
    #[default]
    User,
}

impl Role {
    /// Unknown or missing role claims fall back to the least privileged role.
    pub fn from_claim(raw: Option<&str>) -> Self {
        raw.and_then(|r| r.parse().ok()).unwrap_or_default()
    }
}

/// Who is looking, as far as the hierarchy is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub customer_id: Option<EntityId>,
}

impl UserContext {
    /// A fully privileged context, used when no user id is configured.
    pub fn service() -> Self {
        Self {
            user_id: String::from("service"),
            display_name: None,
            role: Role::SuperAdmin,
            customer_id: None,
        }
    }
}

/// Which customers' hierarchies a user may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessScope {
    All,
    Customer(EntityId),
    Nothing,
}

impl AccessScope {
    pub fn for_user(user: &UserContext) -> Self {
        match (user.role, &user.customer_id) {
            (Role::SuperAdmin, _) => Self::All,
            (Role::CustomerAdmin | Role::BranchManager, Some(id)) => Self::Customer(id.clone()),
            _ => Self::Nothing,
        }
    }

    pub fn allows_customer(&self, customer_id: &EntityId) -> bool {
        match self {
            Self::All => true,
            Self::Customer(id) => id == customer_id,
            Self::Nothing => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, customer: Option<&str>) -> UserContext {
        UserContext {
            user_id: "u1".into(),
            display_name: None,
            role,
            customer_id: customer.map(EntityId::from),
        }
    }

    #[test]
    fn super_admin_sees_everything() {
        let scope = AccessScope::for_user(&user(Role::SuperAdmin, None));
        assert_eq!(scope, AccessScope::All);
        assert!(scope.allows_customer(&EntityId::from("c9")));
    }

    #[test]
    fn scoped_roles_see_their_customer() {
        for role in [Role::CustomerAdmin, Role::BranchManager] {
            let scope = AccessScope::for_user(&user(role, Some("c1")));
            assert!(scope.allows_customer(&EntityId::from("c1")));
            assert!(!scope.allows_customer(&EntityId::from("c2")));
        }
    }

    #[test]
    fn scoped_role_without_customer_sees_nothing() {
        let scope = AccessScope::for_user(&user(Role::CustomerAdmin, None));
        assert_eq!(scope, AccessScope::Nothing);
    }

    #[test]
    fn plain_users_see_nothing() {
        let scope = AccessScope::for_user(&user(Role::User, Some("c1")));
        assert_eq!(scope, AccessScope::Nothing);
    }

    #[test]
    fn unknown_role_claim_is_user() {
        assert_eq!(Role::from_claim(Some("auditor")), Role::User);
        assert_eq!(Role::from_claim(None), Role::User);
        assert_eq!(Role::from_claim(Some("super_admin")), Role::SuperAdmin);
    }
}
