//! # Roles and Permissions
//!
//! Every account carries exactly one [`Role`]. What a role may do is
//! decided in one place, [`Role::allows`], with an exhaustive match so a
//! new [`Action`] cannot be added without deciding who gets it.
//!
//! ```text
//! Action            Admin   Staff
//! ───────────────   ─────   ─────
//! ViewProducts        ✓       ✓
//! ManageProducts      ✓
//! ImportProducts      ✓
//! ExportProducts      ✓       ✓
//! RecordSales         ✓       ✓
//! ViewSales           ✓       ✓
//! ViewAnalytics       ✓       ✓
//! ManageUsers         ✓
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including user management.
    Admin,
    /// Counter staff: sells and reads, cannot change the catalog.
    Staff,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }

    /// Returns true if this role may perform `action`.
    pub const fn allows(&self, action: Action) -> bool {
        match (self, action) {
            (Role::Admin, _) => true,
            (Role::Staff, Action::ViewProducts)
            | (Role::Staff, Action::ExportProducts)
            | (Role::Staff, Action::RecordSales)
            | (Role::Staff, Action::ViewSales)
            | (Role::Staff, Action::ViewAnalytics) => true,
            (Role::Staff, Action::ManageProducts)
            | (Role::Staff, Action::ImportProducts)
            | (Role::Staff, Action::ManageUsers) => false,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Staff
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a role name. `user` is accepted as the older name for staff
/// accounts.
impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "staff" | "user" => Ok(Role::Staff),
            other => Err(CoreError::InvalidArgument(format!(
                "unknown role '{}', use admin or staff",
                other
            ))),
        }
    }
}

/// Something an account can attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ViewProducts,
    /// Add, update, restock and delete products.
    ManageProducts,
    ImportProducts,
    ExportProducts,
    RecordSales,
    ViewSales,
    ViewAnalytics,
    ManageUsers,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::ViewProducts => "view products",
            Action::ManageProducts => "manage products",
            Action::ImportProducts => "import products",
            Action::ExportProducts => "export products",
            Action::RecordSales => "record sales",
            Action::ViewSales => "view sales",
            Action::ViewAnalytics => "view analytics",
            Action::ManageUsers => "manage users",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("staff".parse::<Role>().unwrap(), Role::Staff);
        assert_eq!("user".parse::<Role>().unwrap(), Role::Staff);
        assert!(matches!(
            "owner".parse::<Role>(),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_admin_allows_everything() {
        for action in [
            Action::ViewProducts,
            Action::ManageProducts,
            Action::ImportProducts,
            Action::ExportProducts,
            Action::RecordSales,
            Action::ViewSales,
            Action::ViewAnalytics,
            Action::ManageUsers,
        ] {
            assert!(Role::Admin.allows(action), "admin denied {action}");
        }
    }

    #[test]
    fn test_staff_permissions() {
        assert!(Role::Staff.allows(Action::RecordSales));
        assert!(Role::Staff.allows(Action::ViewAnalytics));
        assert!(Role::Staff.allows(Action::ExportProducts));
        assert!(!Role::Staff.allows(Action::ManageProducts));
        assert!(!Role::Staff.allows(Action::ImportProducts));
        assert!(!Role::Staff.allows(Action::ManageUsers));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(Role::Staff.to_string(), "staff");
    }
}
