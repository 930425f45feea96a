//! Account roles.

use serde::{Deserialize, Serialize};

/// Account role attached to the current-user record.
///
/// Only customers may mutate a cart; vendor and admin accounts browse
/// the storefront with cart mutation disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular shopper with full cart access.
    #[default]
    Customer,
    /// Seller account managing its own listings.
    Vendor,
    /// Platform administrator.
    Admin,
}

impl Role {
    /// Whether this role is allowed to mutate a cart.
    #[must_use]
    pub const fn can_shop(&self) -> bool {
        matches!(self, Self::Customer)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Vendor => write!(f, "vendor"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "vendor" => Ok(Self::Vendor),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}
