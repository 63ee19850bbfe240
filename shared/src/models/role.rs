//! Role Model

use serde::{Deserialize, Serialize};

/// Caller role, as asserted by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Cashier,
    Kitchen,
    Customer,
}

impl Role {
    /// Staff that handle money (sessions, settlement, item edits)
    pub fn is_cashier_or_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::Cashier)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "cashier",
            Role::Kitchen => "kitchen",
            Role::Customer => "customer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated caller (id + role), passed on every privileged call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            role,
        }
    }
}
