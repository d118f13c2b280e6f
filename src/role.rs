//! Role resolution.
//!
//! Roles form a closed set. Free-text tokens coming from callers are matched
//! case-insensitively against it; anything else is rejected with
//! [`InvalidRole`]. Resolution has no side effects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Team role an excuse (or a fragment) can be tailored for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Backend/frontend developer.
    Dev,
    /// Quality assurance / tester.
    Qa,
    /// Infrastructure and operations.
    DevOps,
    /// Project manager / scrum master.
    Pm,
    /// Software architect.
    Architect,
    /// Developer relations / tech lead.
    DevRel,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 6] = [
        Role::Dev,
        Role::Qa,
        Role::DevOps,
        Role::Pm,
        Role::Architect,
        Role::DevRel,
    ];

    /// Canonical upper-case token for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "DEV",
            Self::Qa => "QA",
            Self::DevOps => "DEVOPS",
            Self::Pm => "PM",
            Self::Architect => "ARCHITECT",
            Self::DevRel => "DEVREL",
        }
    }

    /// Parse role from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DEV" => Some(Self::Dev),
            "QA" => Some(Self::Qa),
            "DEVOPS" => Some(Self::DevOps),
            "PM" => Some(Self::Pm),
            "ARCHITECT" => Some(Self::Architect),
            "DEVREL" => Some(Self::DevRel),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role token that does not name any known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid role: {0}. Valid roles: DEV, QA, DEVOPS, PM, ARCHITECT, DEVREL")]
pub struct InvalidRole(pub String);

/// Validate a free-text role token and return the canonical role.
///
/// Surrounding whitespace is ignored and matching is case-insensitive, so
/// `"dev"`, `" Dev "` and `"DEV"` all resolve to [`Role::Dev`].
pub fn resolve_role(token: &str) -> Result<Role, InvalidRole> {
    Role::from_str(token.trim()).ok_or_else(|| InvalidRole(token.to_string()))
}
