//! Identity vocabulary shared across modules.
//!
//! The orders module does NOT depend on the auth module. It only knows
//! the [`UserDirectory`] trait and the [`Caller`] extracted by the JWT
//! middleware. The concrete implementations are injected at startup time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ServiceError;

/// User role, fixed at registration by the access code used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Technician,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Technician => "TECHNICIAN",
        }
    }

    pub fn from_str(s: &str) -> Option<Role> {
        match s {
            "ADMIN" => Some(Role::Admin),
            "TECHNICIAN" => Some(Role::Technician),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authenticated caller, built by the JWT middleware and handed to
/// handlers through request extensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    /// User id (the JWT `sub`).
    pub user_id: String,
    /// Display name at token issue time.
    pub name: String,
    pub role: Role,
    /// Session id (the JWT `sid`), used for revocation.
    pub session_id: String,
}

/// Read-only user lookups offered to other modules.
///
/// `Ok(None)` means the user does not exist; callers degrade (leave the
/// name unset or substitute a placeholder) instead of failing.
pub trait UserDirectory: Send + Sync + 'static {
    /// Resolve a user's display name.
    fn full_name(&self, user_id: &str) -> Result<Option<String>, ServiceError>;
}

/// A directory with no users. Used for testing.
pub struct EmptyDirectory;

impl UserDirectory for EmptyDirectory {
    fn full_name(&self, _user_id: &str) -> Result<Option<String>, ServiceError> {
        Ok(None)
    }
}

/// A fixed in-memory directory. Used for testing.
pub struct StaticDirectory {
    names: HashMap<String, String>,
}

impl StaticDirectory {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            names: entries
                .into_iter()
                .map(|(id, name)| (id.into(), name.into()))
                .collect(),
        }
    }
}

impl UserDirectory for StaticDirectory {
    fn full_name(&self, user_id: &str) -> Result<Option<String>, ServiceError> {
        Ok(self.names.get(user_id).cloned())
    }
}
