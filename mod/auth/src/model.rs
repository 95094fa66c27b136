use serde::{Deserialize, Serialize};

use taller_core::Role;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered user.
///
/// The role is fixed at registration by the access code presented and
/// never changes. The password hash lives in its own table column, not
/// in this document, so serializing a `User` is always safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// National identity document number.
    pub dni: String,

    pub email: String,

    pub first_name: String,
    pub last_name: String,

    pub role: Role,

    /// Epoch milliseconds.
    pub created_at: i64,
}

impl User {
    /// Display name: `"{first} {last}"` trimmed; when both parts are
    /// blank, the local part of the email.
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.split('@').next().unwrap_or("").to_string()
        } else {
            name.to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Sessions and tokens
// ---------------------------------------------------------------------------

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id.
    pub sub: String,
    /// Display name at issue time.
    pub name: String,
    pub role: Role,
    /// Session id, used for revocation.
    pub sid: String,
    /// Issued at (unix timestamp, seconds).
    pub iat: i64,
    /// Expiration (unix timestamp, seconds).
    pub exp: i64,
}

/// A token issuance record. Revoking the session invalidates the token
/// before its natural expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: String,
    /// Epoch milliseconds.
    pub issued_at: i64,
    /// Epoch milliseconds.
    pub expires_at: i64,
    pub revoked: bool,
}

/// A signed access token plus its metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until expiry.
    pub expires_in: i64,
}

// ---------------------------------------------------------------------------
// Access codes
// ---------------------------------------------------------------------------

/// The singleton role-assignment configuration: one shared code per
/// role, handed out by the shop owner. Read-only at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    pub admin_code: String,
    pub tech_code: String,
}

// ---------------------------------------------------------------------------
// API request/response types
// ---------------------------------------------------------------------------

/// Body for `POST /auth/register`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub dni: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    /// Decides the role: admin code or technician code.
    pub access_code: String,
}

/// Body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for register and login: the account plus a live session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: User,
    #[serde(flatten)]
    pub grant: TokenGrant,
}
