/// JWT Claims structures
///
/// Access tokens carry identity and role; refresh tokens carry only the user
/// id (plus a random `jti` so two tokens minted in the same second differ).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::{Role, User};

/// Identity a token pair is minted for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub iss: String,
}

impl AccessClaims {
    pub fn new(identity: &Identity, issued_at: DateTime<Utc>, expiry_seconds: i64, issuer: &str) -> Self {
        let iat = issued_at.timestamp();
        Self {
            id: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            iat,
            exp: iat.saturating_add(expiry_seconds),
            iss: issuer.to_string(),
        }
    }
}

/// JWT Claims for refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    pub id: Uuid,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl RefreshClaims {
    pub fn new(user_id: Uuid, issued_at: DateTime<Utc>, expiry_seconds: i64, issuer: &str) -> Self {
        let iat = issued_at.timestamp();
        Self {
            id: user_id,
            jti: Uuid::new_v4(),
            iat,
            exp: iat.saturating_add(expiry_seconds),
            iss: issuer.to_string(),
        }
    }
}
