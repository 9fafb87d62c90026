/// User Model
///
/// `User` is the stored identity record. It intentionally does not implement
/// `Serialize`: the only externally visible shape is `PublicUser`, which has
/// no password digest and no refresh-token collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Closed set of roles. Authorization checks role-set membership only;
/// there is no hierarchy between variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    #[serde(alias = "User")]
    User,
    #[serde(alias = "Admin")]
    Admin,
    #[serde(alias = "Moderator")]
    Moderator,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Moderator => "moderator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Stored lower-cased; uniqueness is case-insensitive
    pub email: String,
    /// bcrypt digest, never the plaintext
    pub password_hash: String,
    pub role: Role,
    /// SHA-256 digests of the refresh tokens currently registered for this user
    pub refresh_tokens: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role,
            refresh_tokens: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Sanitized representation returned by every user-shaped response
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Lower-case and trim an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_starts_without_refresh_tokens() {
        let user = User::new(
            "A".to_string(),
            "a@x.com".to_string(),
            "$2b$04$digest".to_string(),
            Role::default(),
        );

        assert!(user.refresh_tokens.is_empty());
        assert_eq!(user.role, Role::User);
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_public_user_has_no_secrets() {
        let mut user = User::new(
            "A".to_string(),
            "a@x.com".to_string(),
            "$2b$04$digest".to_string(),
            Role::Admin,
        );
        user.refresh_tokens.push("abc".to_string());

        let json = serde_json::to_value(PublicUser::from(&user)).unwrap();
        let object = json.as_object().unwrap();

        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("passwordHash"));
        assert!(!object.contains_key("refreshTokens"));
        assert_eq!(object["role"], "admin");
    }

    #[test]
    fn test_role_parsing_accepts_either_case() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("moderator".parse::<Role>().unwrap(), Role::Moderator);
        assert!("root".parse::<Role>().is_err());

        let role: Role = serde_json::from_str("\"Moderator\"").unwrap();
        assert_eq!(role, Role::Moderator);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }
}
