/// Password Hashing and Verification
///
/// Handles password hashing with bcrypt and password strength validation.
/// The strength rules are a `PasswordPolicy` value rather than fixed
/// constants, so deployments choose e.g. whether a special character is
/// required.

use std::sync::OnceLock;

use bcrypt::{hash, verify};

use crate::error::{AppError, ValidationError};

const FIELD: &str = "password";

/// Well-formed cost-10 digest used when the dummy digest cannot be generated
const FALLBACK_DUMMY_DIGEST: &str =
    "$2a$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy";

/// Password strength requirements
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    pub min_length: usize,
    /// bcrypt only reads the first 72 bytes; the cap also bounds hashing work
    pub max_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: false,
        }
    }
}

impl PasswordPolicy {
    /// Check a candidate password, returning every rule it breaks.
    pub fn violations(&self, password: &str) -> Vec<ValidationError> {
        if password.is_empty() {
            return vec![ValidationError::EmptyField(FIELD.to_string())];
        }

        let mut violations = Vec::new();
        let length = password.chars().count();

        if length < self.min_length {
            violations.push(ValidationError::TooShort(FIELD.to_string(), self.min_length));
        }
        if length > self.max_length {
            violations.push(ValidationError::TooLong(FIELD.to_string(), self.max_length));
        }

        let rules: [(bool, fn(char) -> bool, &'static str); 4] = [
            (self.require_uppercase, char::is_uppercase, "uppercase letter"),
            (self.require_lowercase, char::is_lowercase, "lowercase letter"),
            (self.require_digit, |c| c.is_ascii_digit(), "digit"),
            (
                self.require_special,
                |c| !c.is_alphanumeric() && !c.is_whitespace(),
                "special character",
            ),
        ];

        for (required, matches, class) in rules {
            if required && !password.chars().any(matches) {
                violations.push(ValidationError::MissingCharacter(FIELD.to_string(), class));
            }
        }

        violations
    }
}

/// One-way password hasher with constant-time verification.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    policy: PasswordPolicy,
    cost: u32,
    dummy_digest: std::sync::Arc<OnceLock<String>>,
}

impl PasswordHasher {
    pub fn new(policy: PasswordPolicy, cost: u32) -> Self {
        Self {
            policy,
            cost,
            dummy_digest: std::sync::Arc::new(OnceLock::new()),
        }
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Hash a password using bcrypt
    ///
    /// # Errors
    /// Returns a validation error listing every policy violation, or an
    /// internal error if bcrypt itself fails.
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let violations = self.policy.violations(password);
        if !violations.is_empty() {
            return Err(AppError::Validation(violations));
        }

        hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its digest.
    ///
    /// A mismatch is `false`, never an error. A digest bcrypt cannot parse is
    /// also `false`.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        match verify(password, digest) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!("Stored password digest could not be checked: {}", e);
                false
            }
        }
    }

    /// Spend the same work as a real verification against a throwaway digest.
    /// Used when the account does not exist so timing does not reveal it.
    pub fn verify_dummy(&self, password: &str) -> bool {
        let digest = self.dummy_digest.get_or_init(|| {
            hash("not-a-real-password", self.cost).unwrap_or_else(|e| {
                tracing::error!("Dummy password digest could not be generated: {}", e);
                FALLBACK_DUMMY_DIGEST.to_string()
            })
        });
        let _ = verify(password, digest);
        false
    }

    /// `hash` on the blocking thread pool.
    pub async fn hash_blocking(&self, password: String) -> Result<String, AppError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password)).await?
    }

    /// `verify` on the blocking thread pool; `None` digest means no such account.
    pub async fn verify_blocking(
        &self,
        password: String,
        digest: Option<String>,
    ) -> Result<bool, AppError> {
        let hasher = self.clone();
        let valid = tokio::task::spawn_blocking(move || match digest {
            Some(digest) => hasher.verify(&password, &digest),
            None => hasher.verify_dummy(&password),
        })
        .await?;
        Ok(valid)
    }
}
