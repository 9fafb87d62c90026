/// JWT Token Generation and Validation
///
/// Access and refresh tokens are signed with different secrets, so a token of
/// one kind never verifies as the other. Verification failures collapse into a
/// single error per token kind; the underlying reason is only logged.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::claims::{AccessClaims, Identity, RefreshClaims};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mints signed access and refresh tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    access_key: EncodingKey,
    refresh_key: EncodingKey,
    access_expiry: i64,
    refresh_expiry: i64,
    issuer: String,
}

impl TokenIssuer {
    pub fn new(config: &JwtSettings) -> Self {
        Self {
            access_key: EncodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_key: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_expiry: config.access_token_expiry,
            refresh_expiry: config.refresh_token_expiry,
            issuer: config.issuer.clone(),
        }
    }

    pub fn issue_access(&self, identity: &Identity) -> Result<String, AppError> {
        self.issue_access_at(identity, Utc::now())
    }

    pub fn issue_access_at(
        &self,
        identity: &Identity,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = AccessClaims::new(identity, issued_at, self.access_expiry, &self.issuer);
        sign(&claims, &self.access_key)
    }

    pub fn issue_refresh(&self, identity: &Identity) -> Result<String, AppError> {
        self.issue_refresh_at(identity, Utc::now())
    }

    pub fn issue_refresh_at(
        &self,
        identity: &Identity,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = RefreshClaims::new(identity.id, issued_at, self.refresh_expiry, &self.issuer);
        sign(&claims, &self.refresh_key)
    }

    /// Mint both tokens. Registering the refresh token is the caller's job.
    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue_access(identity)?,
            refresh_token: self.issue_refresh(identity)?,
        })
    }
}

fn sign<T: Serialize>(claims: &T, key: &EncodingKey) -> Result<String, AppError> {
    encode(&Header::new(Algorithm::HS256), claims, key)
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validates signature, issuer and expiry of presented tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    access_key: DecodingKey,
    refresh_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.leeway = config.leeway;

        Self {
            access_key: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_key: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            validation,
        }
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        self.verify(token, &self.access_key, AuthError::InvalidToken)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AppError> {
        self.verify(token, &self.refresh_key, AuthError::InvalidRefreshToken)
    }

    fn verify<T: DeserializeOwned>(
        &self,
        token: &str,
        key: &DecodingKey,
        failure: AuthError,
    ) -> Result<T, AppError> {
        decode::<T>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT validation error: {}", e);
                AppError::Auth(failure)
            })
    }
}
