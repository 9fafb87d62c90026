/// Session Coordinator
///
/// Registration, login, token refresh, logout and profile operations,
/// composed from the password hasher, the token issuer/verifier, the refresh
/// token registry and a `UserStore`.
///
/// Nothing here knows about HTTP; handlers translate in and out.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{
    refresh_token, AccessClaims, Identity, PasswordHasher, TokenIssuer, TokenPair, TokenVerifier,
};
use crate::configuration::Settings;
use crate::error::{AppError, AuthError, ValidationError};
use crate::store::UserStore;
use crate::user::{normalize_email, PublicUser, Role, User};
use crate::validators::{is_valid_email, is_valid_name};

const REFRESH_TOKEN_FIELD: &str = "refreshToken";

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub user: PublicUser,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedTokens {
    pub access_token: String,
    /// Present only when refresh-token rotation is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    rotate_refresh_tokens: bool,
    allow_role_selection: bool,
}

impl SessionService {
    pub fn new(store: Arc<dyn UserStore>, settings: &Settings) -> Self {
        Self {
            store,
            hasher: PasswordHasher::new(
                settings.password.policy.clone(),
                settings.password.hash_cost,
            ),
            issuer: TokenIssuer::new(&settings.jwt),
            verifier: TokenVerifier::new(&settings.jwt),
            rotate_refresh_tokens: settings.jwt.rotate_refresh_tokens,
            allow_role_selection: settings.application.allow_role_selection,
        }
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    pub async fn register(&self, registration: Registration) -> Result<RegisteredUser, AppError> {
        let mut violations = Vec::new();
        let name = is_valid_name(&registration.name).map_err(|e| violations.push(e)).ok();
        let email = is_valid_email(&registration.email).map_err(|e| violations.push(e)).ok();
        violations.extend(self.hasher.policy().violations(&registration.password));

        let (name, email) = match (name, email) {
            (Some(name), Some(email)) if violations.is_empty() => (name, email),
            _ => return Err(AppError::Validation(violations)),
        };

        let role = registration.role.unwrap_or_default();
        if role != Role::User && !self.allow_role_selection {
            tracing::warn!(%role, "Registration requested a privileged role");
            return Err(AuthError::InsufficientPermissions.into());
        }

        // Cheap early exit; `insert` still enforces uniqueness atomically.
        if self.store.exists_by_email(&email, None).await? {
            return Err(AppError::duplicate_email());
        }

        let password_hash = self.hasher.hash_blocking(registration.password).await?;
        let user = User::new(name, email, password_hash, role);

        // The record is stored once, with its first refresh token registered.
        let tokens = self.issuer.issue_pair(&Identity::from(&user))?;
        let user = self
            .store
            .insert(refresh_token::add(user, &tokens.refresh_token))
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");

        Ok(RegisteredUser {
            user: user.into(),
            tokens,
        })
    }

    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AppError> {
        let mut violations = Vec::new();
        if email.trim().is_empty() {
            violations.push(ValidationError::EmptyField("email".to_string()));
        }
        if password.is_empty() {
            violations.push(ValidationError::EmptyField("password".to_string()));
        }
        if !violations.is_empty() {
            return Err(AppError::Validation(violations));
        }

        let user = self.store.find_by_email(&normalize_email(email)).await?;
        let digest = user.as_ref().map(|u| u.password_hash.clone());
        let password_valid = self
            .hasher
            .verify_blocking(password.to_string(), digest)
            .await?;

        let user = match user {
            Some(user) if password_valid => user,
            _ => {
                tracing::warn!("Failed login attempt");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        let tokens = self.issuer.issue_pair(&Identity::from(&user))?;
        self.store
            .add_refresh_token(user.id, &refresh_token::digest(&tokens.refresh_token))
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(tokens)
    }

    /// Mint a new access token from a registered refresh token.
    pub async fn refresh(&self, token: &str) -> Result<RefreshedTokens, AppError> {
        let user = self.registered_owner(token).await?;
        let identity = Identity::from(&user);
        let access_token = self.issuer.issue_access(&identity)?;

        if !self.rotate_refresh_tokens {
            tracing::info!(user_id = %user.id, "Access token refreshed");
            return Ok(RefreshedTokens {
                access_token,
                refresh_token: None,
            });
        }

        let rotated = self.issuer.issue_refresh(&identity)?;
        if !self
            .store
            .remove_refresh_token(user.id, &refresh_token::digest(token))
            .await?
        {
            tracing::warn!(user_id = %user.id, "Refresh token already rotated");
            return Err(AuthError::InvalidRefreshToken.into());
        }
        self.store
            .add_refresh_token(user.id, &refresh_token::digest(&rotated))
            .await?;

        tracing::info!(user_id = %user.id, "Access token refreshed, refresh token rotated");
        Ok(RefreshedTokens {
            access_token,
            refresh_token: Some(rotated),
        })
    }

    /// Revoke `token` for the authenticated caller.
    pub async fn logout(&self, caller: &AccessClaims, token: &str) -> Result<(), AppError> {
        let user = self.registered_owner(token).await?;
        if user.id != caller.id {
            tracing::warn!(
                user_id = %caller.id,
                "Logout attempted with another user's refresh token"
            );
            return Err(AuthError::InvalidRefreshToken.into());
        }

        if !self
            .store
            .remove_refresh_token(user.id, &refresh_token::digest(token))
            .await?
        {
            return Err(AuthError::InvalidRefreshToken.into());
        }

        tracing::info!(user_id = %user.id, "User logged out");
        Ok(())
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<PublicUser, AppError> {
        self.store
            .find_by_id(user_id)
            .await?
            .map(PublicUser::from)
            .ok_or_else(AppError::user_not_found)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<PublicUser, AppError> {
        if update.name.is_none() && update.email.is_none() {
            return Err(ValidationError::EmptyField("name or email".to_string()).into());
        }

        let mut violations = Vec::new();
        let name = update
            .name
            .as_deref()
            .map(is_valid_name)
            .transpose()
            .map_err(|e| violations.push(e))
            .ok()
            .flatten();
        let email = update
            .email
            .as_deref()
            .map(is_valid_email)
            .transpose()
            .map_err(|e| violations.push(e))
            .ok()
            .flatten();
        if !violations.is_empty() {
            return Err(AppError::Validation(violations));
        }

        let current = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(AppError::user_not_found)?;

        let email = email.unwrap_or(current.email);
        let name = name.unwrap_or(current.name);

        // Only the profile fields are written; the refresh-token registry is
        // left to its own atomic operations.
        let user = self
            .store
            .update_profile(user_id, &name, &email, Utc::now())
            .await?;
        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user.into())
    }

    pub async fn list_users(&self) -> Result<Vec<PublicUser>, AppError> {
        let users = self.store.list().await?;
        if users.is_empty() {
            return Err(AppError::NotFound("No users found".to_string()));
        }
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<PublicUser, AppError> {
        self.get_profile(user_id).await
    }

    /// Verify a refresh token and return its owner, provided the token is
    /// still in the owner's registry.
    async fn registered_owner(&self, token: &str) -> Result<User, AppError> {
        if token.trim().is_empty() {
            return Err(ValidationError::EmptyField(REFRESH_TOKEN_FIELD.to_string()).into());
        }

        let claims = self.verifier.verify_refresh(token)?;
        let user = self.store.find_by_id(claims.id).await?;

        match user {
            Some(user) if refresh_token::contains(&user, token) => Ok(user),
            Some(user) => {
                tracing::warn!(user_id = %user.id, "Revoked refresh token presented");
                Err(AuthError::InvalidRefreshToken.into())
            }
            None => {
                tracing::warn!(user_id = %claims.id, "Refresh token for unknown user");
                Err(AuthError::InvalidRefreshToken.into())
            }
        }
    }
}
