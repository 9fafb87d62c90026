/// User Routes
///
/// Registration, login, token refresh, logout, profile and admin lookups.
/// Handlers only translate between HTTP and `SessionService`; every
/// user-shaped payload is a `PublicUser`.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AccessClaims;
use crate::error::AppError;
use crate::response;
use crate::session::{ProfileUpdate, Registration, SessionService};
use crate::user::Role;

/// Missing fields deserialize as empty and are reported by validation.
#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default, alias = "refresh_token")]
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// POST /api/users/register
///
/// # Errors
/// - 400: missing or invalid name/email/password (all violations listed)
/// - 409: email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let registered = sessions
        .register(Registration {
            name: form.name,
            email: form.email,
            password: form.password,
            role: form.role,
        })
        .await?;

    Ok(response::created("User registered successfully", registered))
}

/// POST /api/users/login
///
/// Unknown email and wrong password both return 401 with the same body.
pub async fn login(
    form: web::Json<LoginRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let tokens = sessions.login(&form.email, &form.password).await?;
    Ok(response::ok("Login successful", tokens))
}

/// POST /api/users/refresh
///
/// # Errors
/// - 400: refresh token missing
/// - 401: refresh token invalid, expired or revoked
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let tokens = sessions.refresh(&form.refresh_token).await?;
    Ok(response::ok("Token refreshed successfully", tokens))
}

/// POST /api/users/logout
///
/// **Requires valid JWT access token.** Revokes the refresh token in the body.
pub async fn logout(
    claims: web::ReqData<AccessClaims>,
    form: web::Json<RefreshRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    sessions.logout(&claims, &form.refresh_token).await?;
    Ok(response::ok_empty("Logout successful"))
}

/// GET /api/users/profile
pub async fn get_profile(
    claims: web::ReqData<AccessClaims>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let user = sessions.get_profile(claims.id).await?;
    Ok(response::ok("Profile retrieved successfully", user))
}

/// PUT /api/users/profile
///
/// # Errors
/// - 400: invalid name/email, or neither supplied
/// - 404: the authenticated user no longer exists
/// - 409: email belongs to another user
pub async fn update_profile(
    claims: web::ReqData<AccessClaims>,
    form: web::Json<UpdateProfileRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let user = sessions
        .update_profile(
            claims.id,
            ProfileUpdate {
                name: form.name,
                email: form.email,
            },
        )
        .await?;

    Ok(response::ok("Profile updated successfully", user))
}

/// GET /api/users/all (admin)
pub async fn list_users(sessions: web::Data<SessionService>) -> Result<HttpResponse, AppError> {
    let users = sessions.list_users().await?;
    Ok(response::ok("Users retrieved successfully", users))
}

/// GET /api/users/{id} (admin)
pub async fn get_user_by_id(
    path: web::Path<String>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    // An id that is not a UUID cannot name a user.
    let user_id = Uuid::parse_str(&path).map_err(|_| AppError::user_not_found())?;
    let user = sessions.get_user(user_id).await?;
    Ok(response::ok("User retrieved successfully", user))
}
