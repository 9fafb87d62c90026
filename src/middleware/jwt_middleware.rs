/// JWT Authentication Middleware
///
/// Validates the bearer access token from the Authorization header, checks
/// the caller's role against an optional required-role set, and injects the
/// claims into request extensions for route handlers.
///
/// Status codes: no or malformed credential is 401, a credential that was
/// presented but rejected is 403, and a role outside the set is 403. Roles
/// are matched by membership only; `Admin` does not satisfy a
/// `Moderator`-only route unless listed.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{AccessClaims, TokenVerifier};
use crate::error::{AppError, AuthError};
use crate::user::Role;

/// JWT middleware for protecting routes
pub struct JwtMiddleware {
    verifier: TokenVerifier,
    required_roles: Option<Rc<[Role]>>,
}

impl JwtMiddleware {
    /// Authentication only; any valid access token passes.
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier,
            required_roles: None,
        }
    }

    /// Additionally require the caller's role to be one of `roles`.
    pub fn require_roles(mut self, roles: &[Role]) -> Self {
        self.required_roles = Some(Rc::from(roles));
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
            required_roles: self.required_roles.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    verifier: TokenVerifier,
    required_roles: Option<Rc<[Role]>>,
}

impl<S> JwtMiddlewareService<S> {
    fn authorize(&self, req: &ServiceRequest) -> Result<AccessClaims, AuthError> {
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::NoToken)?;

        let claims = self
            .verifier
            .verify_access(token)
            .map_err(|_| AuthError::InvalidToken)?;

        if let Some(roles) = &self.required_roles {
            if !roles.contains(&claims.role) {
                tracing::warn!(
                    user_id = %claims.id,
                    role = %claims.role,
                    path = %req.path(),
                    "Role not permitted for route"
                );
                return Err(AuthError::InsufficientPermissions);
            }
        }

        Ok(claims)
    }
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.authorize(&req) {
            Ok(claims) => {
                tracing::debug!(user_id = %claims.id, "JWT validated successfully");
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!(path = %req.path(), "Request rejected: {}", e);
                Box::pin(async move { Err(AppError::Auth(e).into()) })
            }
        }
    }
}
