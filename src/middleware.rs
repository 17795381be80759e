//! Request extractors: the admin gate and the caller identity.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::guest_cart::GUEST_IDENTITY;
use crate::state::AppState;

/// Header carrying the shared admin secret.
pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

/// Header carrying the caller identity, set by the session layer in front
/// of this service. Absent for unauthenticated visitors.
pub const IDENTITY_HEADER: &str = "x-user-id";

/// Extractor gating the membership administration routes. The supplied
/// header must match the configured secret exactly; this is deliberately a
/// literal comparison, not a cryptographic scheme.
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let supplied = parts
            .headers
            .get(ADMIN_SECRET_HEADER)
            .and_then(|value| value.to_str().ok());

        if supplied == Some(state.config.admin_secret.as_str()) {
            Ok(Self)
        } else {
            Err(AppError::Unauthorized(
                "Unauthorized: Admin access required".to_string(),
            ))
        }
    }
}

/// The per-request identity: an opaque user id, or the guest sentinel when
/// no identity header is present.
pub struct Identity(pub String);

impl Identity {
    pub fn is_guest(&self) -> bool {
        self.0 == GUEST_IDENTITY
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .unwrap_or(GUEST_IDENTITY);

        Ok(Self(identity.to_string()))
    }
}
