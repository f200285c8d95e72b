//! Request authorizer for identity-scoped routes
//!
//! A request is Unauthenticated until its bearer token verifies; only then
//! is an [`AuthUser`] attached and the handler run. Handlers must take the
//! caller's identity from that extension and nowhere else.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::{debug, warn};

use crate::{error::ApiError, jwt::TokenError, state::AppState};

/// Authenticated user information
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(Authorization(bearer)) = req.headers().typed_get::<Authorization<Bearer>>() else {
        debug!("Rejected {}: missing bearer token", req.uri().path());
        return Err(ApiError::Unauthorized);
    };

    let claims = state
        .jwt_service
        .verify(bearer.token())
        .map_err(|e| {
            match e {
                TokenError::Expired => debug!("Rejected expired token"),
                other => warn!("Rejected token: {}", other),
            }
            ApiError::Unauthorized
        })?;

    debug!(user_id = claims.sub, jti = %claims.jti, "Token accepted");

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        username: claims.username,
    });

    Ok(next.run(req).await)
}
