use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::session::resolve_session;
use crate::error::ApiError;

/// Bearer authentication middleware.
///
/// Resolves the token to an active user and injects the `User` into request
/// extensions for downstream handlers.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

    let user = resolve_session(&state.codec, state.store.as_ref(), &token)
        .await
        .map_err(|e| {
            tracing::warn!("Session rejected: {}", e);
            ApiError::from(e)
        })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Token from an `Authorization: Bearer <token>` header. The scheme is
/// matched case-insensitively.
pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
