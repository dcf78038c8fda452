use axum::{extract::Request, middleware::Next, response::Response};

use crate::auth::session::require_superuser;
use crate::database::models::User;
use crate::error::ApiError;

/// Middleware for the elevated tier. Must run after `require_session`.
pub async fn require_superuser_middleware(
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request.extensions().get::<User>().ok_or_else(|| {
        tracing::error!("Superuser check ran without an authenticated session");
        ApiError::internal_server_error("Session required before privilege check")
    })?;

    require_superuser(user).map_err(|e| {
        tracing::warn!("User {} denied elevated route", user.email);
        ApiError::from(e)
    })?;

    Ok(next.run(request).await)
}
