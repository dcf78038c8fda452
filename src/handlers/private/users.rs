use axum::{extract::State, Json};
use tracing::info;

use crate::app::AppState;
use crate::database::models::{NewUser, UserCreate, UserPublic};
use crate::error::ApiError;
use crate::handlers::extract::ApiJson;
use crate::handlers::hash_password;

/// POST /private/users/ - unauthenticated, so never grants superuser
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UserCreate>,
) -> Result<Json<UserPublic>, ApiError> {
    payload.validate()?;

    let hashed_password = hash_password(payload.password, state.password_params).await?;
    let user = state
        .store
        .create_user(NewUser {
            email: payload.email,
            hashed_password,
            full_name: payload.full_name,
            is_active: true,
            is_superuser: false,
        })
        .await?;

    info!("Provisioned user {}", user.email);
    Ok(Json(user.into()))
}
