use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth::{create_access_token, verify_password_reset_token};
use crate::database::models::user::validate_password_length;
use crate::error::ApiError;
use crate::handlers::extract::{ApiForm, ApiJson};
use crate::handlers::{hash_password, verify_password, Message};

/// OAuth2 password-flow form; extra fields such as `grant_type` are ignored
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize)]
pub struct NewPassword {
    pub token: String,
    pub new_password: String,
}

/// POST /login/access-token - exchange email and password for a bearer token
pub async fn login_access_token(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<Json<Token>, ApiError> {
    let user = match state.store.get_user_by_email(&form.username).await? {
        Some(user) => user,
        None => {
            warn!("Login attempt for unknown email {}", form.username);
            return Err(ApiError::bad_request("Incorrect email or password"));
        }
    };

    if !verify_password(form.password, user.hashed_password.clone()).await? {
        warn!("Wrong password for {}", user.email);
        return Err(ApiError::bad_request("Incorrect email or password"));
    }

    if !user.is_active {
        return Err(ApiError::bad_request("Inactive user"));
    }

    let access_token = create_access_token(&state.codec, user.id, &state.config.security)?;
    info!("Issued access token for {}", user.email);

    Ok(Json(Token {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// POST /reset-password/ - set a new password using a reset token
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewPassword>,
) -> Result<Json<Message>, ApiError> {
    validate_password_length(&body.new_password)?;

    let email = verify_password_reset_token(&state.codec, &body.token)
        .ok_or_else(|| ApiError::bad_request("Invalid token"))?;

    let user = state
        .store
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| {
            ApiError::not_found("The user with this email does not exist in the system.")
        })?;

    if !user.is_active {
        return Err(ApiError::bad_request("Inactive user"));
    }

    let hashed = hash_password(body.new_password, state.password_params).await?;
    state.store.update_password(user.id, &hashed).await?;
    info!("Password reset for {}", user.email);

    Ok(Json(Message::new("Password updated successfully")))
}
