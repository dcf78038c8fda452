use axum::{Extension, Json};

use crate::database::models::{User, UserPublic};

/// POST /login/test-token - echo the caller resolved from the bearer token
pub async fn test_token(Extension(user): Extension<User>) -> Json<UserPublic> {
    Json(user.into())
}

/// GET /users/me
pub async fn read_user_me(Extension(user): Extension<User>) -> Json<UserPublic> {
    Json(user.into())
}
