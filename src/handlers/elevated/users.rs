use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::info;

use crate::app::AppState;
use crate::database::models::{User, UserPublic, UsersPublic};
use crate::error::ApiError;
use crate::handlers::extract::ApiQuery;
use crate::handlers::{parse_uuid, Message, Pagination};

/// GET /users/
pub async fn read_users(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<Json<UsersPublic>, ApiError> {
    let (users, count) = state.store.list_users(pagination.page()?).await?;
    Ok(Json(UsersPublic {
        data: users.into_iter().map(UserPublic::from).collect(),
        count,
    }))
}

/// DELETE /users/:user_id - removes the account and every item it owns
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<User>,
    Path(user_id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    let user_id = parse_uuid("user_id", &user_id)?;
    let user = state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if user.id == current.id {
        return Err(ApiError::forbidden(
            "Super users are not allowed to delete themselves",
        ));
    }

    if !state.store.delete_user(user.id).await? {
        return Err(ApiError::not_found("User not found"));
    }
    info!("User {} deleted by {}", user.email, current.email);
    Ok(Json(Message::new("User deleted successfully")))
}
