use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::debug;

use crate::app::AppState;
use crate::database::models::{Item, ItemCreate, ItemPublic, ItemUpdate, ItemsPublic, User};
use crate::error::ApiError;
use crate::handlers::extract::{ApiJson, ApiQuery};
use crate::handlers::{parse_uuid, Message, Pagination};

/// Load an item the caller may touch: its owner or any superuser
async fn owned_item(state: &AppState, user: &User, raw_id: &str) -> Result<Item, ApiError> {
    let id = parse_uuid("id", raw_id)?;
    let item = state
        .store
        .get_item(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item not found"))?;

    if !user.is_superuser && item.owner_id != user.id {
        return Err(ApiError::bad_request("Not enough permissions"));
    }
    Ok(item)
}

/// GET /items/ - superusers see every item, everyone else their own
pub async fn read_items(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<Json<ItemsPublic>, ApiError> {
    let owner = if user.is_superuser { None } else { Some(user.id) };
    let (items, count) = state.store.list_items(owner, pagination.page()?).await?;
    debug!("Listed {} of {} items for {}", items.len(), count, user.email);

    Ok(Json(ItemsPublic {
        data: items.into_iter().map(ItemPublic::from).collect(),
        count,
    }))
}

/// GET /items/:id
pub async fn read_item(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<ItemPublic>, ApiError> {
    let item = owned_item(&state, &user, &id).await?;
    Ok(Json(item.into()))
}

/// POST /items/ - the caller becomes the owner
pub async fn create_item(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiJson(payload): ApiJson<ItemCreate>,
) -> Result<Json<ItemPublic>, ApiError> {
    payload.validate()?;
    let item = state.store.create_item(user.id, payload).await?;
    Ok(Json(item.into()))
}

/// PUT /items/:id
pub async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<ItemUpdate>,
) -> Result<Json<ItemPublic>, ApiError> {
    payload.validate()?;
    let item = owned_item(&state, &user, &id).await?;

    // Deleted between the ownership check and the write
    let updated = state
        .store
        .update_item(item.id, payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Item not found"))?;
    Ok(Json(updated.into()))
}

/// DELETE /items/:id
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    let item = owned_item(&state, &user, &id).await?;
    if !state.store.delete_item(item.id).await? {
        return Err(ApiError::not_found("Item not found"));
    }
    Ok(Json(Message::new("Item deleted successfully")))
}
