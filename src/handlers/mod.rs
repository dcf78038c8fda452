// handlers/mod.rs - Tiered handler layout
//
// Public (no auth) → Protected (bearer session) → Elevated (superuser).
// Private routes are mounted only in the local environment.
pub mod elevated;
pub mod extract;
pub mod private;
pub mod protected;
pub mod public;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::password::{self, Argon2Params};
use crate::database::store::Page;
use crate::error::ApiError;

/// Generic `{"message": ...}` response body
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `?skip=&limit=` query parameters
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn page(&self) -> Result<Page, ApiError> {
        let default = Page::default();
        let page = Page {
            skip: self.skip.unwrap_or(default.skip),
            limit: self.limit.unwrap_or(default.limit),
        };

        let mut errors = HashMap::new();
        if page.skip < 0 {
            errors.insert("skip".to_string(), "Input should be greater than or equal to 0".to_string());
        }
        if page.limit < 0 {
            errors.insert("limit".to_string(), "Input should be greater than or equal to 0".to_string());
        }
        if errors.is_empty() {
            Ok(page)
        } else {
            Err(ApiError::unprocessable_entity("Invalid pagination", errors))
        }
    }
}

fn path_error(field: &str, message: &str) -> ApiError {
    let mut errors = HashMap::new();
    errors.insert(field.to_string(), message.to_string());
    ApiError::unprocessable_entity("Invalid path parameter", errors)
}

pub(crate) fn parse_vmid(raw: &str) -> Result<u32, ApiError> {
    raw.parse()
        .map_err(|_| path_error("vmid", "Input should be a valid integer"))
}

pub(crate) fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| path_error(field, "Input should be a valid UUID"))
}

/// Argon2 is CPU-bound; keep it off the async workers
pub(crate) async fn hash_password(password: String, params: Argon2Params) -> Result<String, ApiError> {
    let hash = tokio::task::spawn_blocking(move || password::hash_password_with_params(&password, params))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        })??;
    Ok(hash)
}

pub(crate) async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed: {}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        })
}
