//! Persistence seam used by handlers and the session resolver.
//!
//! `PgStore` is the production backend; `MemoryStore` backs tests and
//! local experiments.

use async_trait::async_trait;
use std::fmt::Debug;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{Item, ItemCreate, ItemUpdate, NewUser, User};

/// Offset/limit window for list endpoints
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, limit: 100 }
    }
}

/// Storage backend for users and items.
///
/// Implementations must be safe to share across request tasks. Every call
/// reads current state; nothing is cached between calls.
#[async_trait]
pub trait Store: Send + Sync + Debug {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Fails with `Conflict` when the email is taken
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    async fn update_password(&self, id: Uuid, hashed_password: &str) -> Result<(), DatabaseError>;

    async fn list_users(&self, page: Page) -> Result<(Vec<User>, i64), DatabaseError>;

    /// Deletes the user and every item it owns. Returns false if absent.
    async fn delete_user(&self, id: Uuid) -> Result<bool, DatabaseError>;

    async fn create_item(&self, owner_id: Uuid, item: ItemCreate) -> Result<Item, DatabaseError>;

    async fn get_item(&self, id: Uuid) -> Result<Option<Item>, DatabaseError>;

    /// Items ordered by creation time; `owner` restricts to one user's items
    async fn list_items(
        &self,
        owner: Option<Uuid>,
        page: Page,
    ) -> Result<(Vec<Item>, i64), DatabaseError>;

    async fn update_item(&self, id: Uuid, update: ItemUpdate) -> Result<Option<Item>, DatabaseError>;

    async fn delete_item(&self, id: Uuid) -> Result<bool, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
