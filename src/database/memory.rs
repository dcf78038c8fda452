//! In-memory storage backend
//!
//! Mirrors the PostgreSQL schema rules (unique email, cascading item
//! deletion). Data is lost on restart.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{Item, ItemCreate, ItemUpdate, NewUser, User};
use super::store::{Page, Store};

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    // Insertion order doubles as creation order
    items: RwLock<Vec<Item>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the active flag directly; there is no API for it
    pub fn set_active(&self, id: Uuid, is_active: bool) -> bool {
        let mut users = self.users.write().unwrap();
        match users.get_mut(&id) {
            Some(user) => {
                user.is_active = is_active;
                true
            }
            None => false,
        }
    }
}

fn window<T: Clone>(rows: &[T], page: Page) -> Vec<T> {
    let skip = page.skip.max(0) as usize;
    let limit = page.limit.max(0) as usize;
    rows.iter().skip(skip).take(limit).cloned().collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().unwrap().get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::Conflict(format!(
                "user with email {}",
                user.email
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            full_name: user.full_name,
            hashed_password: user.hashed_password,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_password(&self, id: Uuid, hashed_password: &str) -> Result<(), DatabaseError> {
        let mut users = self.users.write().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))?;
        user.hashed_password = hashed_password.to_string();
        Ok(())
    }

    async fn list_users(&self, page: Page) -> Result<(Vec<User>, i64), DatabaseError> {
        let users = self.users.read().unwrap();
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.email.cmp(&b.email));
        Ok((window(&all, page), all.len() as i64))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut users = self.users.write().unwrap();
        if users.remove(&id).is_none() {
            return Ok(false);
        }
        self.items.write().unwrap().retain(|item| item.owner_id != id);
        Ok(true)
    }

    async fn create_item(&self, owner_id: Uuid, item: ItemCreate) -> Result<Item, DatabaseError> {
        // Held until the push so a concurrent delete_user cannot orphan the item.
        // Lock order is users then items, as in delete_user.
        let users = self.users.read().unwrap();
        if !users.contains_key(&owner_id) {
            return Err(DatabaseError::NotFound(format!("owner {}", owner_id)));
        }
        let item = Item {
            id: Uuid::new_v4(),
            title: item.title,
            description: item.description,
            owner_id,
            created_at: Utc::now(),
        };
        self.items.write().unwrap().push(item.clone());
        Ok(item)
    }

    async fn get_item(&self, id: Uuid) -> Result<Option<Item>, DatabaseError> {
        let items = self.items.read().unwrap();
        Ok(items.iter().find(|item| item.id == id).cloned())
    }

    async fn list_items(
        &self,
        owner: Option<Uuid>,
        page: Page,
    ) -> Result<(Vec<Item>, i64), DatabaseError> {
        let items = self.items.read().unwrap();
        let matching: Vec<Item> = items
            .iter()
            .rev()
            .filter(|item| owner.map_or(true, |o| item.owner_id == o))
            .cloned()
            .collect();
        Ok((window(&matching, page), matching.len() as i64))
    }

    async fn update_item(&self, id: Uuid, update: ItemUpdate) -> Result<Option<Item>, DatabaseError> {
        let mut items = self.items.write().unwrap();
        match items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                update.apply(item);
                Ok(Some(item.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_item(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut items = self.items.write().unwrap();
        let before = items.len();
        items.retain(|item| item.id != id);
        Ok(items.len() < before)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
