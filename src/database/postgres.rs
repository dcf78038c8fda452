//! PostgreSQL storage backend

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{Item, ItemCreate, ItemUpdate, NewUser, User};
use super::store::{Page, Store};

const USER_COLUMNS: &str = "id, email, is_active, is_superuser, full_name, hashed_password";
const ITEM_COLUMNS: &str = "id, title, description, owner_id, created_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let user = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {} FROM "user" WHERE id = $1"#,
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {} FROM "user" WHERE email = $1"#,
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO "user" (id, email, is_active, is_superuser, full_name, hashed_password)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {}"#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(user.is_active)
        .bind(user.is_superuser)
        .bind(&user.full_name)
        .bind(&user.hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, &format!("user with email {}", user.email)))
    }

    async fn update_password(&self, id: Uuid, hashed_password: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query(r#"UPDATE "user" SET hashed_password = $2 WHERE id = $1"#)
            .bind(id)
            .bind(hashed_password)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    async fn list_users(&self, page: Page) -> Result<(Vec<User>, i64), DatabaseError> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "user""#)
            .fetch_one(&self.pool)
            .await?;
        let users = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {} FROM "user" ORDER BY email OFFSET $1 LIMIT $2"#,
            USER_COLUMNS
        ))
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok((users, count))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, DatabaseError> {
        // item.owner_id is ON DELETE CASCADE
        let result = sqlx::query(r#"DELETE FROM "user" WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_item(&self, owner_id: Uuid, item: ItemCreate) -> Result<Item, DatabaseError> {
        let item = sqlx::query_as::<_, Item>(&format!(
            "INSERT INTO item (id, title, description, owner_id, created_at)
             VALUES ($1, $2, $3, $4, now())
             RETURNING {}",
            ITEM_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&item.title)
        .bind(&item.description)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    async fn get_item(&self, id: Uuid) -> Result<Option<Item>, DatabaseError> {
        let item = sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM item WHERE id = $1",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn list_items(
        &self,
        owner: Option<Uuid>,
        page: Page,
    ) -> Result<(Vec<Item>, i64), DatabaseError> {
        // NULL owner matches every row
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM item WHERE ($1::uuid IS NULL OR owner_id = $1)")
                .bind(owner)
                .fetch_one(&self.pool)
                .await?;
        let items = sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM item
             WHERE ($1::uuid IS NULL OR owner_id = $1)
             ORDER BY created_at DESC
             OFFSET $2 LIMIT $3",
            ITEM_COLUMNS
        ))
        .bind(owner)
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok((items, count))
    }

    async fn update_item(&self, id: Uuid, update: ItemUpdate) -> Result<Option<Item>, DatabaseError> {
        let item = sqlx::query_as::<_, Item>(&format!(
            "UPDATE item
             SET title = COALESCE($2, title),
                 description = CASE WHEN $3 THEN $4 ELSE description END
             WHERE id = $1
             RETURNING {}",
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(&update.title)
        .bind(update.description.is_some())
        .bind(update.description.as_ref().and_then(|d| d.as_deref()))
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn delete_item(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM item WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
