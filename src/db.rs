pub mod bookingdb;
pub mod listingdb;
pub mod memory;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub use bookingdb::BookingExt;
pub use listingdb::ListingExt;
pub use memory::MemoryStore;

use crate::models::usermodel::{NewUser, User, UserChanges};

pub const USERS_USERNAME_KEY: &str = "users_username_key";
pub const USERS_EMAIL_KEY: &str = "users_email_key";
pub const BOOKINGS_ACTIVE_SLOT_IDX: &str = "bookings_active_slot_idx";

const USER_COLUMNS: &str = "id, username, email, password, avatar, created_at, updated_at";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint {constraint} violated")]
    UniqueViolation { constraint: String },

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    pub fn violates(&self, name: &str) -> bool {
        matches!(self, StoreError::UniqueViolation { constraint } if constraint == name)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or_default().to_string(),
                };
            }
        }
        StoreError::Database(err)
    }
}

/// Everything the services need from persistence.
pub trait Store: UserExt + ListingExt + BookingExt + Send + Sync + std::fmt::Debug {}

impl<T> Store for T where T: UserExt + ListingExt + BookingExt + Send + Sync + std::fmt::Debug {}

#[derive(Debug, Clone)]
pub struct DBClient {
    pool: Pool<Postgres>,
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError>;

    async fn get_users_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<User>, StoreError>;

    async fn save_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn update_user(
        &self,
        user_id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError>;

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE id = $1",
                USER_COLUMNS
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(username) = username {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE username = $1",
                USER_COLUMNS
            ))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE email = $1",
                USER_COLUMNS
            ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn get_users_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ANY($1)",
            USER_COLUMNS
        ))
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn save_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password, avatar)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(new_user.username)
        .bind(new_user.email)
        .bind(new_user.password)
        .bind(
            new_user
                .avatar
                .unwrap_or_else(|| crate::models::usermodel::DEFAULT_AVATAR.to_string()),
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                password = COALESCE($4, password),
                avatar = COALESCE($5, avatar),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password)
        .bind(changes.avatar)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
