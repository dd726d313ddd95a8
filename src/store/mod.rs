use axum::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

/// User record as persisted by the store.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already taken")]
    DuplicateEmail,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence boundary for user records. The store owns uniqueness of
/// emails; a colliding insert or update yields `DuplicateEmail`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn create(
        &self,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
    ) -> Result<User, StoreError>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, StoreError>;

    /// Apply partial changes; `None` fields are left unchanged.
    /// Returns `None` when no user has the given id.
    async fn update(
        &self,
        id: Uuid,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<Option<User>, StoreError>;

    /// Returns whether a record was actually removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}
