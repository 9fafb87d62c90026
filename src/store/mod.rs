/// User Store
///
/// The narrow persistence contract the session layer relies on. Emails are
/// compared case-insensitively by every implementation, and `insert` and
/// `update_profile` reject an email already held by another user with a
/// duplicate-email error.
///
/// There is no whole-record write. Profile fields and refresh-token digests
/// are updated by separate atomic operations, so a profile edit never undoes a
/// concurrent login or logout.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::user::User;

mod memory;
mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn insert(&self, user: User) -> Result<User, AppError>;

    /// Overwrite name, email and `updated_at`, returning the stored record.
    async fn update_profile(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<User, AppError>;

    /// Append a refresh-token digest to the user's registry.
    async fn add_refresh_token(&self, id: Uuid, digest: &str) -> Result<(), AppError>;

    /// Remove every occurrence of `digest`. Returns `false` when it was not
    /// registered, i.e. another request already revoked it.
    async fn remove_refresh_token(&self, id: Uuid, digest: &str) -> Result<bool, AppError>;

    async fn exists_by_email(&self, email: &str, excluding: Option<Uuid>)
        -> Result<bool, AppError>;

    /// All users in creation order
    async fn list(&self) -> Result<Vec<User>, AppError>;
}
