use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::UserStore;
use crate::error::AppError;
use crate::user::User;

/// Process-local store. Every check-then-write happens under one write lock,
/// so racing registrations for the same email cannot both succeed and
/// registry edits are never lost.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn find_mut(users: &mut [User], id: Uuid) -> Result<&mut User, AppError> {
    users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(AppError::user_not_found)
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| same_email(&u.email, email)).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| same_email(&u.email, &user.email)) {
            return Err(AppError::duplicate_email());
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.id != id && same_email(&u.email, email)) {
            return Err(AppError::duplicate_email());
        }

        let user = find_mut(&mut users, id)?;
        user.name = name.to_string();
        user.email = email.to_string();
        user.updated_at = updated_at;
        Ok(user.clone())
    }

    async fn add_refresh_token(&self, id: Uuid, digest: &str) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        find_mut(&mut users, id)?.refresh_tokens.push(digest.to_string());
        Ok(())
    }

    async fn remove_refresh_token(&self, id: Uuid, digest: &str) -> Result<bool, AppError> {
        let mut users = self.users.write().await;
        let tokens = &mut find_mut(&mut users, id)?.refresh_tokens;
        let before = tokens.len();
        tokens.retain(|stored| stored != digest);
        Ok(tokens.len() != before)
    }

    async fn exists_by_email(
        &self,
        email: &str,
        excluding: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .any(|u| Some(u.id) != excluding && same_email(&u.email, email)))
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.users.read().await.clone())
    }
}
