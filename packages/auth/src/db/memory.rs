use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use super::store::{StoreError, UserStore};
use crate::models::{NewUser, TokenPair, User};

/// In-memory UserStore for testing and local development.
#[derive(Clone, Debug, Default)]
pub struct MemoryUserStore {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace a stored record wholesale, bypassing the token-only update path.
    pub fn put(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }
}

impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(user.email));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            access_token: None,
            refresh_token: None,
            token_expiry: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_tokens(&self, id: Uuid, tokens: &TokenPair) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&id).ok_or(StoreError::Missing(id))?;
        user.set_tokens(tokens, Utc::now());
        Ok(())
    }
}
