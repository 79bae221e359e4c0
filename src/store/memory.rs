use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{GameSession, NewGameSession, NewUser, StoreError, User, UserStore};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
    by_token: HashMap<String, Uuid>,
}

/// Process-local store. Every mutation runs under one write lock, which is
/// what makes the email and token indexes unique.
#[derive(Default)]
pub struct MemoryUserStore {
    tables: RwLock<Tables>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.by_email.get(email).and_then(|id| t.users.get(id)).cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.by_token.get(token).and_then(|id| t.users.get(id)).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut t = self.tables.write().await;
        if t.by_email.contains_key(&new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        if t.by_token.contains_key(&new_user.token) {
            return Err(StoreError::TokenCollision);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: OffsetDateTime::now_utc(),
            token: Some(new_user.token),
            name: new_user.name,
            sessions: Vec::new(),
        };
        t.by_email.insert(user.email.clone(), user.id);
        if let Some(token) = &user.token {
            t.by_token.insert(token.clone(), user.id);
        }
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_token(&self, id: Uuid, token: &str) -> Result<User, StoreError> {
        let mut t = self.tables.write().await;
        match t.by_token.get(token) {
            Some(owner) if *owner != id => return Err(StoreError::TokenCollision),
            _ => {}
        }
        let user = t.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        let previous = user.token.replace(token.to_owned());
        let updated = user.clone();
        if let Some(previous) = previous {
            t.by_token.remove(&previous);
        }
        t.by_token.insert(token.to_owned(), id);
        Ok(updated)
    }

    async fn push_session(&self, id: Uuid, session: NewGameSession) -> Result<User, StoreError> {
        let mut t = self.tables.write().await;
        let user = t.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.sessions.insert(
            0,
            GameSession {
                id: Uuid::new_v4(),
                game: session.game,
                players: session.players,
                winner: session.winner,
                date: session.date,
            },
        );
        Ok(user.clone())
    }

    async fn remove_session(&self, id: Uuid, session_id: Uuid) -> Result<User, StoreError> {
        let mut t = self.tables.write().await;
        let user = t.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.sessions.retain(|s| s.id != session_id);
        Ok(user.clone())
    }
}
