//! Credential store: the durable home of users, their tokens and their
//! game sessions.
//!
//! Uniqueness of emails and tokens is the store's job. Callers may pre-check,
//! but only the store's own constraint (a unique index in Postgres, the write
//! lock in memory) closes the race between two concurrent registrations.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

mod memory;
mod postgres;
pub mod repo_types;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;
pub use repo_types::{GameSession, Name, NewGameSession, NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("token already assigned to another user")]
    TokenCollision,

    #[error("user not found")]
    NotFound,

    #[error("store unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Exact match on the stored token.
    async fn find_by_token(&self, token: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Fails with `DuplicateEmail` when the email is taken, even if a
    /// pre-check said otherwise.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Overwrites the user's token; the previous value stops resolving.
    async fn update_token(&self, id: Uuid, token: &str) -> Result<User, StoreError>;

    /// Prepends a session so the list stays newest first.
    async fn push_session(&self, id: Uuid, session: NewGameSession) -> Result<User, StoreError>;

    /// Removing an unknown session id leaves the user unchanged.
    async fn remove_session(&self, id: Uuid, session_id: Uuid) -> Result<User, StoreError>;
}
