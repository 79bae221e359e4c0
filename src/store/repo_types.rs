use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// First/last name pair carried by every account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    pub first_name: String,
    pub last_name: String,
}

/// One played game attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: Uuid,
    pub game: String,
    pub players: Vec<String>,
    pub winner: String,
    pub date: String,
}

#[derive(Debug, Clone)]
pub struct NewGameSession {
    pub game: String,
    pub players: Vec<String>,
    pub winner: String,
    pub date: String,
}

/// Account of record.
#[derive(Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
    pub token: Option<String>,
    pub name: Name,
    /// Newest first.
    pub sessions: Vec<GameSession>,
}

// password_hash and token stay out of logs
impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("created_at", &self.created_at)
            .field("name", &self.name)
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

/// Fields for a user that does not exist yet. `email` is already normalized
/// and `password_hash` already computed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub token: String,
    pub name: Name,
}

/// `users` row.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
    pub token: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

/// `game_sessions` row.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct GameSessionRow {
    pub id: Uuid,
    pub game: String,
    pub players: sqlx::types::Json<Vec<String>>,
    pub winner: String,
    pub date: String,
}

impl From<GameSessionRow> for GameSession {
    fn from(r: GameSessionRow) -> Self {
        Self {
            id: r.id,
            game: r.game,
            players: r.players.0,
            winner: r.winner,
            date: r.date,
        }
    }
}

impl UserRow {
    pub(crate) fn into_user(self, sessions: Vec<GameSession>) -> User {
        User {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            created_at: self.created_at,
            token: self.token,
            name: Name {
                first_name: self.first_name,
                last_name: self.last_name,
            },
            sessions,
        }
    }
}
