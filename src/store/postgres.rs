use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::repo_types::{GameSessionRow, UserRow};
use super::{GameSession, NewGameSession, NewUser, StoreError, User, UserStore};

// constraint names from migrations/0001_create_users.sql
const USERS_EMAIL_KEY: &str = "users_email_key";
const USERS_TOKEN_KEY: &str = "users_token_key";

const USER_COLUMNS: &str = "id, email, password_hash, created_at, token, first_name, last_name";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self::from_pool(db))
    }

    pub fn from_pool(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }

    async fn sessions_of(&self, user_id: Uuid) -> Result<Vec<GameSession>, StoreError> {
        let rows = sqlx::query_as::<_, GameSessionRow>(
            r#"
            SELECT id, game, players, winner, date
            FROM game_sessions
            WHERE user_id = $1
            ORDER BY seq DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| map_db_error(e, "list sessions"))?;
        Ok(rows.into_iter().map(GameSession::from).collect())
    }

    async fn hydrate(&self, row: Option<UserRow>) -> Result<Option<User>, StoreError> {
        match row {
            Some(row) => {
                let sessions = self.sessions_of(row.id).await?;
                Ok(Some(row.into_user(sessions)))
            }
            None => Ok(None),
        }
    }
}

fn map_db_error(e: sqlx::Error, what: &'static str) -> StoreError {
    let (unique, foreign) = match &e {
        sqlx::Error::Database(db) => (
            db.is_unique_violation()
                .then(|| db.constraint().map(str::to_owned))
                .flatten(),
            db.is_foreign_key_violation(),
        ),
        _ => (None, false),
    };
    match unique.as_deref() {
        Some(USERS_EMAIL_KEY) => StoreError::DuplicateEmail,
        Some(USERS_TOKEN_KEY) => StoreError::TokenCollision,
        _ if foreign => StoreError::NotFound,
        _ => StoreError::Unavailable(anyhow::Error::new(e).context(what)),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_db_error(e, "find user by email"))?;
        self.hydrate(row).await
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_db_error(e, "find user by token"))?;
        self.hydrate(row).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_db_error(e, "find user by id"))?;
        self.hydrate(row).await
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, token, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.token)
        .bind(&new_user.name.first_name)
        .bind(&new_user.name.last_name)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_db_error(e, "insert user"))?;
        debug!(user_id = %row.id, "user row inserted");
        Ok(row.into_user(Vec::new()))
    }

    async fn update_token(&self, id: Uuid, token: &str) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET token = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_db_error(e, "update token"))?;
        self.hydrate(row).await?.ok_or(StoreError::NotFound)
    }

    async fn push_session(&self, id: Uuid, session: NewGameSession) -> Result<User, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO game_sessions (id, user_id, game, players, winner, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(&session.game)
        .bind(sqlx::types::Json(session.players))
        .bind(&session.winner)
        .bind(&session.date)
        .execute(&self.db)
        .await
        .map_err(|e| map_db_error(e, "insert session"))?;
        self.find_by_id(id).await?.ok_or(StoreError::NotFound)
    }

    async fn remove_session(&self, id: Uuid, session_id: Uuid) -> Result<User, StoreError> {
        let result = sqlx::query("DELETE FROM game_sessions WHERE id = $1 AND user_id = $2")
            .bind(session_id)
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| map_db_error(e, "delete session"))?;
        debug!(user_id = %id, %session_id, removed = result.rows_affected(), "session delete");
        self.find_by_id(id).await?.ok_or(StoreError::NotFound)
    }
}
