use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{AddSessionRequest, DeleteSessionRequest};
use crate::{
    auth::{dto::AuthenticatedIdentity, extractors::ApiJson, services::required, AuthUser},
    error::AppError,
    state::AppState,
    store::NewGameSession,
};

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me/add-session", post(add_session))
        .route("/users/me/sessions", delete(delete_session))
}

#[instrument(skip_all)]
pub async fn add_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<AddSessionRequest>,
) -> Result<(StatusCode, Json<AuthenticatedIdentity>), AppError> {
    let game = required(body.game, "game")?;
    let players = body.players.ok_or_else(|| AppError::missing_field("players"))?;
    let winner = required(body.winner, "winner")?;
    let date = required(body.date, "date")?;

    let user = state
        .store
        .push_session(
            user.id,
            NewGameSession {
                game,
                players,
                winner,
                date,
            },
        )
        .await?;

    info!(user_id = %user.id, sessions = user.sessions.len(), "session added");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip_all)]
pub async fn delete_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<DeleteSessionRequest>,
) -> Result<Json<AuthenticatedIdentity>, AppError> {
    let raw = required(body.session_id, "sessionId")?;
    let session_id =
        Uuid::parse_str(raw.trim()).map_err(|_| AppError::invalid_field("sessionId"))?;

    let user = state.store.remove_session(user.id, session_id).await?;

    info!(user_id = %user.id, %session_id, "session removed");
    Ok(Json(user.into()))
}
