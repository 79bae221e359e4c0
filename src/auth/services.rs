//! Registration, login and bearer-token authorization.
//!
//! These functions are the whole auth protocol; the HTTP handlers and the
//! `AuthUser` extractor only translate requests into calls here.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        password,
        token::issue_token,
    },
    error::AppError,
    state::AppState,
    store::{Name, NewUser, StoreError, User, UserStore},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Present and not blank, or a `Missing field` error naming it.
pub(crate) fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::missing_field(field)),
    }
}

#[instrument(skip(state, req))]
pub async fn register(state: &AppState, req: RegisterRequest) -> Result<User, AppError> {
    let password = required(req.password, "password")?;
    let email = normalize_email(&required(req.email, "email")?);
    let first_name = required(req.first_name, "firstName")?.trim().to_owned();
    let last_name = required(req.last_name, "lastName")?.trim().to_owned();

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::invalid_field("email"));
    }

    // fast path only; the store's unique constraint is what actually holds
    if state.store.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::DuplicateAccount);
    }

    let password_hash = password::hash(password).await?;
    let token = issue_token(state.config.auth.token_bytes);

    let user = state
        .store
        .create(NewUser {
            email,
            password_hash,
            token,
            name: Name {
                first_name,
                last_name,
            },
        })
        .await
        .map_err(|e| {
            // store failures are logged once, when the error becomes a response
            if matches!(e, StoreError::DuplicateEmail) {
                warn!("email registered concurrently");
            }
            AppError::from(e)
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

#[instrument(skip(state, req))]
pub async fn login(state: &AppState, req: LoginRequest) -> Result<User, AppError> {
    let email = normalize_email(&required(req.email, "email")?);
    let password = required(req.password, "password")?;

    if !state.throttle.check(&email) {
        warn!(email = %email, "login throttled");
        return Err(AppError::TooManyAttempts);
    }

    let user = match state.store.find_by_email(&email).await? {
        Some(u) => u,
        None => {
            password::verify_dummy(password).await;
            state.throttle.record_failure(&email);
            warn!(email = %email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    if !password::verify(password, user.password_hash.clone()).await? {
        state.throttle.record_failure(&email);
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(state.config.auth.token_bytes);
    let user = state.store.update_token(user.id, &token).await?;
    state.throttle.record_success(&email);

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(user)
}

/// Extracts the token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty() && !token.contains(char::is_whitespace)).then_some(token)
}

/// Resolves the acting user from the raw `Authorization` header value.
pub async fn authorize(
    store: &dyn UserStore,
    authorization: Option<&str>,
) -> Result<User, AppError> {
    let token = authorization
        .and_then(bearer_token)
        .ok_or(AppError::Unauthenticated)?;

    match store.find_by_token(token).await? {
        Some(user) => Ok(user),
        None => {
            warn!("unknown bearer token");
            Err(AppError::Unauthenticated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn state() -> AppState {
        AppState::in_memory(AppConfig::default())
    }

    fn registration(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.into()),
            password: Some(password.into()),
            first_name: Some("Matt".into()),
            last_name: Some("Long".into()),
        }
    }

    fn credentials(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("ax.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a b@x.com"));
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer   abc  "), Some("abc"));
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer a b"), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[tokio::test]
    async fn register_issues_token_and_normalizes_email() {
        let state = state();
        let user = register(&state, registration("  A@X.com ", "abc123")).await.unwrap();
        assert_eq!(user.email, "a@x.com");
        assert!(user.token.is_some());
        assert!(user.sessions.is_empty());
        assert_ne!(user.password_hash, "abc123");
        assert!(!user.password_hash.contains("abc123"));

        let found = authorize(
            state.store.as_ref(),
            Some(&format!("Bearer {}", user.token.unwrap())),
        )
        .await
        .unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn register_reports_first_missing_field() {
        let state = state();
        let mut req = registration("a@x.com", "abc123");
        req.first_name = Some("   ".into());
        req.last_name = None;
        match register(&state, req).await {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Missing field: firstName"),
            other => panic!("unexpected {other:?}"),
        }

        match register(&state, RegisterRequest::default()).await {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Missing field: password"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn register_rejects_case_variant_duplicate() {
        let state = state();
        register(&state, registration("a@x.com", "abc123")).await.unwrap();
        let err = register(&state, registration("A@x.com", "other")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateAccount));
    }

    #[tokio::test]
    async fn login_rotates_token() {
        let state = state();
        let registered = register(&state, registration("a@x.com", "abc123")).await.unwrap();

        let first = login(&state, credentials("a@x.com", "abc123")).await.unwrap();
        let second = login(&state, credentials("A@X.COM", "abc123")).await.unwrap();

        let t0 = registered.token.unwrap();
        let t1 = first.token.unwrap();
        let t2 = second.token.unwrap();
        assert_ne!(t0, t1);
        assert_ne!(t1, t2);

        let store = state.store.as_ref();
        let err = authorize(store, Some(&format!("Bearer {t1}"))).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
        let user = authorize(store, Some(&format!("Bearer {t2}"))).await.unwrap();
        assert_eq!(user.id, registered.id);
    }

    #[tokio::test]
    async fn wrong_password_keeps_stored_token() {
        let state = state();
        let registered = register(&state, registration("a@x.com", "abc123")).await.unwrap();

        let err = login(&state, credentials("a@x.com", "wrong")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        let stored = state.store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.token, registered.token);
    }

    #[tokio::test]
    async fn unknown_email_is_indistinguishable_from_wrong_password() {
        let state = state();
        register(&state, registration("a@x.com", "abc123")).await.unwrap();

        let unknown = login(&state, credentials("nobody@x.com", "abc123")).await.unwrap_err();
        let wrong = login(&state, credentials("a@x.com", "nope")).await.unwrap_err();
        assert_eq!(unknown.public_message(), wrong.public_message());
        assert_eq!(unknown.status_code(), wrong.status_code());
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let state = state();
        let err = login(&state, LoginRequest::default()).await.unwrap_err();
        assert_eq!(err.public_message(), "Missing field: email");
        let err = login(
            &state,
            LoginRequest {
                email: Some("a@x.com".into()),
                password: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.public_message(), "Missing field: password");
    }

    #[tokio::test]
    async fn repeated_failures_lock_out_the_email() {
        let mut config = AppConfig::default();
        config.auth.max_failed_logins = 2;
        let state = AppState::in_memory(config);
        register(&state, registration("a@x.com", "abc123")).await.unwrap();

        for _ in 0..2 {
            let err = login(&state, credentials("a@x.com", "wrong")).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidCredentials));
        }
        let err = login(&state, credentials("a@x.com", "abc123")).await.unwrap_err();
        assert!(matches!(err, AppError::TooManyAttempts));
    }

    #[tokio::test]
    async fn authorize_rejects_missing_and_unknown_tokens() {
        let state = state();
        let store = state.store.as_ref();
        assert!(matches!(
            authorize(store, None).await,
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            authorize(store, Some("Bearer never-issued")).await,
            Err(AppError::Unauthenticated)
        ));
    }

    /// Serves reads from memory but cannot persist tokens.
    struct TokenWritesFail(crate::store::MemoryUserStore);

    #[async_trait::async_trait]
    impl UserStore for TokenWritesFail {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            self.0.find_by_email(email).await
        }
        async fn find_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
            self.0.find_by_token(token).await
        }
        async fn find_by_id(&self, id: uuid::Uuid) -> Result<Option<User>, StoreError> {
            self.0.find_by_id(id).await
        }
        async fn create(&self, new_user: crate::store::NewUser) -> Result<User, StoreError> {
            self.0.create(new_user).await
        }
        async fn update_token(&self, _id: uuid::Uuid, _token: &str) -> Result<User, StoreError> {
            Err(StoreError::Unavailable(anyhow::anyhow!("connection reset")))
        }
        async fn push_session(
            &self,
            id: uuid::Uuid,
            session: crate::store::NewGameSession,
        ) -> Result<User, StoreError> {
            self.0.push_session(id, session).await
        }
        async fn remove_session(
            &self,
            id: uuid::Uuid,
            session_id: uuid::Uuid,
        ) -> Result<User, StoreError> {
            self.0.remove_session(id, session_id).await
        }
    }

    #[tokio::test]
    async fn store_failure_during_login_surfaces_as_unavailable() {
        let state = AppState::from_parts(
            std::sync::Arc::new(TokenWritesFail(crate::store::MemoryUserStore::new())),
            std::sync::Arc::new(AppConfig::default()),
        );
        register(&state, registration("a@x.com", "abc123")).await.unwrap();

        let err = login(&state, credentials("a@x.com", "abc123")).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
        assert_eq!(err.public_message(), "Internal Server Error");
    }
}
