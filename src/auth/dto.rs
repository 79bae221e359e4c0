use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{GameSession, Name, User};

/// Request body for user registration. Fields are optional so a missing one
/// can be reported by name.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public projection of a user, returned by login, registration and every
/// authenticated endpoint. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedIdentity {
    pub id: Uuid,
    pub email: String,
    /// Unix milliseconds.
    pub created_at: i64,
    pub name: Name,
    pub sessions: Vec<GameSession>,
    pub token: Option<String>,
}

impl From<User> for AuthenticatedIdentity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: (user.created_at.unix_timestamp_nanos() / 1_000_000) as i64,
            name: user.name,
            sessions: user.sessions,
            token: user.token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn identity_serialization_omits_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            created_at: OffsetDateTime::from_unix_timestamp(1_500_000_000).unwrap(),
            token: Some("abcd".into()),
            name: Name {
                first_name: "Matt".into(),
                last_name: "Long".into(),
            },
            sessions: vec![],
        };

        let json = serde_json::to_value(AuthenticatedIdentity::from(user)).unwrap();
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["token"], "abcd");
        assert_eq!(json["createdAt"], 1_500_000_000_000i64);
        assert_eq!(json["name"]["firstName"], "Matt");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn register_request_reads_camel_case() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"email":"a@x.com","password":"abc123","firstName":"Matt","lastName":"Long"}"#,
        )
        .unwrap();
        assert_eq!(req.first_name.as_deref(), Some("Matt"));
        assert_eq!(req.last_name.as_deref(), Some("Long"));
    }
}
