/// Fewest random bytes a bearer token may carry.
pub const MIN_TOKEN_BYTES: usize = 26;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub token_bytes: usize,
    pub max_failed_logins: u32,
    pub lockout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_bytes: MIN_TOKEN_BYTES,
            max_failed_logins: 5,
            lockout_secs: 5 * 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            db_max_connections: 10,
            host: "0.0.0.0".into(),
            port: 8080,
            auth: AuthConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let auth = AuthConfig {
            token_bytes: env_parse::<usize>("AUTH_TOKEN_BYTES")
                .unwrap_or(defaults.auth.token_bytes)
                .max(MIN_TOKEN_BYTES),
            max_failed_logins: env_parse("AUTH_MAX_FAILED_LOGINS")
                .unwrap_or(defaults.auth.max_failed_logins),
            lockout_secs: env_parse("AUTH_LOCKOUT_SECS").unwrap_or(defaults.auth.lockout_secs),
        };

        Ok(Self {
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS")
                .unwrap_or(defaults.db_max_connections),
            host: std::env::var("APP_HOST").unwrap_or(defaults.host),
            port: env_parse("APP_PORT").unwrap_or(defaults.port),
            auth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_token_entropy_floor() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.auth.token_bytes, MIN_TOKEN_BYTES);
        assert_eq!(cfg.auth.max_failed_logins, 5);
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.port, 8080);
    }
}
