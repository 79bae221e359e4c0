use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::rate_limit::LoginThrottle;
use crate::config::AppConfig;
use crate::store::{MemoryUserStore, PgUserStore, UserStore};

/// Everything a request handler needs. Built once per server (or per test)
/// and cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
    pub throttle: LoginThrottle,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let store = match &config.database_url {
            Some(url) => {
                let pg = PgUserStore::connect(url, config.db_max_connections).await?;
                pg.migrate().await?;
                info!("using postgres user store");
                Arc::new(pg) as Arc<dyn UserStore>
            }
            None => {
                warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
                Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>
            }
        };

        Ok(Self::from_parts(store, Arc::new(config)))
    }

    pub fn from_parts(store: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        let throttle = LoginThrottle::from_config(&config.auth);
        Self {
            store,
            config,
            throttle,
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_parts(Arc::new(MemoryUserStore::new()), Arc::new(config))
    }
}
