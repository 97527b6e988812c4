use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::users::{memory::MemoryUserStore, repo::PgUserStore, repo::UserStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let users = match config.database_url.as_deref() {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; users are kept in memory only");
                Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>
            }
        };

        if config.guard.bypass {
            tracing::warn!("access guard bypass enabled; admin and owner checks are skipped");
        }

        Ok(Self::from_parts(users, config))
    }

    pub fn from_parts(users: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }

    /// In-memory state with a fixed JWT secret and the guard enforced.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test-secret".into(),
                issuer: Some("test-issuer".into()),
                audience: Some("test-aud".into()),
            },
            guard: crate::config::GuardConfig { bypass: false },
        });
        Self::from_parts(Arc::new(MemoryUserStore::new()), config)
    }
}
