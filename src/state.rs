use std::sync::Arc;

use axum::extract::FromRef;
use tracing::warn;

use crate::auth::{
    jwt::JwtKeys,
    password::PasswordHasher,
    repo::{PgUserStore, UserStore},
};
use crate::blogs::repo::{BlogStore, PgBlogStore};
use crate::config::AppConfig;
use crate::projects::repo::{PgProjectStore, ProjectStore};
use crate::storage::{S3Storage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub hasher: PasswordHasher,
    pub users: Arc<dyn UserStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub blogs: Arc<dyn BlogStore>,
    pub storage: Arc<dyn StorageClient>,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl AppState {
    /// Connects to Postgres and S3, runs migrations.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        if config.jwt.insecure_default {
            warn!("JWT_SECRET is not set; using the insecure development secret");
        }

        let db = crate::db::connect(&config.database_url).await?;
        crate::db::migrate(&db).await?;

        let storage = Arc::new(S3Storage::new(&config.s3).await?) as Arc<dyn StorageClient>;

        Self::from_parts(
            Arc::new(config),
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(PgProjectStore::new(db.clone())),
            Arc::new(PgBlogStore::new(db)),
            storage,
        )
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        projects: Arc<dyn ProjectStore>,
        blogs: Arc<dyn BlogStore>,
        storage: Arc<dyn StorageClient>,
    ) -> anyhow::Result<Self> {
        let keys = JwtKeys::new(&config.jwt);
        let hasher = PasswordHasher::new(config.password_cost)?;
        Ok(Self {
            config,
            keys,
            hasher,
            users,
            projects,
            blogs,
            storage,
        })
    }
}
