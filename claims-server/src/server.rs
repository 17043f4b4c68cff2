use claims_service::{ClaimStore, ClaimsConfig, ClaimsResult, InMemoryClaimStore, PgClaimStore};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ClaimStore>,
    pub config: Arc<ClaimsConfig>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn ClaimStore>, config: ClaimsConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Connect to Postgres and migrate when a database URL is configured,
    /// otherwise fall back to the in-memory store
    ///
    /// # Errors
    ///
    /// Fails when the database is unreachable or a migration fails.
    pub async fn from_config(config: ClaimsConfig) -> ClaimsResult<Self> {
        let store: Arc<dyn ClaimStore> = match config.database_url.as_deref() {
            Some(url) => {
                let store = PgClaimStore::connect(url).await?;
                store.migrate().await?;
                Arc::new(store)
            }
            None => {
                warn!("No database configured, claims are kept in memory only");
                Arc::new(InMemoryClaimStore::new())
            }
        };

        info!(backend = store_backend(&config), "Claim store ready");
        Ok(Self::new(store, config))
    }

    pub fn backend(&self) -> &'static str {
        store_backend(&self.config)
    }
}

fn store_backend(config: &ClaimsConfig) -> &'static str {
    if config.database_url.is_some() {
        "postgres"
    } else {
        "memory"
    }
}
