//! Application state wiring all services together.
//!
//! AppState holds the concrete instances used by both CLI and REST API:
//! the shared OpenRouter backend, the SQLite game repository, the live
//! session registry, and the generation configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use draftfun_core::backend::GenerationBackend;
use draftfun_core::session::GenerationSession;
use draftfun_core::supervisor::StreamSupervisor;
use draftfun_infra::config::{
    api_key_from_env, default_data_dir, default_database_url, load_generation_config,
};
use draftfun_infra::llm::openrouter::OpenRouterBackend;
use draftfun_infra::sqlite::game::SqliteGameRepository;
use draftfun_infra::sqlite::pool::DatabasePool;
use draftfun_types::config::GenerationConfig;
use draftfun_types::session::EngineVariant;

/// One live generation session plus a cancel handle that works without
/// taking the session lock.
#[derive(Clone)]
pub struct SessionEntry {
    pub session: Arc<Mutex<GenerationSession>>,
    pub cancel: StreamSupervisor,
}

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub games: Arc<SqliteGameRepository>,
    /// `None` when `OPENROUTER_API_KEY` is absent; generation endpoints
    /// surface that as an error while the catalog remains usable.
    pub backend: Option<Arc<dyn GenerationBackend>>,
    pub config: GenerationConfig,
    pub sessions: Arc<DashMap<Uuid, SessionEntry>>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to DB, load config,
    /// wire the backend.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = PathBuf::from(default_data_dir());

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let db_url = format!("{}?mode=rwc", default_database_url());
        let db_pool = DatabasePool::new(&db_url).await?;
        let games = Arc::new(SqliteGameRepository::new(db_pool.clone()));

        let config = load_generation_config(&data_dir).await;

        let backend: Option<Arc<dyn GenerationBackend>> = match api_key_from_env() {
            Some(api_key) => Some(Arc::new(OpenRouterBackend::new(api_key))),
            None => {
                tracing::warn!(
                    "OPENROUTER_API_KEY not set; generation is disabled, catalog still works"
                );
                None
            }
        };

        Ok(Self {
            games,
            backend,
            config,
            sessions: Arc::new(DashMap::new()),
            data_dir,
            db_pool,
        })
    }

    /// Create a new generation session for the given engine variant and
    /// register it. Returns its id.
    pub fn create_session(&self, variant: EngineVariant) -> anyhow::Result<Uuid> {
        let backend = self
            .backend
            .clone()
            .ok_or_else(|| anyhow::anyhow!("OPENROUTER_API_KEY is not set"))?;
        let engine = self.config.engine(variant).clone();
        let session = GenerationSession::new(
            variant,
            engine,
            backend,
            Duration::from_secs(self.config.stream_idle_timeout_secs),
        );
        let id = session.id();
        let cancel = session.cancel_handle();
        self.sessions.insert(
            id,
            SessionEntry {
                session: Arc::new(Mutex::new(session)),
                cancel,
            },
        );
        Ok(id)
    }

    /// Look up a live session by id.
    pub fn session(&self, id: &Uuid) -> Option<SessionEntry> {
        self.sessions.get(id).map(|entry| entry.clone())
    }

    /// Cancel (if in flight) and drop a session. Returns whether it
    /// existed.
    pub fn remove_session(&self, id: &Uuid) -> bool {
        match self.sessions.remove(id) {
            Some((_, entry)) => {
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }
}
