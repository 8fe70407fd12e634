//! Application state and composition.

use std::sync::Arc;

use kidquest_domain::ChildId;

use crate::infrastructure::{
    api_client::HttpApiClient,
    clock::SystemClock,
    config::{BackendKind, EngineConfig},
    memory::InMemoryBackend,
    ports::{ApiError, ClockPort, ProfileRepo, ProgressRepo, QuestRepo},
};
use crate::simulation::WorldEvents;
use crate::use_cases::AdventureSession;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The HTTP backend has no seed child to fall back on.
    #[error("KIDQUEST_CHILD_ID is required for the http backend")]
    MissingChildId,

    #[error("Backend setup failed: {0}")]
    Backend(#[from] ApiError),
}

/// Main application state.
///
/// Holds the backend ports and the child the session plays as.
pub struct App {
    pub repositories: Repositories,
    pub config: EngineConfig,
    pub child_id: ChildId,
}

/// Port traits injected directly.
#[derive(Clone)]
pub struct Repositories {
    pub quest: Arc<dyn QuestRepo>,
    pub progress: Arc<dyn ProgressRepo>,
    pub profile: Arc<dyn ProfileRepo>,
}

impl Repositories {
    /// All three repos backed by one adapter.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: QuestRepo + ProgressRepo + ProfileRepo + 'static,
    {
        Self {
            quest: backend.clone(),
            progress: backend.clone(),
            profile: backend,
        }
    }
}

impl App {
    pub fn new(repositories: Repositories, config: EngineConfig, child_id: ChildId) -> Self {
        Self {
            repositories,
            config,
            child_id,
        }
    }

    /// Wire the backend named by the config.
    pub fn from_config(config: EngineConfig) -> Result<Self, AppError> {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());

        match config.backend {
            BackendKind::Memory => {
                let backend = InMemoryBackend::seeded(clock.clone())?;
                let child_id = config
                    .child_id
                    .or_else(|| backend.seed_child())
                    .ok_or(AppError::MissingChildId)?;
                tracing::info!(child_id = %child_id, "Using in-memory backend");
                let repositories = Repositories::from_backend(Arc::new(backend));
                Ok(Self::new(repositories, config, child_id))
            }
            BackendKind::Http => {
                let child_id = config.child_id.ok_or(AppError::MissingChildId)?;
                let client = HttpApiClient::from_config(&config);
                tracing::info!(api_url = %config.api_url, child_id = %child_id, "Using HTTP backend");
                let repositories = Repositories::from_backend(Arc::new(client));
                Ok(Self::new(repositories, config, child_id))
            }
        }
    }

    /// A fresh play session for the configured child. Call `start()` on it.
    pub fn new_session(&self) -> (AdventureSession, WorldEvents) {
        AdventureSession::new(
            self.repositories.quest.clone(),
            self.repositories.progress.clone(),
            self.repositories.profile.clone(),
            self.child_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_falls_back_to_seed_child() {
        let app = App::from_config(EngineConfig::default()).expect("app");
        let seeded: ChildId = "7b1f3c2e-5d4a-4e8b-9a61-2c3d4e5f6a70".parse().expect("id");
        assert_eq!(app.child_id, seeded);
    }

    #[test]
    fn http_backend_needs_a_child() {
        let config = EngineConfig {
            backend: BackendKind::Http,
            ..EngineConfig::default()
        };
        assert!(matches!(App::from_config(config), Err(AppError::MissingChildId)));
    }
}
