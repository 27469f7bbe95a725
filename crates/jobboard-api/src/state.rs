//! Application state.

use std::sync::Arc;

use jobboard_firestore::{FirestoreStore, InMemoryStore, JobBoardStore};
use tracing::{info, warn};

use crate::auth::TokenVerifier;
use crate::config::{ApiConfig, StoreBackend};
use crate::services::{ApplicationService, CompanyService, JobService, UserService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn JobBoardStore>,
    pub verifier: Arc<TokenVerifier>,
    pub applications: ApplicationService,
    pub jobs: JobService,
    pub companies: CompanyService,
    pub users: UserService,
}

impl AppState {
    /// Create state over an existing store.
    pub fn with_store(config: ApiConfig, store: Arc<dyn JobBoardStore>) -> Self {
        let verifier = Arc::new(TokenVerifier::new(&config.jwt_secret));

        Self {
            applications: ApplicationService::new(Arc::clone(&store)),
            jobs: JobService::new(Arc::clone(&store))
                .with_error_details(!config.is_production()),
            companies: CompanyService::new(Arc::clone(&store)),
            users: UserService::new(Arc::clone(&store)),
            verifier,
            store,
            config,
        }
    }

    /// Create new application state, connecting the configured store.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;

        let store: Arc<dyn JobBoardStore> = match config.store_backend {
            StoreBackend::Firestore => {
                let store = FirestoreStore::from_env().await?;
                info!("Using Firestore entity store");
                Arc::new(store)
            }
            StoreBackend::Memory => {
                warn!("Using in-memory entity store; data is lost on restart");
                Arc::new(InMemoryStore::new())
            }
        };

        Ok(Self::with_store(config, store))
    }
}
