/// Application context and dependency injection
use crate::{
    config::ResolverConfig,
    error::{ServiceError, ServiceResult},
    registry::{RegistryClient, StacksApiClient},
    resolver::DidResolver,
};
use std::sync::Arc;
use std::time::Instant;

/// Registry client shared by every request
pub type SharedRegistry = Arc<dyn RegistryClient>;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ResolverConfig>,
    pub resolver: Arc<DidResolver<SharedRegistry>>,
    pub started_at: Instant,
}

impl AppContext {
    /// Create a new application context backed by the configured Stacks node
    pub fn new(config: ResolverConfig) -> ServiceResult<Self> {
        config.validate()?;

        let client = StacksApiClient::from_config(&config.network, &config.http)
            .map_err(|e| ServiceError::Config(format!("Failed to build registry client: {}", e)))?;

        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Create a context around an existing registry client
    pub fn with_client(config: ResolverConfig, client: SharedRegistry) -> Self {
        let resolver = DidResolver::new(client, config.network.clone());
        Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            started_at: Instant::now(),
        }
    }

    /// Seconds since the context was created
    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
