/// Configuration management for the did:stack:v2 resolver
use crate::error::{ServiceError, ServiceResult};
use crate::identifier::Deployment;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default Stacks node API for mainnet
pub const DEFAULT_MAINNET_API_URL: &str = "https://stacks-node-api.mainnet.stacks.co";

/// Default Stacks node API for testnet
pub const DEFAULT_TESTNET_API_URL: &str = "https://stacks-node-api.testnet.stacks.co";

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "stacks_did_resolver=debug,tower_http=debug";

/// Main resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub service: ServiceConfig,
    pub network: NetworkConfig,
    pub http: HttpClientConfig,
    pub logging: LoggingConfig,
}

/// HTTP surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Network the resolver is bound to
///
/// Threaded explicitly into every registry call; nothing reads the network
/// from ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub deployment: Deployment,
    /// Base URL of the Stacks node API
    pub api_url: String,
}

impl NetworkConfig {
    pub fn new(deployment: Deployment, api_url: impl Into<String>) -> Self {
        Self {
            deployment,
            api_url: api_url.into(),
        }
    }

    pub fn mainnet() -> Self {
        Self::new(Deployment::Main, DEFAULT_MAINNET_API_URL)
    }

    pub fn testnet() -> Self {
        Self::new(Deployment::Test, DEFAULT_TESTNET_API_URL)
    }

    /// BNS contract id for this deployment
    pub fn registry_contract(&self) -> &'static str {
        self.deployment.registry_contract()
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl HttpClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: format!("stacks-did-resolver/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl ResolverConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ServiceResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("DID_RESOLVER_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("DID_RESOLVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ServiceError::Config("Invalid port number".to_string()))?;
        let version = env::var("DID_RESOLVER_VERSION")
            .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

        let deployment: Deployment = env::var("STACKS_NETWORK")
            .unwrap_or_else(|_| "mainnet".to_string())
            .parse()
            .map_err(ServiceError::Config)?;
        let api_url = env::var("STACKS_API_URL").unwrap_or_else(|_| match deployment {
            Deployment::Main => DEFAULT_MAINNET_API_URL.to_string(),
            Deployment::Test => DEFAULT_TESTNET_API_URL.to_string(),
        });

        let defaults = HttpClientConfig::default();
        let timeout_secs = env::var("DID_RESOLVER_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| defaults.timeout_secs.to_string())
            .parse()
            .unwrap_or(defaults.timeout_secs);
        let user_agent = env::var("DID_RESOLVER_USER_AGENT").unwrap_or(defaults.user_agent);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
        let log_json = env::var("DID_RESOLVER_LOG_JSON")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(ResolverConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            network: NetworkConfig {
                deployment,
                api_url: api_url.trim_end_matches('/').to_string(),
            },
            http: HttpClientConfig {
                timeout_secs,
                user_agent,
            },
            logging: LoggingConfig {
                level: log_level,
                json: log_json,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ServiceResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ServiceError::Config("Hostname cannot be empty".to_string()));
        }

        if !self.network.api_url.starts_with("http://") && !self.network.api_url.starts_with("https://") {
            return Err(ServiceError::Config(format!(
                "STACKS_API_URL must be an http(s) URL, got '{}'",
                self.network.api_url
            )));
        }

        if self.http.timeout_secs == 0 {
            return Err(ServiceError::Config(
                "HTTP timeout must be at least one second".to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.hostname, self.service.port)
    }
}
