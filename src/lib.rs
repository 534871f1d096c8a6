//! did:stack:v2 DID resolver
//!
//! Resolves `did:stack:v2` identifiers against the BNS registry on Stacks
//! and produces W3C DID Documents. The library half is usable on its own
//! with any [`RegistryClient`]; the binary wraps it in a universal resolver
//! driver.

pub mod address;
pub mod api;
pub mod claim;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod fqn;
pub mod identifier;
pub mod metrics;
pub mod registry;
pub mod resolver;
pub mod server;
pub mod transaction;
pub mod zonefile;

pub use config::{HttpClientConfig, NetworkConfig, ResolverConfig};
pub use context::AppContext;
pub use document::DidDocument;
pub use error::{RegistryError, ResolutionError, ResolveResult, ServiceError, ServiceResult};
pub use fqn::Fqn;
pub use identifier::{Deployment, DidKind, StacksDid};
pub use registry::{RegistryClient, StacksApiClient};
pub use resolver::{DidResolver, Resolution, ResolutionPath};

use error::ResolutionStep;

/// Resolve a DID against the public Stacks node API for `network`
///
/// Builds a fresh HTTP client per call. Long-lived callers should hold a
/// [`DidResolver`] instead.
pub async fn resolve(did: &str, network: NetworkConfig) -> ResolveResult<DidDocument> {
    let client = StacksApiClient::from_config(&network, &HttpClientConfig::default())
        .map_err(ResolutionError::registry(ResolutionStep::IdentifierParsed))?;
    DidResolver::new(client, network).resolve(did).await
}
