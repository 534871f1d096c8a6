//! DID resolution orchestrator
//!
//! Resolution runs in fixed steps: parse the identifier, pick a path from
//! its anchor, verify the identity at inception along that path, then check
//! the name is still live and read its current key. Every step either
//! advances or fails with a typed error; nothing is retried.
mod anchored;
mod liveness;
mod migrated;

pub use liveness::{is_expired, STATUS_REVOKED};

use crate::config::NetworkConfig;
use crate::document::DidDocument;
use crate::error::{ResolutionError, ResolutionStep, ResolveResult};
use crate::fqn::Fqn;
use crate::identifier::{parse_did, DidKind, StacksDid};
use crate::metrics;
use crate::registry::RegistryClient;
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

/// Which verification path a DID resolves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionPath {
    OnChain,
    OffChain,
    Migrated,
}

impl ResolutionPath {
    /// Migration anchors take precedence over the address version
    pub fn select(did: &StacksDid) -> Self {
        if did.is_migrated() {
            return ResolutionPath::Migrated;
        }
        match did.kind {
            DidKind::OnChain => ResolutionPath::OnChain,
            DidKind::OffChain => ResolutionPath::OffChain,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPath::OnChain => "on-chain",
            ResolutionPath::OffChain => "off-chain",
            ResolutionPath::Migrated => "migrated",
        }
    }
}

impl fmt::Display for ResolutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name verified at inception, before the liveness check
#[derive(Debug, Clone)]
pub(crate) struct ResolvedName {
    pub fqn: Fqn,
    pub owner: String,
    pub public_key: String,
}

/// A successful resolution with the facts behind the document
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub did: String,
    pub path: ResolutionPath,
    pub name: String,
    /// Address the inception claim was verified against
    pub owner: String,
    /// Public key (hex) verified at inception
    pub inception_key: String,
    /// Public key (hex) published in the name's current zonefile
    pub current_key: String,
    pub document: DidDocument,
}

pub(crate) fn log_step(did: &StacksDid, step: ResolutionStep, fqn: &Fqn) {
    debug!(did = %did, step = %step, name = %fqn, "resolution step complete");
}

/// Resolves did:stack:v2 identifiers against a BNS registry
pub struct DidResolver<C> {
    client: C,
    network: NetworkConfig,
}

impl<C: RegistryClient> DidResolver<C> {
    pub fn new(client: C, network: NetworkConfig) -> Self {
        Self { client, network }
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Resolve a DID to its DID Document
    pub async fn resolve(&self, did: &str) -> ResolveResult<DidDocument> {
        self.resolve_with_metadata(did).await.map(|r| r.document)
    }

    /// Resolve several DIDs concurrently, preserving input order
    pub async fn resolve_many<S: AsRef<str>>(&self, dids: &[S]) -> Vec<ResolveResult<DidDocument>> {
        futures::future::join_all(dids.iter().map(|did| self.resolve(did.as_ref()))).await
    }

    /// Resolve a DID and keep the intermediate facts
    pub async fn resolve_with_metadata(&self, did: &str) -> ResolveResult<Resolution> {
        let started = Instant::now();
        let mut path = None;
        let result = self.run(did, &mut path).await;

        let path_label = path.map(|p| p.as_str()).unwrap_or("unparsed");
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.code(),
        };
        metrics::record_resolution(path_label, outcome, started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            warn!(did = %did, path = path_label, code = e.code(), error = %e, "resolution failed");
        }
        result
    }

    async fn run(&self, input: &str, path_out: &mut Option<ResolutionPath>) -> ResolveResult<Resolution> {
        let did = parse_did(input)?;
        debug!(did = %did, step = %ResolutionStep::IdentifierParsed, kind = %did.kind, deployment = %did.deployment, "identifier parsed");

        if did.deployment != self.network.deployment {
            return Err(ResolutionError::WrongNetwork {
                did: did.deployment,
                resolver: self.network.deployment,
            });
        }

        let path = ResolutionPath::select(&did);
        *path_out = Some(path);
        debug!(did = %did, step = %ResolutionStep::PathSelected, path = %path, "path selected");

        let resolved = match path {
            ResolutionPath::OnChain | ResolutionPath::OffChain => {
                anchored::resolve_anchored(&self.client, &did).await?
            }
            ResolutionPath::Migrated => migrated::resolve_migrated(&self.client, &did).await?,
        };

        let current_key = liveness::check_liveness(&self.client, &resolved).await?;
        if current_key != resolved.public_key {
            debug!(did = %did, name = %resolved.fqn, "key rotated since inception");
        }
        log_step(&did, ResolutionStep::LivenessChecked, &resolved.fqn);

        let did_string = did.to_string();
        let document = DidDocument::build(&did_string, &current_key)?;

        Ok(Resolution {
            did: did_string,
            path,
            name: resolved.fqn.to_string(),
            owner: resolved.owner,
            inception_key: resolved.public_key,
            current_key,
            document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::{Deployment, MAINNET_MIGRATION_TX_ID};

    fn did(kind: DidKind, tx: &str) -> StacksDid {
        StacksDid {
            address: "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7".to_string(),
            anchor_tx_id: tx.to_string(),
            kind,
            deployment: Deployment::Main,
        }
    }

    #[test]
    fn test_path_selection() {
        assert_eq!(ResolutionPath::select(&did(DidKind::OnChain, "ab")), ResolutionPath::OnChain);
        assert_eq!(ResolutionPath::select(&did(DidKind::OffChain, "ab")), ResolutionPath::OffChain);
        assert_eq!(
            ResolutionPath::select(&did(DidKind::OnChain, MAINNET_MIGRATION_TX_ID)),
            ResolutionPath::Migrated
        );
        assert_eq!(
            ResolutionPath::select(&did(DidKind::OffChain, MAINNET_MIGRATION_TX_ID)),
            ResolutionPath::Migrated
        );
    }

    #[test]
    fn test_path_labels() {
        assert_eq!(ResolutionPath::OnChain.to_string(), "on-chain");
        assert_eq!(
            serde_json::to_value(ResolutionPath::Migrated).unwrap(),
            serde_json::json!("migrated")
        );
    }
}
