/// Unified error types for the did:stack:v2 resolver
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::identifier::{Deployment, DidKind};

/// Step of the resolution state machine an error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStep {
    IdentifierParsed,
    PathSelected,
    OperationValidated,
    ZonefileResolved,
    ClaimVerified,
    LivenessChecked,
}

impl fmt::Display for ResolutionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionStep::IdentifierParsed => "identifier-parsed",
            ResolutionStep::PathSelected => "path-selected",
            ResolutionStep::OperationValidated => "operation-validated",
            ResolutionStep::ZonefileResolved => "zonefile-resolved",
            ResolutionStep::ClaimVerified => "claim-verified",
            ResolutionStep::LivenessChecked => "liveness-checked",
        };
        f.write_str(name)
    }
}

/// Failures reported by a registry client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The node answered, but the requested entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The request never produced a usable answer
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with something that could not be decoded
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl RegistryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound(_))
    }
}

/// Terminal failures of a single DID resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("invalid DID format: {0}")]
    InvalidDidFormat(String),

    #[error("unsupported address version {version} in {address}")]
    UnsupportedAddressVersion { address: String, version: u8 },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("DID belongs to the {did} deployment, resolver is bound to {resolver}")]
    WrongNetwork { did: Deployment, resolver: Deployment },

    #[error("anchor transaction {0} not found")]
    TransactionNotFound(String),

    #[error("anchor transaction {tx_id} has status {status}, expected success")]
    TransactionNotSuccessful { tx_id: String, status: String },

    #[error("anchor transaction {0} is not a contract call")]
    NotAContractCall(String),

    #[error("anchor transaction calls {actual}, expected registry contract {expected}")]
    WrongRegistryContract { expected: String, actual: String },

    #[error("registry function {function} is not allowed for {kind} DIDs")]
    DisallowedOperation { function: String, kind: DidKind },

    #[error("missing registry call arguments: {0}")]
    MissingArguments(String),

    #[error("malformed registry call arguments: {0}")]
    MalformedArguments(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("malformed zonefile: {0}")]
    MalformedZonefile(String),

    #[error("zonefile origin {actual} does not match {expected}")]
    OriginMismatch { expected: String, actual: String },

    #[error("zonefile for {0} has no URI record")]
    MissingUriRecord(String),

    #[error("no subdomain owned by {0}")]
    NoSubdomainForOwner(String),

    #[error("no subdomain named {0}")]
    NoSuchSubdomain(String),

    #[error("address {0} owns no on-chain name")]
    NoOwnedName(String),

    #[error("address {address} owns {} names, expected exactly one", .names.len())]
    AmbiguousOwnership { address: String, names: Vec<String> },

    #[error("migrated identity invalid: {0}")]
    MigratedIdentityInvalid(String),

    #[error("invalid signed claim: {0}")]
    InvalidSignedClaim(String),

    #[error("signed claim at {url} unavailable: {source}")]
    ClaimUnavailable { url: String, source: RegistryError },

    #[error("DID deactivated: {0}")]
    DidDeactivated(String),

    #[error("DID expired: name expired at block {expire_block}, chain tip is {current_block}")]
    DidExpired { expire_block: u64, current_block: u64 },

    #[error("registry lookup failed at {step}: {source}")]
    Registry { step: ResolutionStep, source: RegistryError },
}

impl ResolutionError {
    pub(crate) fn registry(step: ResolutionStep) -> impl FnOnce(RegistryError) -> Self {
        move |source| ResolutionError::Registry { step, source }
    }

    /// Universal resolver error code for this failure
    pub fn code(&self) -> &'static str {
        match self {
            ResolutionError::InvalidDidFormat(_)
            | ResolutionError::UnsupportedAddressVersion { .. }
            | ResolutionError::InvalidAddress(_)
            | ResolutionError::WrongNetwork { .. } => "invalidDid",
            ResolutionError::DidDeactivated(_) | ResolutionError::DidExpired { .. } => {
                "deactivated"
            }
            ResolutionError::TransactionNotFound(_)
            | ResolutionError::NoSubdomainForOwner(_)
            | ResolutionError::NoSuchSubdomain(_)
            | ResolutionError::NoOwnedName(_) => "notFound",
            ResolutionError::Registry { source, .. } if source.is_not_found() => "notFound",
            ResolutionError::Registry { .. } | ResolutionError::ClaimUnavailable { .. } => {
                "registryUnavailable"
            }
            _ => "invalidAnchor",
        }
    }
}

/// Result type alias for resolution operations
pub type ResolveResult<T> = Result<T, ResolutionError>;

/// Error type for the resolver service binary
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resolution errors
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Universal resolver error response format
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ServiceError::Resolution(err) => {
                let status = match err.code() {
                    "invalidDid" => StatusCode::BAD_REQUEST,
                    "notFound" => StatusCode::NOT_FOUND,
                    "deactivated" => StatusCode::GONE,
                    "registryUnavailable" => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, err.code(), err.to_string())
            }
            ServiceError::Config(_) | ServiceError::Io(_) | ServiceError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internalError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
