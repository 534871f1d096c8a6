/// Universal resolver driver endpoint
///
/// `GET /1.0/identifiers/{did}` resolves a did:stack:v2 identifier and
/// returns the DID Document wrapped in resolution metadata.
use crate::{
    context::AppContext,
    document::DidDocument,
    error::ServiceError,
    metrics,
    resolver::Resolution,
};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Route label used for request metrics
const ROUTE: &str = "identifiers";

pub const RESOLUTION_CONTEXT: &str = "https://w3id.org/did-resolution/v1";

pub const DID_CONTENT_TYPE: &str = "application/did+ld+json";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResponse {
    #[serde(rename = "@context")]
    pub context: String,
    pub did_document: DidDocument,
    pub did_resolution_metadata: ResolutionMetadata,
    pub did_document_metadata: DocumentMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMetadata {
    pub content_type: String,
    /// Milliseconds spent resolving
    pub duration: u64,
    pub path: String,
    /// BNS name (or subdomain) the DID resolved through
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub owner: String,
    /// Whether the current key differs from the key at inception
    pub key_rotated: bool,
}

impl ResolutionResponse {
    fn new(resolution: Resolution, duration_ms: u64) -> Self {
        let key_rotated = resolution.current_key != resolution.inception_key;
        Self {
            context: RESOLUTION_CONTEXT.to_string(),
            did_resolution_metadata: ResolutionMetadata {
                content_type: DID_CONTENT_TYPE.to_string(),
                duration: duration_ms,
                path: resolution.path.to_string(),
                name: resolution.name,
            },
            did_document_metadata: DocumentMetadata {
                owner: resolution.owner,
                key_rotated,
            },
            did_document: resolution.document,
        }
    }
}

/// Build identifier routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/1.0/identifiers/:did", get(resolve_identifier))
}

/// Resolve a DID
pub async fn resolve_identifier(State(ctx): State<AppContext>, Path(did): Path<String>) -> Response {
    let started = Instant::now();

    let response = match ctx.resolver.resolve_with_metadata(&did).await {
        Ok(resolution) => {
            let duration_ms = started.elapsed().as_millis() as u64;
            Json(ResolutionResponse::new(resolution, duration_ms)).into_response()
        }
        Err(e) => ServiceError::from(e).into_response(),
    };

    metrics::record_http_request(ROUTE, response.status().as_u16());
    response
}
