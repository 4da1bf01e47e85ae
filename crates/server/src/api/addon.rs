//! Stremio addon protocol handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, warn};

use magnetar_core::StreamDescriptor;

use crate::state::AppState;

const ADDON_ID: &str = "org.magnetar.streams";

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: String,
    pub version: String,
    pub name: String,
    pub description: String,
    pub resources: Vec<String>,
    pub types: Vec<String>,
    pub id_prefixes: Vec<String>,
    pub catalogs: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct StreamsResponse {
    pub streams: Vec<StreamDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Addon manifest.
pub async fn manifest(State(state): State<Arc<AppState>>) -> Json<Manifest> {
    let branding = state.resolver().branding();
    Json(Manifest {
        id: ADDON_ID.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        name: branding.to_string(),
        description: format!("{} resolves movies and episodes to torrent and debrid streams", branding),
        resources: vec!["stream".to_string()],
        types: vec!["movie".to_string(), "series".to_string()],
        id_prefixes: vec!["tt".to_string()],
        catalogs: Vec::new(),
    })
}

/// Streams for one title or episode.
///
/// Bad identifiers are rejected with 400. Backend failures answer with an
/// empty list, so clients show "no streams" rather than an error.
pub async fn streams(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> Response {
    let id = id.strip_suffix(".json").unwrap_or(&id);

    match state.resolver().resolve(&kind, id).await {
        Ok(streams) => {
            debug!(kind = %kind, id = %id, count = streams.len(), "Returning streams");
            Json(StreamsResponse { streams }).into_response()
        }
        Err(e) if e.is_invalid_request() => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(kind = %kind, id = %id, error = %e, "Stream resolution failed");
            Json(StreamsResponse {
                streams: Vec::new(),
            })
            .into_response()
        }
    }
}
