//! OCSP request handlers
//!
//! POST carries the DER request as the body. GET carries it base64-encoded
//! in the path; any GET path containing "health" is routed to the probe.

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::AppState;
use crate::api::{error::OcspError, health};
use crate::core::{BuiltResponse, RequestSource, CACHE_CONTROL};

/// POST / (and any other path)
pub async fn ocsp_post(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, OcspError> {
    let body = body?;
    respond(&state, RequestSource::Post(&body)).await
}

/// GET /{base64 request}
pub async fn ocsp_get(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, OcspError> {
    let Path(encoded) = path?;
    if encoded.contains("health") {
        return Ok(health(State(state)).await.into_response());
    }
    respond(&state, RequestSource::Get(&encoded)).await
}

/// GET / carries an empty request
pub async fn ocsp_get_root(State(state): State<Arc<AppState>>) -> Result<Response, OcspError> {
    respond(&state, RequestSource::Get("")).await
}

async fn respond(state: &AppState, source: RequestSource<'_>) -> Result<Response, OcspError> {
    let identity = state
        .identity
        .current()
        .ok_or_else(|| OcspError::Internal("responder identity not loaded".into()))?;

    let request = state.verifier.verify(source, identity.ca_cert())?;
    let built = state
        .builder
        .build(&request, &identity, state.store.as_ref())
        .await?;

    Ok(ocsp_response(built))
}

fn ocsp_response(built: BuiltResponse) -> Response {
    let headers = [
        (header::CONTENT_TYPE, "application/ocsp-response".to_string()),
        (header::LAST_MODIFIED, built.last_modified()),
        (header::EXPIRES, built.expires()),
        (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
        (header::ETAG, built.etag()),
    ];
    (StatusCode::OK, headers, built.bytes).into_response()
}
