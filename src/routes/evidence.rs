//! Evidence download endpoint
//!
//! `GET /evidence/{key}` serves a file from the evidence vault. Keys are
//! content hashes, so responses are immutable.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

use crate::evidence::content_type_for;
use crate::server::AppState;
use crate::types::HrmError;

pub async fn serve_evidence(state: &AppState, key: &str) -> Result<Response<Full<Bytes>>, HrmError> {
    let data = state
        .evidence
        .load(key)
        .await?
        .ok_or_else(|| HrmError::NotFound("Evidence not found".to_string()))?;

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type_for(key))
        .header("Cache-Control", "public, max-age=31536000, immutable")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(data))
        .map_err(|e| HrmError::Internal(format!("Failed to build response: {}", e)))
}
