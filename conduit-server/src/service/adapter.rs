//! Request adapter
//!
//! Turns an inbound HTTP request into the [`HttpParameters`] the engine
//! client forwards, and rewrites input-step bodies the engine would reject.

use axum::extract::Query;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, Uri};
use conduit_client::HttpParameters;
use conduit_core::dto::run::InputStepPayload;

use super::error::{OperatorError, Result};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The parts of an inbound request the engine client needs
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub uri: Uri,
    pub body: Vec<u8>,
}

impl InboundRequest {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            uri,
            body: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers
            .insert(name, axum::http::HeaderValue::from_static(value));
        self
    }

    fn is_form(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with(FORM_CONTENT_TYPE))
    }
}

/// Snapshot of `req` for the engine client
pub fn to_http_parameters(req: &InboundRequest) -> HttpParameters {
    let url = req
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri.path().to_string());

    let mut form = parse_pairs(req.uri.query().unwrap_or_default());
    if req.is_form() {
        form.extend(parse_pairs(&String::from_utf8_lossy(&req.body)));
    }

    HttpParameters {
        method: req.method.clone(),
        headers: req.headers.clone(),
        body: req.body.clone(),
        form,
        url,
    }
}

/// Url-encoded `key=value` pairs; malformed input yields no pairs
fn parse_pairs(encoded: &str) -> Vec<(String, String)> {
    if encoded.is_empty() {
        return Vec::new();
    }
    let uri: Uri = match format!("/?{}", encoded).parse() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::debug!("Ignoring malformed form data: {}", e);
            return Vec::new();
        }
    };
    Query::<Vec<(String, String)>>::try_from_uri(&uri)
        .map(|Query(pairs)| pairs)
        .unwrap_or_default()
}

/// Fills in the empty `parameters` list the engine needs to proceed an input
///
/// Abort requests and requests that already carry parameters are
/// re-serialized unchanged.
pub fn rewrite_input_body(body: &[u8]) -> Result<Vec<u8>> {
    let mut payload: InputStepPayload = serde_json::from_slice(body)
        .map_err(|e| OperatorError::Validation(format!("invalid input step body: {}", e)))?;

    if payload.needs_empty_parameters() {
        payload.parameters = Some(Vec::new());
    }

    Ok(serde_json::to_vec(&payload)?)
}
