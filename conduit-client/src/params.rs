//! Request parameters forwarded to the remote engine

use reqwest::Method;
use reqwest::header::HeaderMap;

/// Everything the engine client needs from an inbound request
///
/// Values are owned so that a clone is an independent snapshot: concurrent
/// calls each get their own copy instead of sharing a request.
#[derive(Debug, Clone)]
pub struct HttpParameters {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    /// Query pairs plus url-encoded form pairs from the body
    pub form: Vec<(String, String)>,
    /// Path and query exactly as received
    pub url: String,
}

impl HttpParameters {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            body: Vec::new(),
            form: Vec::new(),
            url: url.into(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Raw query string of the inbound URL, without the leading `?`
    pub fn query(&self) -> Option<&str> {
        self.url
            .split_once('?')
            .map(|(_, query)| query)
            .filter(|query| !query.is_empty())
    }

    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Identifies a pipeline, or one branch of a multi-branch pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineScope {
    pub project: String,
    pub pipeline: String,
    pub branch: Option<String>,
}

impl PipelineScope {
    pub fn pipeline(project: impl Into<String>, pipeline: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            pipeline: pipeline.into(),
            branch: None,
        }
    }

    pub fn branch(
        project: impl Into<String>,
        pipeline: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            pipeline: pipeline.into(),
            branch: Some(branch.into()),
        }
    }
}
