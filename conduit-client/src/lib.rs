//! Conduit Remote Engine Client
//!
//! A type-safe HTTP client for the remote CI engine (a Jenkins server with the
//! Blue Ocean REST API).
//!
//! The [`RemoteEngine`] trait is the seam the server depends on; [`JenkinsClient`]
//! is the reqwest implementation. Every call takes an [`HttpParameters`]
//! snapshot of the inbound request so that method, headers (including the
//! caller's credentials), body and query are forwarded as received.
//!
//! # Example
//!
//! ```no_run
//! use conduit_client::{HttpParameters, JenkinsClient, PipelineScope, RemoteEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = JenkinsClient::new("http://localhost:8080/jenkins");
//!
//!     let scope = PipelineScope::pipeline("demo", "build");
//!     let nodes = client
//!         .get_run_nodes(&scope, "1", HttpParameters::get("/nodes"))
//!         .await?;
//!
//!     println!("Run has {} nodes", nodes.len());
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod params;
mod paths;

// Re-export commonly used types
pub use engine::{RawResponse, RemoteEngine};
pub use error::{ClientError, Result};
pub use params::{HttpParameters, PipelineScope};

use reqwest::header::{CONNECTION, CONTENT_LENGTH, HOST, HeaderMap, TRANSFER_ENCODING};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for the remote engine
#[derive(Debug, Clone)]
pub struct JenkinsClient {
    /// Base URL of the engine (e.g., "http://localhost:8080/jenkins")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl JenkinsClient {
    /// Create a new engine client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the engine (e.g., "http://localhost:8080/jenkins")
    ///
    /// # Example
    /// ```
    /// use conduit_client::JenkinsClient;
    ///
    /// let client = JenkinsClient::new("http://localhost:8080/jenkins");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new engine client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Create a new engine client whose requests time out after `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Get the base URL of the engine
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Request Building
    // =============================================================================

    /// Full URL for `path`, carrying the inbound query plus `extra_query`
    fn url_for(
        &self,
        path: &str,
        params: &HttpParameters,
        extra_query: &[(&str, &str)],
    ) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ClientError::InvalidRequest(format!("invalid URL for {}: {}", path, e)))?;
        url.set_query(params.query());
        if !extra_query.is_empty() {
            url.query_pairs_mut().extend_pairs(extra_query);
        }
        Ok(url)
    }

    /// Send a request for `path` and fail on non-success statuses
    async fn execute(
        &self,
        path: &str,
        params: &HttpParameters,
        extra_query: &[(&str, &str)],
    ) -> Result<reqwest::Response> {
        let url = self.url_for(path, params, extra_query)?;
        tracing::debug!("{} {}", params.method, url);

        let mut request = self
            .client
            .request(params.method.clone(), url)
            .headers(forwardable_headers(&params.headers));
        if !params.body.is_empty() {
            request = request.body(params.body.clone());
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &HttpParameters,
    ) -> Result<T> {
        self.fetch_json_with(path, params, &[]).await
    }

    async fn fetch_json_with<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &HttpParameters,
        extra_query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.execute(path, params, extra_query).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    async fn fetch_bytes(&self, path: &str, params: &HttpParameters) -> Result<Vec<u8>> {
        let response = self.execute(path, params, &[]).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch_raw(&self, path: &str, params: &HttpParameters) -> Result<RawResponse> {
        let response = self.execute(path, params, &[]).await?;
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        Ok(RawResponse { body, headers })
    }
}

/// Inbound headers minus the hop-by-hop ones reqwest sets itself
fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = headers.clone();
    for name in [HOST, CONTENT_LENGTH, CONNECTION, TRANSFER_ENCODING] {
        forwarded.remove(name);
    }
    forwarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{AUTHORIZATION, HeaderValue};

    #[test]
    fn test_client_creation() {
        let client = JenkinsClient::new("http://localhost:8080/jenkins");
        assert_eq!(client.base_url(), "http://localhost:8080/jenkins");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = JenkinsClient::new("http://localhost:8080/jenkins/");
        assert_eq!(client.base_url(), "http://localhost:8080/jenkins");
    }

    #[test]
    fn test_url_keeps_inbound_query() {
        let client = JenkinsClient::new("http://localhost:8080");
        let params = HttpParameters::get("/api/runs?start=0&limit=10");
        let url = client.url_for("/blue/rest/search/", &params, &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/blue/rest/search/?start=0&limit=10");
    }

    #[test]
    fn test_url_encodes_extra_query() {
        let client = JenkinsClient::new("http://localhost:8080");
        let params = HttpParameters::get("/check");
        let url = client
            .url_for("/job/demo/checkJobName", &params, &[("value", "my pipe")])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/job/demo/checkJobName?value=my+pipe");
    }

    #[test]
    fn test_forwardable_headers_drop_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("conduit.local"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("12"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));

        let forwarded = forwardable_headers(&headers);
        assert!(forwarded.get(HOST).is_none());
        assert!(forwarded.get(CONTENT_LENGTH).is_none());
        assert_eq!(forwarded.get(AUTHORIZATION).unwrap(), "Bearer abc");
    }
}
