//! SCM server DTOs

use serde::{Deserialize, Serialize};

/// Request to register an SCM server with the remote engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateScmServer {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "apiUrl", default)]
    pub api_url: String,
}

impl CreateScmServer {
    /// API URL without trailing slashes, for duplicate detection
    pub fn normalized_api_url(&self) -> &str {
        normalize_api_url(&self.api_url)
    }
}

pub fn normalize_api_url(url: &str) -> &str {
    url.trim_end_matches('/')
}
