//! Server configuration
//!
//! Defines the bind address, storage backend, remote engine connection and
//! fan-out limits.

use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP API listens on
    pub bind_addr: String,

    /// PostgreSQL URL; the in-memory store is used when unset
    pub database_url: Option<String>,

    /// Remote engine base URL (e.g., "http://localhost:8080/jenkins")
    pub engine_url: String,

    /// Per-request timeout for remote engine calls
    pub engine_timeout: Duration,

    /// Max concurrent step fetches while building run node details
    pub fanout_concurrency: usize,

    /// Agent labels offered to pipeline authors
    pub agent_labels: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            database_url: None,
            engine_url: "http://localhost:8080/jenkins".to_string(),
            engine_timeout: Duration::from_secs(30),
            fanout_concurrency: 10,
            agent_labels: parse_labels("base,nodejs,maven,go"),
        }
    }
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - BIND_ADDR (optional, default: 0.0.0.0:8080)
    /// - DATABASE_URL (optional, in-memory store when unset)
    /// - ENGINE_URL (optional, default: http://localhost:8080/jenkins)
    /// - ENGINE_TIMEOUT (optional, seconds, default: 30)
    /// - FANOUT_CONCURRENCY (optional, default: 10)
    /// - AGENT_LABELS (optional, comma separated, default: base,nodejs,maven,go)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = lookup("BIND_ADDR").unwrap_or(defaults.bind_addr);

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let engine_url = lookup("ENGINE_URL").unwrap_or(defaults.engine_url);

        let engine_timeout = match lookup("ENGINE_TIMEOUT") {
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| anyhow::anyhow!("ENGINE_TIMEOUT must be a number of seconds"))?,
            None => defaults.engine_timeout,
        };

        let fanout_concurrency = match lookup("FANOUT_CONCURRENCY") {
            Some(value) => value
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("FANOUT_CONCURRENCY must be a positive integer"))?,
            None => defaults.fanout_concurrency,
        };

        let agent_labels = lookup("AGENT_LABELS")
            .map(|labels| parse_labels(&labels))
            .unwrap_or(defaults.agent_labels);

        Ok(Self {
            bind_addr,
            database_url,
            engine_url,
            engine_timeout,
            fanout_concurrency,
            agent_labels,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if !self.engine_url.starts_with("http://") && !self.engine_url.starts_with("https://") {
            anyhow::bail!("engine_url must start with http:// or https://");
        }

        if self.engine_timeout.as_secs() == 0 {
            anyhow::bail!("engine_timeout must be greater than 0");
        }

        if self.fanout_concurrency == 0 {
            anyhow::bail!("fanout_concurrency must be greater than 0");
        }

        Ok(())
    }
}

fn parse_labels(labels: &str) -> Vec<String> {
    labels
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert!(config.database_url.is_none());
        assert_eq!(config.engine_timeout, Duration::from_secs(30));
        assert_eq!(config.fanout_concurrency, 10);
        assert_eq!(config.agent_labels, vec!["base", "nodejs", "maven", "go"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://conduit@localhost/conduit"),
            ("ENGINE_URL", "https://ci.example.com"),
            ("ENGINE_TIMEOUT", "5"),
            ("FANOUT_CONCURRENCY", "3"),
            ("AGENT_LABELS", " java , ,python"),
        ]))
        .unwrap();

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://conduit@localhost/conduit")
        );
        assert_eq!(config.engine_url, "https://ci.example.com");
        assert_eq!(config.engine_timeout, Duration::from_secs(5));
        assert_eq!(config.fanout_concurrency, 3);
        assert_eq!(config.agent_labels, vec!["java", "python"]);
    }

    #[test]
    fn test_bad_numbers_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("ENGINE_TIMEOUT", "soon")])).is_err());
        assert!(Config::from_lookup(lookup(&[("FANOUT_CONCURRENCY", "-1")])).is_err());
    }

    #[test]
    fn test_validate() {
        let config = Config {
            engine_url: "ftp://ci".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            fanout_concurrency: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
