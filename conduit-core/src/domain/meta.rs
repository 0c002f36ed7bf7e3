//! Object metadata shared by every locally owned resource

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::sync::SyncState;

/// Label carrying the workspace a project belongs to
pub const WORKSPACE_LABEL: &str = "conduit.io/workspace";

/// Metadata common to projects, pipelines and credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Concrete name, assigned by the store when left empty on create
    #[serde(default)]
    pub name: String,

    /// Prefix used to derive `name` on create
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generate_name: String,

    /// Owning namespace; empty for cluster-scoped resources
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub annotations: BTreeMap<String, String>,

    /// Optimistic-concurrency token; `0` means "never stored"
    #[serde(default)]
    pub resource_version: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    pub fn named(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

/// The three kinds of resource Conduit keeps locally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Project,
    Pipeline,
    Credential,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Project => "project",
            ResourceKind::Pipeline => "pipeline",
            ResourceKind::Credential => "credential",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(ResourceKind::Project),
            "pipeline" => Ok(ResourceKind::Pipeline),
            "credential" => Ok(ResourceKind::Credential),
            other => Err(format!("unknown resource kind: {}", other)),
        }
    }
}

/// A resource that can be persisted by a resource store
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn meta(&self) -> &ObjectMeta;
    fn meta_mut(&mut self) -> &mut ObjectMeta;

    fn sync(&self) -> &SyncState;
    fn sync_mut(&mut self) -> &mut SyncState;
}

/// Equality-based label selector (`key=value,key2=value2`)
///
/// An empty selector matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: BTreeMap<String, String>,
}

impl LabelSelector {
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.requirements.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn requirements(&self) -> &BTreeMap<String, String> {
        &self.requirements
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements
            .iter()
            .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
    }
}

impl FromStr for LabelSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut selector = LabelSelector::default();
        for term in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (key, value) = term
                .split_once("==")
                .or_else(|| term.split_once('='))
                .ok_or_else(|| format!("invalid label selector term: {}", term))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(format!("invalid label selector term: {}", term));
            }
            selector = selector.with(key, value.trim());
        }
        Ok(selector)
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self
            .requirements
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        f.write_str(&terms.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_selector_matches_everything() {
        let selector = LabelSelector::everything();
        assert!(selector.matches(&BTreeMap::new()));
        assert!(selector.matches(&labels(&[("a", "b")])));
    }

    #[test]
    fn test_selector_parse_and_match() {
        let selector: LabelSelector = "app=web, tier==frontend".parse().unwrap();
        assert!(selector.matches(&labels(&[("app", "web"), ("tier", "frontend"), ("x", "y")])));
        assert!(!selector.matches(&labels(&[("app", "web")])));
        assert!(!selector.matches(&labels(&[("app", "api"), ("tier", "frontend")])));
    }

    #[test]
    fn test_selector_rejects_bare_key() {
        assert!("app".parse::<LabelSelector>().is_err());
        assert!("=web".parse::<LabelSelector>().is_err());
    }

    #[test]
    fn test_selector_display() {
        let selector = LabelSelector::everything().with(WORKSPACE_LABEL, "ws1");
        assert_eq!(selector.to_string(), "conduit.io/workspace=ws1");
    }

    #[test]
    fn test_resource_kind_round_trip() {
        for kind in [ResourceKind::Project, ResourceKind::Pipeline, ResourceKind::Credential] {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
        assert!("secret".parse::<ResourceKind>().is_err());
    }
}
