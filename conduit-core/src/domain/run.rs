//! Remote engine records
//!
//! These are never persisted: they are fetched from the remote CI engine per
//! request. Known fields are typed; everything else the engine sends is kept
//! in `extra` so a record survives a round trip unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pipeline as known to the remote engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePipeline {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_run: Option<PipelineRun>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Branch of a multi-branch pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchPipeline {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_run: Option<PipelineRun>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One execution of a pipeline
///
/// Also the shape the engine answers with for run, stop and replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_in_millis: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A list page returned by the remote engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteList<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> From<Vec<T>> for RemoteList<T> {
    fn from(items: Vec<T>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
}

/// Stage or parallel branch in a run's execution graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunNode {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_in_millis: Option<i64>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Executable unit inside a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStep {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_in_millis: Option<i64>,
    /// Pending input request, for steps waiting on a user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A run node together with all of its steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDetail {
    #[serde(flatten)]
    pub node: RunNode,
    #[serde(default)]
    pub steps: Vec<RunStep>,
}

/// Steps fetched for the node at `index` of a node list
#[derive(Debug, Clone, PartialEq)]
pub struct NodesStepsIndex {
    pub index: usize,
    pub steps: Vec<RunStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub downloadable: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// CSRF crumb issued by the remote engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crumb {
    #[serde(default)]
    pub crumb: String,
    #[serde(default)]
    pub crumb_request_field: String,
}

/// SCM server (e.g. a Bitbucket server) configured in the remote engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmServer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "apiUrl", default)]
    pub api_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmOrg {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Repositories of an SCM organization, one page at a time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgRepo {
    #[serde(default)]
    pub repositories: RepositoryPage,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryPage {
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<i64>,
}

/// Result of validating SCM access
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of compiling a Jenkinsfile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckScript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Result of validating a cron expression
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckCronResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_keeps_unknown_fields() {
        let raw = json!({
            "id": "12",
            "displayName": "Build",
            "edges": [{"id": "20", "type": "STAGE"}],
            "causeOfBlockage": null,
            "restartable": true
        });
        let node: RunNode = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(node.id, "12");
        assert_eq!(node.edges[0].edge_type.as_deref(), Some("STAGE"));
        assert_eq!(node.extra.get("restartable"), Some(&json!(true)));
        assert_eq!(serde_json::to_value(&node).unwrap(), raw);
    }

    #[test]
    fn test_node_detail_from_node_payload() {
        let node = RunNode {
            id: "7".to_string(),
            display_name: Some("Test".to_string()),
            ..Default::default()
        };
        let detail: NodeDetail =
            serde_json::from_value(serde_json::to_value(&node).unwrap()).unwrap();
        assert_eq!(detail.node, node);
        assert!(detail.steps.is_empty());
        assert!(!detail.node.extra.contains_key("steps"));
    }

    #[test]
    fn test_remote_list_from_vec() {
        let list: RemoteList<Artifact> = vec![Artifact::default(), Artifact::default()].into();
        assert_eq!(list.total, 2);
    }
}
