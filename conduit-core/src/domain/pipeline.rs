//! Pipeline domain types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::meta::{ObjectMeta, Resource, ResourceKind};
use super::sync::SyncState;

/// Annotation holding the Jenkinsfile edit mode (`raw` or `json`)
pub const JENKINSFILE_EDIT_MODE_ANNOTATION: &str = "pipeline.conduit.io/jenkinsfile.edit-mode";

/// Annotation holding the Jenkinsfile value while in `json` edit mode
pub const JENKINSFILE_VALUE_ANNOTATION: &str = "pipeline.conduit.io/jenkinsfile";

/// CI pipeline definition
///
/// Structure shared between the API (accepts/returns) and the stores (persist).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: PipelineSpec,

    #[serde(default)]
    pub sync: SyncState,
}

/// Pipeline specification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSpec {
    #[serde(rename = "type", default)]
    pub pipeline_type: PipelineType,

    /// Definition of a pipeline without SCM; holds the raw-mode Jenkinsfile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<NoScmPipeline>,

    /// Multi-branch definition, passed to the remote engine as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_branch_pipeline: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineType {
    #[default]
    #[serde(rename = "pipeline")]
    Pipeline,
    #[serde(rename = "multi-branch-pipeline")]
    MultiBranch,
}

impl PipelineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineType::Pipeline => "pipeline",
            PipelineType::MultiBranch => "multi-branch-pipeline",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoScmPipeline {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub jenkinsfile: String,

    #[serde(default)]
    pub disable_concurrent: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_trigger: Option<serde_json::Value>,
}

/// How a pipeline's Jenkinsfile is edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JenkinsfileEditMode {
    /// Jenkinsfile lives in `spec.pipeline.jenkinsfile`
    Raw,
    /// Jenkinsfile lives in [`JENKINSFILE_VALUE_ANNOTATION`]
    Json,
}

impl JenkinsfileEditMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JenkinsfileEditMode::Raw => "raw",
            JenkinsfileEditMode::Json => "json",
        }
    }
}

impl FromStr for JenkinsfileEditMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(JenkinsfileEditMode::Raw),
            "json" => Ok(JenkinsfileEditMode::Json),
            other => Err(format!("invalid edit mode: {}", other)),
        }
    }
}

impl Pipeline {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::named(namespace, name),
            spec: PipelineSpec::default(),
            sync: SyncState::pending(),
        }
    }

    /// Raw-mode Jenkinsfile, if the pipeline has a no-SCM definition
    pub fn raw_jenkinsfile(&self) -> Option<&str> {
        self.spec.pipeline.as_ref().map(|p| p.jenkinsfile.as_str())
    }

    /// Json-mode Jenkinsfile annotation value
    pub fn json_jenkinsfile(&self) -> Option<&str> {
        self.metadata.annotation(JENKINSFILE_VALUE_ANNOTATION)
    }

    pub fn edit_mode(&self) -> Option<JenkinsfileEditMode> {
        self.metadata
            .annotation(JENKINSFILE_EDIT_MODE_ANNOTATION)
            .and_then(|mode| mode.parse().ok())
    }

    /// Overwrites every stored form of the Jenkinsfile with `latest`'s
    ///
    /// Used by plain updates so that only the dedicated Jenkinsfile operation
    /// can change it.
    pub fn carry_jenkinsfile_from(&mut self, latest: &Pipeline) {
        if let Some(ours) = self.spec.pipeline.as_mut() {
            ours.jenkinsfile = latest.raw_jenkinsfile().unwrap_or_default().to_string();
        }

        for key in [JENKINSFILE_VALUE_ANNOTATION, JENKINSFILE_EDIT_MODE_ANNOTATION] {
            match latest.metadata.annotations.get(key) {
                Some(value) => {
                    self.metadata
                        .annotations
                        .insert(key.to_string(), value.clone());
                }
                None => {
                    self.metadata.annotations.remove(key);
                }
            }
        }
    }
}

impl Resource for Pipeline {
    const KIND: ResourceKind = ResourceKind::Pipeline;

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn sync(&self) -> &SyncState {
        &self.sync
    }

    fn sync_mut(&mut self) -> &mut SyncState {
        &mut self.sync
    }
}
