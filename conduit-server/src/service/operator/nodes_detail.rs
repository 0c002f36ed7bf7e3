//! Run node details
//!
//! The engine lists a run's nodes without their steps. Building the detail
//! view takes one step fetch per node; these run concurrently, bounded by a
//! semaphore, and each result is written back at its node's position so the
//! output order always matches the node list.
//!
//! A node whose steps cannot be fetched keeps an empty step list and is
//! reported in [`NodesDetailReport::warnings`]; it does not fail the call.

use conduit_client::{PipelineScope, Result as ClientResult};
use conduit_core::domain::run::{NodeDetail, NodesStepsIndex, RunNode, RunStep};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::ResourceOperator;
use crate::service::adapter::{InboundRequest, to_http_parameters};
use crate::service::error::Result;

/// A node whose steps could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeWarning {
    pub index: usize,
    pub node_id: String,
    pub message: String,
}

/// Node details in node-list order, plus the nodes that came back degraded
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodesDetailReport {
    pub nodes: Vec<NodeDetail>,
    pub warnings: Vec<NodeWarning>,
}

impl NodesDetailReport {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

impl ResourceOperator {
    /// Every node of a run with its steps filled in
    ///
    /// Works for pipeline and branch scopes alike. Dropping the returned
    /// future aborts the outstanding step fetches.
    pub async fn get_nodes_detail(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        req: &InboundRequest,
    ) -> Result<NodesDetailReport> {
        let params = to_http_parameters(req);
        let nodes = self
            .forward(
                "get pipeline run nodes",
                self.engine.get_run_nodes(scope, run_id, params.clone()),
            )
            .await?;

        let mut details = detail_copies(&nodes)?;
        let semaphore = Arc::new(Semaphore::new(self.fanout_concurrency));
        let mut tasks = JoinSet::new();

        for (index, node) in nodes.iter().enumerate() {
            let engine = Arc::clone(&self.engine);
            let semaphore = Arc::clone(&semaphore);
            let scope = scope.clone();
            let run_id = run_id.to_string();
            let node_id = node.id.clone();
            // Each task owns its own snapshot of the request
            let params = params.clone();

            tasks.spawn(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire_owned().await;
                let steps = engine
                    .get_node_steps(&scope, &run_id, &node_id, params)
                    .await;
                indexed(index, node_id, steps)
            });
        }

        let mut outstanding: BTreeSet<usize> = (0..details.len()).collect();
        let mut warnings = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(NodesStepsIndex { index, steps })) => {
                    outstanding.remove(&index);
                    details[index].steps.extend(steps);
                }
                Ok(Err(warning)) => {
                    outstanding.remove(&warning.index);
                    warnings.push(warning);
                }
                Err(e) => tracing::error!("Node steps task failed: {}", e),
            }
        }

        // Tasks that panicked never reported their index
        for index in outstanding {
            warnings.push(NodeWarning {
                index,
                node_id: details[index].node.id.clone(),
                message: "step fetch did not complete".to_string(),
            });
        }
        warnings.sort_by_key(|warning| warning.index);

        if !warnings.is_empty() {
            tracing::warn!(
                "Run {} of {}/{}: {} of {} nodes without steps",
                run_id,
                scope.project,
                scope.pipeline,
                warnings.len(),
                details.len()
            );
        }

        Ok(NodesDetailReport {
            nodes: details,
            warnings,
        })
    }
}

/// Deep copies of `nodes` with empty step lists
fn detail_copies(nodes: &[RunNode]) -> Result<Vec<NodeDetail>> {
    let value = serde_json::to_value(nodes)?;
    Ok(serde_json::from_value(value)?)
}

fn indexed(
    index: usize,
    node_id: String,
    steps: ClientResult<Vec<RunStep>>,
) -> std::result::Result<NodesStepsIndex, NodeWarning> {
    match steps {
        Ok(steps) => Ok(NodesStepsIndex { index, steps }),
        Err(e) => {
            tracing::warn!("Failed to fetch steps of node {} ({}): {}", index, node_id, e);
            Err(NodeWarning {
                index,
                node_id,
                message: e.to_string(),
            })
        }
    }
}
