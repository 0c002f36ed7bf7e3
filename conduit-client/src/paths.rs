//! Remote engine URL paths
//!
//! Blue Ocean REST paths for runs/nodes/steps, classic job paths for
//! branch scanning and script checks.

use crate::params::PipelineScope;

const ORGANIZATION: &str = "/blue/rest/organizations/jenkins";

/// `.../pipelines/{project}/pipelines/{pipeline}/` plus `branches/{branch}/`
pub fn pipeline(scope: &PipelineScope) -> String {
    let mut path = format!(
        "{}/pipelines/{}/pipelines/{}/",
        ORGANIZATION, scope.project, scope.pipeline
    );
    if let Some(branch) = &scope.branch {
        path.push_str(&format!("branches/{}/", branch));
    }
    path
}

pub fn search() -> String {
    "/blue/rest/search/".to_string()
}

pub fn runs(scope: &PipelineScope) -> String {
    format!("{}runs/", pipeline(scope))
}

pub fn run(scope: &PipelineScope, run_id: &str) -> String {
    format!("{}runs/{}/", pipeline(scope), run_id)
}

pub fn stop(scope: &PipelineScope, run_id: &str) -> String {
    format!("{}stop/", run(scope, run_id))
}

pub fn replay(scope: &PipelineScope, run_id: &str) -> String {
    format!("{}replay/", run(scope, run_id))
}

pub fn artifacts(scope: &PipelineScope, run_id: &str) -> String {
    format!("{}artifacts/", run(scope, run_id))
}

pub fn run_log(scope: &PipelineScope, run_id: &str) -> String {
    format!("{}log/", run(scope, run_id))
}

pub fn nodes(scope: &PipelineScope, run_id: &str) -> String {
    format!("{}nodes/", run(scope, run_id))
}

pub fn steps(scope: &PipelineScope, run_id: &str, node_id: &str) -> String {
    format!("{}{}/steps/", nodes(scope, run_id), node_id)
}

pub fn step(scope: &PipelineScope, run_id: &str, node_id: &str, step_id: &str) -> String {
    format!("{}{}/", steps(scope, run_id, node_id), step_id)
}

pub fn step_log(scope: &PipelineScope, run_id: &str, node_id: &str, step_id: &str) -> String {
    format!("{}log/", step(scope, run_id, node_id, step_id))
}

pub fn branches(project: &str, pipeline: &str) -> String {
    format!("{}branches/", self::pipeline(&PipelineScope::pipeline(project, pipeline)))
}

pub fn scan_branch(project: &str, pipeline: &str) -> String {
    format!("/job/{}/job/{}/build", project, pipeline)
}

pub fn console_log(project: &str, pipeline: &str) -> String {
    format!("/job/{}/job/{}/indexing/consoleText", project, pipeline)
}

pub fn check_pipeline_name(project: &str) -> String {
    format!("/job/{}/checkJobName", project)
}

pub fn check_script_compile(project: &str, pipeline: &str) -> String {
    format!(
        "/job/{}/job/{}/descriptorByName/org.jenkinsci.plugins.workflow.cps.CpsFlowDefinition/checkScriptCompile",
        project, pipeline
    )
}

pub fn check_cron(project: &str) -> String {
    format!(
        "/job/{}/descriptorByName/hudson.triggers.TimerTrigger/checkSpec",
        project
    )
}

pub fn crumb() -> String {
    "/crumbIssuer/api/json/".to_string()
}

pub fn scm_servers(scm: &str) -> String {
    format!("{}/scm/{}/servers/", ORGANIZATION, scm)
}

pub fn scm_organizations(scm: &str) -> String {
    format!("{}/scm/{}/organizations/", ORGANIZATION, scm)
}

pub fn scm_repositories(scm: &str, organization: &str) -> String {
    format!("{}{}/repositories/", scm_organizations(scm), organization)
}

pub fn scm_validate(scm: &str) -> String {
    format!("{}/scm/{}/validate", ORGANIZATION, scm)
}
