//! Pipeline DTOs

use serde::{Deserialize, Serialize};

/// Request to replace a pipeline's Jenkinsfile
///
/// `mode` stays a string so that unknown modes reach the operator and are
/// rejected there instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateJenkinsfile {
    pub mode: String,
    pub jenkinsfile: String,
}
