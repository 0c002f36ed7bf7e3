//! Run DTOs

use serde::{Deserialize, Serialize};

/// Payload submitted to an input step that is waiting on a user
///
/// The remote engine needs `parameters` present as a list when the input is
/// being proceeded, so `parameters` distinguishes "absent" from "empty".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputStepPayload {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<InputParameter>>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub abort: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputParameter {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl InputStepPayload {
    /// Whether the engine needs an explicit empty `parameters` list
    pub fn needs_empty_parameters(&self) -> bool {
        !self.abort && self.parameters.as_ref().is_none_or(|p| p.is_empty())
    }
}
