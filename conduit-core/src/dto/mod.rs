//! Data Transfer Objects for the Conduit API
//!
//! Request and response payloads that are not resources themselves.

pub mod pipeline;
pub mod project;
pub mod run;
pub mod scm;
