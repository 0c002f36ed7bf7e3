//! Service Module
//!
//! Business logic layer for the server.
//! The operator sits between the API, the resource stores and the remote
//! engine; the other modules are the collaborators it is built from.

pub mod adapter;
pub mod error;
pub mod masking;
pub mod operator;
pub mod sync;

// Re-export for convenience
pub use adapter::InboundRequest;
pub use error::{OperatorError, Result};
pub use operator::{NodesDetailReport, ResourceOperator, Stores};
