//! Core domain types
//!
//! Resources owned by Conduit (projects, pipelines, credentials) share an
//! [`meta::ObjectMeta`] and an explicit [`sync::SyncState`]. Run records are
//! ephemeral and only ever come back from the remote engine.

pub mod credential;
pub mod meta;
pub mod pipeline;
pub mod project;
pub mod run;
pub mod sync;

pub use meta::{LabelSelector, ObjectMeta, Resource};
pub use sync::{SyncState, SyncStatus};
