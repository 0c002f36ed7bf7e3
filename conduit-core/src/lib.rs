//! Conduit Core
//!
//! Core types and abstractions shared by the Conduit services.
//!
//! This crate contains:
//! - Domain types: locally owned resources (Project, Pipeline, Credential)
//!   and the run records fetched from the remote CI engine
//! - DTOs: request/response payloads exchanged over the API
//! - Query: the generic filter/sort/paginate routine used by list endpoints

pub mod domain;
pub mod dto;
pub mod query;
