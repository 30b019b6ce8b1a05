//! todo-api - a CRUD HTTP service for todo items
//!
//! - Todo records persisted in a MongoDB collection (or in memory)
//! - Five JSON routes under `/todos` plus `/health`
//! - Layered configuration from file and environment

pub mod api;
pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use error::{Error, Result};
