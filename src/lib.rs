//! dg - Deadline Groups library
//!
//! Core functionality for the dg CLI: a local-first tracker for
//! deadline-bound commitments.
//!
//! # Core Concepts
//!
//! - **Tasks**: deadline-bound commitments, solo or group
//! - **Status**: derived from the deadline on every read; only explicit
//!   completion is persisted
//! - **Execution window**: the final hour before the deadline, when
//!   updates, subtasks, and focus sessions are allowed
//! - **Gating**: one table decides which mutation is legal in which status
//! - **Identity**: a persisted local pseudo-user attributes all activity
//!
//! # Module Organization
//!
//! - `cli`: command-line interface using clap
//! - `config`: configuration loading from `config.toml`
//! - `error`: error types and result aliases
//! - `gate`: the mutation-gating table
//! - `identity`: local pseudo-user management
//! - `output`: human and JSON output envelopes
//! - `status`: status derivation from deadlines
//! - `storage`: data directory and atomic JSON persistence
//! - `store`: the task repository
//! - `task`: the task data model
//! - `views`: dashboard and archive projections

pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod identity;
pub mod output;
pub mod status;
pub mod storage;
pub mod store;
pub mod task;
pub mod views;

pub use error::{Error, Result};
