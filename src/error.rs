//! Error types for dg
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, validation failure, unknown task)
//! - 3: Gate blocked (the task's derived status forbids the mutation)
//! - 4: Operation failed (IO, serialization)

use thiserror::Error;

use crate::status::TaskStatus;

/// Exit codes for the dg CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const GATE_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for dg operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Subtask not found: {subtask} (task {task})")]
    SubtaskNotFound { task: String, subtask: String },

    #[error("Not a group task: {0}")]
    NotAGroupTask(String),

    #[error("Creator cannot leave their own task: {0}")]
    CreatorCannotLeave(String),

    #[error("No data directory available (set --data-dir or DG_DATA_DIR)")]
    NoDataDir,

    // Gate blocks (exit code 3)
    #[error("{operation} is not allowed while task {task} is {status}")]
    GateBlocked {
        task: String,
        operation: &'static str,
        status: TaskStatus,
    },

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_)
            | Error::TaskNotFound(_)
            | Error::SubtaskNotFound { .. }
            | Error::NotAGroupTask(_)
            | Error::CreatorCannotLeave(_)
            | Error::NoDataDir => exit_codes::USER_ERROR,

            Error::GateBlocked { .. } => exit_codes::GATE_BLOCKED,

            Error::Io(_) | Error::Json(_) | Error::TomlParse(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON error envelopes, where the error carries
    /// more than its message.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::GateBlocked {
                task,
                operation,
                status,
            } => Some(serde_json::json!({
                "task": task,
                "operation": operation,
                "status": status,
            })),
            _ => None,
        }
    }
}

/// Result type alias for dg operations
pub type Result<T> = std::result::Result<T, Error>;
