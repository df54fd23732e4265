//! Error taxonomy for generation.
//!
//! - [`ValidationError`]: raised before any process is spawned; no side effects.
//! - [`CommandError`]: the external tool failed, was cancelled or could not start.
//! - [`GeneratorError::Io`]: filesystem failures during discovery, copy or
//!   template materialisation.
//! - [`GeneratorError::NoApplicableGenerator`]: registry lookup miss.
//!
//! Nothing here is retried internally; retry policy belongs to the caller.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("no proto files provided")]
    NoProtoFiles,

    #[error("proto file escapes the repository root: {}", .0.display())]
    PathTraversal(PathBuf),

    #[error("proto file path must be relative: {}", .0.display())]
    AbsolutePath(PathBuf),

    #[error("proto file path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("not a .proto file: {}", .0.display())]
    InvalidExtension(PathBuf),

    #[error("manifest file not found: {}", .0.display())]
    MissingManifest(PathBuf),
}

/// Why a running command was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Requested,
    DeadlineExceeded,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::Requested => f.write_str("cancelled"),
            CancelReason::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Non-zero exit. `stderr` is the captured standard error, verbatim.
    #[error("{program} exited with {}: {stderr}", describe_status(.status))]
    Failed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("{program} {reason}")]
    Cancelled {
        program: String,
        reason: CancelReason,
    },

    #[error("failed waiting for {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl CommandError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CommandError::Cancelled { .. })
    }
}

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("tool execution failed: {0}")]
    Tool(#[from] CommandError),

    #[error("{context} {}: {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no applicable generator for repository {}", .0.display())]
    NoApplicableGenerator(PathBuf),
}

impl GeneratorError {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GeneratorError::Io {
            context,
            path: path.into(),
            source,
        }
    }
}
