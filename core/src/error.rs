use std::io;

use thiserror::Error;

pub type Result<T, E = RunnerErr> = std::result::Result<T, E>;

/// Errors surfaced to the caller as the tool call's own failure. A wrapped
/// command that ran but exited non-zero (or timed out) is *not* one of these:
/// those outcomes are reported as data inside the call result so the invoking
/// agent can read the captured output.
#[derive(Error, Debug)]
pub enum RunnerErr {
    /// The interactive permission gate refused the action.
    #[error("Permission denied by user")]
    DeniedByUser,

    /// A required input path, file, script, or version is missing.
    #[error("{0}")]
    NotFound(String),

    /// An unparseable manifest or invalid argument value.
    #[error("{0}")]
    MalformedInput(String),

    /// The process could not be started at all (missing binary, exec
    /// permission denied, bad working directory).
    #[error("failed to spawn command: {0}")]
    Spawn(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
