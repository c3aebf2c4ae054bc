//! Root of the `bun-runner-core` library: the command-execution and
//! orchestration layer behind the bun-runner tool surface. Transport,
//! argument schemas, and resource listing live outside this crate.

// Prevent accidental direct writes to stdout/stderr in library code. All
// user-visible output must go through the tool results or the tracing stack.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod approval;
pub mod bench;
pub mod error;
pub mod exec;
pub mod manifest;
pub mod registry;
pub mod runtime;
pub mod session;
mod spawn;
pub mod tools;

pub use approval::ApprovalGate;
pub use approval::ApprovalNotifier;
pub use approval::ApprovalRequest;
pub use approval::CommandNotifier;
pub use approval::DISABLE_NOTIFICATIONS_ENV_VAR;
pub use error::Result;
pub use error::RunnerErr;
pub use exec::ExecOutcome;
pub use exec::ExecParams;
pub use exec::ExecToolCallOutput;
pub use exec::execute;
pub use registry::ServerInfo;
pub use registry::ServerRegistry;
pub use registry::ServerStatus;
pub use registry::StopResult;
pub use runtime::RuntimeProfile;
pub use runtime::translate_to_fallback;
pub use session::Session;
