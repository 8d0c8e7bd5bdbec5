//! Wraith error types.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, WraithError>;

/// All the ways a Wraith component can fail.
///
/// The engine cares about the distinction between `Setup` (fatal to the
/// current pass), `Action` (isolated to one event), and `Cancelled`
/// (a normal exit, not a failure).
#[derive(Debug, Error)]
pub enum WraithError {
    #[error("config error: {0}")]
    Config(String),

    #[error("timeline error: {0}")]
    Timeline(String),

    /// Resource acquisition failed — the whole pass is abandoned.
    #[error("setup error: {0}")]
    Setup(String),

    /// A single command failed — the event loop carries on.
    #[error("action error: {0}")]
    Action(String),

    #[error("report error: {0}")]
    Report(String),

    /// Cooperative cancellation observed. Not a failure.
    #[error("cancelled")]
    Cancelled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WraithError {
    /// True when this error is the cancellation signal rather than a fault.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WraithError::Cancelled)
    }
}
