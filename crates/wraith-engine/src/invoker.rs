//! The seam between the engine and whatever actually drives an
//! application — a browser, a shell, an office suite.

use async_trait::async_trait;
use wraith_core::{Result, TimelineEvent, TimelineHandler};

/// Something that can open a session against a target application.
///
/// One invoker is registered per handler type. `open` acquires whatever
/// external resource the application needs (a browser driver, a shell,
/// an HTTP client); failure there is a setup failure and abandons the
/// whole pass — the engine will try again on the next one.
#[async_trait]
pub trait ActionInvoker: Send + Sync {
    fn name(&self) -> &str;

    /// Acquire the resource and return a live session for one pass.
    async fn open(&self, handler: &TimelineHandler) -> Result<Box<dyn ActionSession>>;
}

/// A live session, exclusively owned by the single pass that opened it.
///
/// The engine guarantees `close` runs exactly once per session — on
/// normal completion, on error, and on cancellation — and swallows any
/// error it returns.
#[async_trait]
pub trait ActionSession: Send {
    /// Execute one command against the application.
    ///
    /// Per-command failures should come back as `WraithError::Action` so
    /// the engine can isolate them and move on; `WraithError::Setup`
    /// signals the session itself is broken and ends the pass.
    async fn execute(
        &mut self,
        command: &str,
        args: &[String],
        event: &TimelineEvent,
    ) -> Result<String>;

    /// Best-effort teardown of the underlying resource.
    async fn close(&mut self) -> Result<()>;
}
