//! # Wraith Engine
//!
//! The timeline execution engine shared by every handler: a long-running,
//! cancellable, looping interpreter over a handler's ordered event list.
//!
//! ## Architecture
//! ```text
//! HandlerRunner (one per TimelineHandler, own tokio task)
//!   └── run_once() — one pass over the event list
//!         ├── working_hours::wait  — park until inside the window
//!         ├── delay_before         — cancellable sleep
//!         ├── dispatch             — ActionSession::execute + report
//!         │     └── "random"      — fire-forever sub-loop with
//!         │                          probability gate + jittered delays
//!         └── delay_after          — cancellable sleep
//! ```
//!
//! Failure contract: one bad command is logged and skipped; one failed
//! pass is retried fresh (looping handlers); the invoker session is torn
//! down on every exit path; cancellation is a silent, normal exit.

pub mod engine;
pub mod invoker;
pub mod jitter;
pub mod report;
pub mod working_hours;

pub use engine::{HandlerRunner, RANDOM_COMMAND, RunState};
pub use invoker::{ActionInvoker, ActionSession};
pub use report::{LINE_PREFIX, ReportSink};
