//! # Wraith Invokers
//!
//! Reference action invokers — the thin, swappable shims the engine
//! dispatches timeline events to. Two ship in-tree: a shell invoker for
//! command handlers and an HTTP invoker standing in for browsers and
//! curl. Anything richer (real browser drivers, office automation)
//! implements the same two traits and registers itself.

pub mod http;
pub mod registry;
pub mod shell;

pub use http::{HttpInvoker, RequestSpec};
pub use registry::InvokerRegistry;
pub use shell::ShellInvoker;
