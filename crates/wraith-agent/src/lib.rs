//! # Wraith Agent
//!
//! Client-side orchestration: turns a timeline file into a fleet of
//! handler tasks and keeps them in sync with edits to the file.

pub mod orchestrator;

pub use orchestrator::Orchestrator;
