//! # Wraith Core
//!
//! Shared data contracts for the Wraith user-activity-emulation agent:
//! timelines and their handlers/events, report records, errors, and the
//! client configuration file.

pub mod config;
pub mod error;
pub mod timeline;

pub use config::WraithConfig;
pub use error::{Result, WraithError};
pub use timeline::{
    Delay, HandlerType, ReportItem, Timeline, TimelineEvent, TimelineHandler, TimelineRecord,
    TimelineStatus,
};
