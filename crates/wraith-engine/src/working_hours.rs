//! Working-hours gate — emulated users should not act outside their
//! configured hours.
//!
//! The gate is re-entered at the top of every event, so a handler that
//! crosses its window boundary mid-run goes quiet at the next event, not
//! just at startup.

use std::time::Duration;

use chrono::{NaiveTime, Utc};
use tokio_util::sync::CancellationToken;
use wraith_core::{Result, TimelineHandler, WraithError};

/// Longest single sleep while parked outside the window. Keeps the gate
/// responsive to cancellation and to wall-clock adjustments.
const MAX_GATE_SLEEP: Duration = Duration::from_secs(300);

/// Block until the current UTC time-of-day is inside the handler's
/// working-hours window. Returns immediately when no window is configured
/// or we're already inside it.
pub async fn wait(handler: &TimelineHandler, token: &CancellationToken) -> Result<()> {
    loop {
        let now = Utc::now().time();
        let Some(remaining) = wait_duration(now, handler.utc_time_on, handler.utc_time_off) else {
            return Ok(());
        };

        let sleep_for = remaining.min(MAX_GATE_SLEEP);
        tracing::debug!(
            "{} outside working hours (now {now}), parking for {sleep_for:?}",
            handler.handler_type
        );

        tokio::select! {
            _ = token.cancelled() => return Err(WraithError::Cancelled),
            _ = tokio::time::sleep(sleep_for) => {}
        }
    }
}

/// How long until the window opens — `None` when already inside it, or
/// when no usable window is configured.
///
/// A window with `off < on` spans midnight (e.g. 22:00–06:00).
pub fn wait_duration(
    now: NaiveTime,
    time_on: Option<NaiveTime>,
    time_off: Option<NaiveTime>,
) -> Option<Duration> {
    let (on, off) = match (time_on, time_off) {
        (Some(on), Some(off)) => (on, off),
        _ => return None,
    };
    if on == off {
        // degenerate window, treated as unset
        return None;
    }

    let overnight = off < on;
    let inside = if overnight {
        now >= on || now <= off
    } else {
        now >= on && now <= off
    };
    if inside {
        return None;
    }

    let mut until = on.signed_duration_since(now);
    if until < chrono::Duration::zero() {
        until += chrono::Duration::days(1);
    }
    Some(until.to_std().unwrap_or(Duration::ZERO))
}
