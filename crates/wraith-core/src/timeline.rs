//! Timeline definitions — the script a client replays to mimic a persona.
//!
//! A timeline holds an ordered set of handlers ("drive this browser", "run
//! these shell commands"), each with its own ordered event list, optional
//! working-hours window, and free-form argument map. Timelines are plain
//! JSON on disk and are replaced wholesale when the file changes — never
//! mutated mid-run.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveTime;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, WraithError};

/// A named script describing one or more handlers and their events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    /// Useful for tracking where activity on a client originated.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub status: TimelineStatus,
    #[serde(default)]
    pub handlers: Vec<TimelineHandler>,
}

/// Whether the client should be acting on this timeline at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimelineStatus {
    #[default]
    Run,
    Stop,
}

impl Timeline {
    /// Load a timeline from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WraithError::Timeline(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    /// Parse a timeline from a JSON string (file contents or a pushed update).
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| WraithError::Timeline(format!("Failed to parse timeline: {e}")))
    }
}

/// One actor within a timeline — an application surface plus the ordered
/// events to drive it with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineHandler {
    pub handler_type: HandlerType,
    /// Initial target — a URL to open, or the shell binary to spawn.
    #[serde(default)]
    pub initial: String,
    /// Start of the working-hours window (UTC time of day).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_time_on: Option<NaiveTime>,
    /// End of the working-hours window (UTC time of day).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_time_off: Option<NaiveTime>,
    /// Re-execute the whole event list forever until cancelled.
    #[serde(rename = "loop", default)]
    pub loop_forever: bool,
    /// Free-form handler options. The engine understands
    /// `execution-probability` and `delay-jitter`; everything else is
    /// opaque and belongs to the invoker.
    #[serde(default)]
    pub handler_args: HashMap<String, Value>,
    /// Execution order. Preserved exactly.
    #[serde(default)]
    pub events: Vec<TimelineEvent>,
}

impl TimelineHandler {
    /// Look up a handler argument as a string, whatever JSON shape it was
    /// written in.
    pub fn arg(&self, key: &str) -> Option<String> {
        self.handler_args.get(key).map(value_to_string)
    }

    /// The `execution-probability` option, normalized: missing, malformed,
    /// or out-of-range values all mean "always execute" (100).
    pub fn execution_probability(&self) -> i64 {
        let Some(raw) = self.arg("execution-probability") else {
            return 100;
        };
        match raw.trim().parse::<i64>() {
            Ok(p) if (0..=100).contains(&p) => p,
            _ => 100,
        }
    }
}

/// Handlers map to applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandlerType {
    BrowserChrome,
    BrowserFirefox,
    Command,
    PowerShell,
    Bash,
    Curl,
    Notepad,
    Word,
    Excel,
    Outlook,
}

impl HandlerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerType::BrowserChrome => "BrowserChrome",
            HandlerType::BrowserFirefox => "BrowserFirefox",
            HandlerType::Command => "Command",
            HandlerType::PowerShell => "PowerShell",
            HandlerType::Bash => "Bash",
            HandlerType::Curl => "Curl",
            HandlerType::Notepad => "Notepad",
            HandlerType::Word => "Word",
            HandlerType::Excel => "Excel",
            HandlerType::Outlook => "Outlook",
        }
    }
}

impl std::fmt::Display for HandlerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scripted action: a command, its arguments, and the delays around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// A literal action name, or the sentinel `"random"` — pick one of
    /// `command_args` uniformly at random, forever.
    pub command: String,
    #[serde(default)]
    pub command_args: Vec<Value>,
    /// Milliseconds to wait before dispatching, or a `{random,min,max}` roll.
    #[serde(default)]
    pub delay_before: Delay,
    /// Milliseconds to wait after dispatching, or a `{random,min,max}` roll.
    #[serde(default)]
    pub delay_after: Delay,
    /// Opaque correlation id threaded through to reported results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trackable_id: Option<String>,
}

impl TimelineEvent {
    /// Arguments rendered as strings, empties dropped.
    pub fn args_as_strings(&self) -> Vec<String> {
        self.command_args
            .iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A delay spec: either a plain millisecond count, or a uniform roll
/// between `min` and `max` re-resolved on every use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Delay {
    Fixed(i64),
    Random { random: bool, min: i64, max: i64 },
}

impl Default for Delay {
    fn default() -> Self {
        Delay::Fixed(0)
    }
}

impl Delay {
    /// Resolve to actual milliseconds, never negative. Random delays
    /// re-roll on every call.
    pub fn resolve(&self, rng: &mut impl Rng) -> i64 {
        match self {
            Delay::Fixed(ms) => (*ms).max(0),
            Delay::Random { random: false, .. } => 0,
            Delay::Random { min, max, .. } => {
                if min >= max {
                    (*min).max(0)
                } else {
                    rng.gen_range(*min..=*max).max(0)
                }
            }
        }
    }
}

/// Ephemeral record of one executed (or attempted) command, handed to the
/// report sink and discarded.
#[derive(Debug, Clone, Default)]
pub struct ReportItem {
    pub handler: String,
    pub command: String,
    pub arg: String,
    pub trackable: Option<String>,
    pub result: String,
}

/// The serialized payload of one report line — what eventually gets
/// shipped back off the box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineRecord {
    pub handler: String,
    pub command: String,
    pub command_arg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trackable_id: Option<String>,
    pub result: String,
}

impl From<&ReportItem> for TimelineRecord {
    fn from(item: &ReportItem) -> Self {
        Self {
            handler: item.handler.clone(),
            command: item.command.clone(),
            command_arg: item.arg.clone(),
            trackable_id: item.trackable.clone(),
            result: item.result.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const SAMPLE: &str = r#"{
        "status": "Run",
        "handlers": [
            {
                "handler_type": "Command",
                "initial": "bash",
                "utc_time_on": "09:00:00",
                "utc_time_off": "17:00:00",
                "loop": true,
                "handler_args": {
                    "execution-probability": 75,
                    "delay-jitter": "20"
                },
                "events": [
                    {
                        "command": "random",
                        "command_args": ["whoami", "uptime", "ls -la"],
                        "delay_before": 0,
                        "delay_after": { "random": true, "min": 1000, "max": 5000 },
                        "trackable_id": "cmd-1"
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_sample_timeline() {
        let timeline = Timeline::from_json(SAMPLE).unwrap();
        assert_eq!(timeline.status, TimelineStatus::Run);
        assert_eq!(timeline.handlers.len(), 1);

        let handler = &timeline.handlers[0];
        assert_eq!(handler.handler_type, HandlerType::Command);
        assert!(handler.loop_forever);
        assert_eq!(handler.utc_time_on, NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(handler.events[0].trackable_id.as_deref(), Some("cmd-1"));
        assert_eq!(handler.events[0].args_as_strings().len(), 3);
    }

    #[test]
    fn missing_fields_default() {
        let timeline = Timeline::from_json(
            r#"{ "handlers": [ { "handler_type": "Curl", "events": [ { "command": "browse" } ] } ] }"#,
        )
        .unwrap();
        let handler = &timeline.handlers[0];
        assert_eq!(timeline.status, TimelineStatus::Run);
        assert!(!handler.loop_forever);
        assert!(handler.utc_time_on.is_none());
        assert_eq!(handler.execution_probability(), 100);

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(handler.events[0].delay_before.resolve(&mut rng), 0);
    }

    #[test]
    fn garbage_timeline_is_an_error() {
        assert!(Timeline::from_json("{ not json").is_err());
        assert!(Timeline::from_json(r#"{ "status": "Sideways" }"#).is_err());
    }

    #[test]
    fn execution_probability_normalizes() {
        let mut handler = Timeline::from_json(SAMPLE).unwrap().handlers.remove(0);
        assert_eq!(handler.execution_probability(), 75);

        handler
            .handler_args
            .insert("execution-probability".into(), Value::from(250));
        assert_eq!(handler.execution_probability(), 100);

        handler
            .handler_args
            .insert("execution-probability".into(), Value::from("nope"));
        assert_eq!(handler.execution_probability(), 100);

        handler
            .handler_args
            .insert("execution-probability".into(), Value::from("0"));
        assert_eq!(handler.execution_probability(), 0);
    }

    #[test]
    fn delay_shapes() {
        let mut rng = StdRng::seed_from_u64(7);

        let fixed: Delay = serde_json::from_str("2500").unwrap();
        assert_eq!(fixed.resolve(&mut rng), 2500);

        let negative: Delay = serde_json::from_str("-50").unwrap();
        assert_eq!(negative.resolve(&mut rng), 0);

        let random: Delay =
            serde_json::from_str(r#"{ "random": true, "min": 100, "max": 200 }"#).unwrap();
        for _ in 0..50 {
            let ms = random.resolve(&mut rng);
            assert!((100..=200).contains(&ms), "rolled {ms}");
        }

        let disabled: Delay =
            serde_json::from_str(r#"{ "random": false, "min": 100, "max": 200 }"#).unwrap();
        assert_eq!(disabled.resolve(&mut rng), 0);
    }

    #[test]
    fn record_from_report_item() {
        let item = ReportItem {
            handler: "Command".into(),
            command: "whoami".into(),
            arg: String::new(),
            trackable: None,
            result: "alice".into(),
        };
        let record = TimelineRecord::from(&item);
        assert_eq!(record.handler, "Command");
        assert_eq!(record.trackable_id, None);

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("trackable_id"));
    }
}
