//! Shell invoker — runs timeline commands under a shell, the way a user
//! at a terminal would.

use std::time::Duration;

use async_trait::async_trait;
use wraith_core::{Result, TimelineEvent, TimelineHandler, WraithError};
use wraith_engine::{ActionInvoker, ActionSession};

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Factory for shell sessions. The handler's `initial` field overrides
/// the shell binary; `command-timeout-secs` caps each command.
pub struct ShellInvoker {
    default_shell: String,
}

impl ShellInvoker {
    pub fn new() -> Self {
        Self::with_shell("bash")
    }

    pub fn with_shell(shell: &str) -> Self {
        Self {
            default_shell: shell.to_string(),
        }
    }
}

impl Default for ShellInvoker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionInvoker for ShellInvoker {
    fn name(&self) -> &str {
        "shell"
    }

    async fn open(&self, handler: &TimelineHandler) -> Result<Box<dyn ActionSession>> {
        let shell = if handler.initial.is_empty() {
            self.default_shell.clone()
        } else {
            handler.initial.clone()
        };
        let timeout_secs = handler
            .arg("command-timeout-secs")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        tracing::debug!("Opening {shell} session for {}", handler.handler_type);
        Ok(Box::new(ShellSession {
            shell,
            timeout: Duration::from_secs(timeout_secs),
        }))
    }
}

struct ShellSession {
    shell: String,
    timeout: Duration,
}

#[async_trait]
impl ActionSession for ShellSession {
    async fn execute(
        &mut self,
        command: &str,
        args: &[String],
        _event: &TimelineEvent,
    ) -> Result<String> {
        let mut line = command.to_string();
        if !args.is_empty() {
            line.push(' ');
            line.push_str(&args.join(" "));
        }
        tracing::trace!("{} -c {line}", self.shell);

        let run = tokio::time::timeout(
            self.timeout,
            tokio::process::Command::new(&self.shell)
                .arg("-c")
                .arg(&line)
                .output(),
        )
        .await;

        match run {
            Ok(Ok(output)) => {
                let mut result = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr);
                if !stderr.is_empty() {
                    result.push_str(&stderr);
                }
                Ok(result)
            }
            // the shell itself is missing or unspawnable — every other
            // command in this session would fail the same way
            Ok(Err(e)) => Err(WraithError::Setup(format!(
                "'{}' failed to spawn: {e}",
                self.shell
            ))),
            Err(_) => Err(WraithError::Action(format!(
                "'{line}' timed out after {:?}",
                self.timeout
            ))),
        }
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use serde_json::Value;
    use wraith_core::{Delay, HandlerType};

    fn handler(initial: &str, args: HashMap<String, Value>) -> TimelineHandler {
        TimelineHandler {
            handler_type: HandlerType::Command,
            initial: initial.into(),
            utc_time_on: None,
            utc_time_off: None,
            loop_forever: false,
            handler_args: args,
            events: Vec::new(),
        }
    }

    fn event() -> TimelineEvent {
        TimelineEvent {
            command: "noop".into(),
            command_args: Vec::new(),
            delay_before: Delay::Fixed(0),
            delay_after: Delay::Fixed(0),
            trackable_id: None,
        }
    }

    #[tokio::test]
    async fn captures_stdout() {
        let invoker = ShellInvoker::new();
        let mut session = invoker.open(&handler("", HashMap::new())).await.unwrap();
        let out = session
            .execute("echo wraith-was-here", &[], &event())
            .await
            .unwrap();
        assert!(out.contains("wraith-was-here"));
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn captures_stderr_too() {
        let invoker = ShellInvoker::new();
        let mut session = invoker.open(&handler("", HashMap::new())).await.unwrap();
        let out = session
            .execute("echo oops 1>&2", &[], &event())
            .await
            .unwrap();
        assert!(out.contains("oops"));
    }

    #[tokio::test]
    async fn missing_shell_is_a_setup_error() {
        let invoker = ShellInvoker::new();
        let mut session = invoker
            .open(&handler("/no/such/shell", HashMap::new()))
            .await
            .unwrap();
        let err = session.execute("true", &[], &event()).await.unwrap_err();
        assert!(matches!(err, WraithError::Setup(_)));
    }

    #[tokio::test]
    async fn slow_command_times_out_as_an_action_error() {
        let mut args = HashMap::new();
        args.insert("command-timeout-secs".into(), Value::from(1));
        let invoker = ShellInvoker::new();
        let mut session = invoker.open(&handler("", args)).await.unwrap();
        let err = session.execute("sleep 5", &[], &event()).await.unwrap_err();
        assert!(matches!(err, WraithError::Action(_)));
    }
}
