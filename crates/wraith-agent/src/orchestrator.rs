//! Orchestrator — translates a timeline file into running handler tasks.
//!
//! One tokio task per handler, each with its own child cancellation
//! token. The timeline file is watched (mtime polling); an edit cancels
//! the whole generation of tasks and starts over with the new content.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wraith_core::{Result, Timeline, TimelineStatus, WraithConfig};
use wraith_engine::{HandlerRunner, ReportSink};
use wraith_invokers::InvokerRegistry;

/// Owns the handler tasks for the currently loaded timeline.
pub struct Orchestrator {
    config: WraithConfig,
    registry: Arc<InvokerRegistry>,
    sink: Arc<ReportSink>,
    /// Root token — cancelling it shuts the whole agent down.
    token: CancellationToken,
    /// Token for the current generation of handler tasks; replaced on
    /// every restart.
    generation: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Orchestrator {
    pub fn new(config: WraithConfig, registry: InvokerRegistry) -> Result<Self> {
        let sink = Arc::new(ReportSink::open(Path::new(&config.report_log))?);
        let token = CancellationToken::new();
        let generation = token.child_token();
        Ok(Self {
            config,
            registry: Arc::new(registry),
            sink,
            token,
            generation,
            tasks: Vec::new(),
        })
    }

    /// Root cancellation token — wire ctrl-c to this.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Handler tasks that have not finished yet.
    pub fn running_handlers(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// Spawn one task per handler in the timeline.
    pub fn start(&mut self, timeline: &Timeline) {
        if timeline.status != TimelineStatus::Run {
            tracing::info!("⏸️ Timeline {} is stopped; nothing to start", timeline.id);
            return;
        }
        tracing::info!(
            "🎭 Starting timeline {} ({} handlers)",
            timeline.id,
            timeline.handlers.len()
        );

        for handler in &timeline.handlers {
            let Some(invoker) = self.registry.get(handler.handler_type) else {
                tracing::warn!(
                    "No invoker registered for {}; skipping handler",
                    handler.handler_type
                );
                continue;
            };
            let mut runner = HandlerRunner::new(
                handler.clone(),
                invoker,
                self.sink.clone(),
                self.generation.child_token(),
            );
            self.tasks.push(tokio::spawn(async move {
                runner.run().await;
            }));
        }
    }

    /// Cancel the current generation of handler tasks and wait for each
    /// to wind down.
    pub async fn stop(&mut self) {
        self.generation.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!("Handler task did not exit cleanly: {e}");
            }
        }
        self.generation = self.token.child_token();
    }

    /// Run until the root token is cancelled: load the timeline, start
    /// its handlers, and restart everything whenever the file changes.
    pub async fn run(&mut self) -> Result<()> {
        let path = PathBuf::from(&self.config.timeline_path);
        let timeline = Timeline::from_file(&path)?;
        self.start(&timeline);

        let mut last_modified = modified_at(&path);
        let mut interval = tokio::time::interval(Duration::from_secs(
            self.config.reload_check_secs.max(1),
        ));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.token.cancelled() => {
                    tracing::info!("Shutting down timeline handlers");
                    self.stop().await;
                    return Ok(());
                }
                _ = interval.tick() => {}
            }

            let modified = modified_at(&path);
            if modified != last_modified {
                last_modified = modified;
                tracing::info!("📝 {} changed; restarting handlers", path.display());
                self.stop().await;
                match Timeline::from_file(&path) {
                    Ok(updated) => self.start(&updated),
                    // keep the old generation down rather than replaying
                    // a half-written file
                    Err(e) => tracing::error!("Ignoring bad timeline update: {e}"),
                }
            }
        }
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
