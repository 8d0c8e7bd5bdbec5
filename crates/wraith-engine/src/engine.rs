//! The timeline execution engine — one runner per handler.
//!
//! A runner walks its handler's ordered event list: working-hours gate,
//! pre-delay, dispatch, post-delay — looping over the whole list forever
//! when the handler asks for it. One bad command never kills the loop;
//! one dead pass never kills the process. Every pass opens an invoker
//! session up front and closes it on every exit path.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;
use wraith_core::{ReportItem, Result, TimelineEvent, TimelineHandler, WraithError};

use crate::invoker::{ActionInvoker, ActionSession};
use crate::report::ReportSink;
use crate::{jitter, working_hours};

/// The sentinel command: pick one of the event's args uniformly at
/// random, forever.
pub const RANDOM_COMMAND: &str = "random";

/// Breather after a failed pass, so a permanently broken invoker doesn't
/// spin a looping handler hot.
const FAILED_PASS_BACKOFF: Duration = Duration::from_secs(5);

/// Where a runner is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Executing,
    /// Single-shot pass finished (or gave up on an error). Terminal.
    Completed,
    /// The cancellation signal was observed. Terminal.
    Cancelled,
}

/// Drives one `TimelineHandler` to completion or cancellation.
pub struct HandlerRunner {
    handler: TimelineHandler,
    invoker: Arc<dyn ActionInvoker>,
    state: RunState,
    ctx: EngineCtx,
}

/// The runner's injected dependencies, split from the handler so the
/// event walk can borrow both sides at once.
struct EngineCtx {
    sink: Arc<ReportSink>,
    token: CancellationToken,
    rng: StdRng,
}

impl EngineCtx {
    /// Cancellable sleep — wakes as soon as the token fires.
    async fn sleep_ms(&self, ms: i64) -> Result<()> {
        tokio::select! {
            _ = self.token.cancelled() => Err(WraithError::Cancelled),
            _ = tokio::time::sleep(Duration::from_millis(ms.max(0) as u64)) => Ok(()),
        }
    }
}

impl HandlerRunner {
    pub fn new(
        handler: TimelineHandler,
        invoker: Arc<dyn ActionInvoker>,
        sink: Arc<ReportSink>,
        token: CancellationToken,
    ) -> Self {
        Self {
            handler,
            invoker,
            state: RunState::Idle,
            ctx: EngineCtx {
                sink,
                token,
                rng: StdRng::from_entropy(),
            },
        }
    }

    /// Seeded variant — identical behavior with reproducible delays,
    /// rolls, and picks.
    pub fn with_seed(
        handler: TimelineHandler,
        invoker: Arc<dyn ActionInvoker>,
        sink: Arc<ReportSink>,
        token: CancellationToken,
        seed: u64,
    ) -> Self {
        let mut runner = Self::new(handler, invoker, sink, token);
        runner.ctx.rng = StdRng::seed_from_u64(seed);
        runner
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn handler(&self) -> &TimelineHandler {
        &self.handler
    }

    /// Run the handler: exactly one pass for single-shot handlers, passes
    /// forever until cancellation for looping ones.
    ///
    /// Never panics the host. A pass that fails is logged; a looping
    /// handler then starts the next pass fresh.
    pub async fn run(&mut self) {
        self.state = RunState::Executing;
        tracing::info!(
            "🎬 {} runner starting ({} events, loop: {})",
            self.handler.handler_type,
            self.handler.events.len(),
            self.handler.loop_forever
        );

        if self.handler.loop_forever {
            loop {
                if self.ctx.token.is_cancelled() {
                    tracing::trace!("{} cancelled at pass boundary", self.handler.handler_type);
                    self.state = RunState::Cancelled;
                    break;
                }
                match self.run_once().await {
                    Ok(()) => {}
                    Err(e) if e.is_cancelled() => {
                        tracing::trace!("{} cancelled mid-pass", self.handler.handler_type);
                        self.state = RunState::Cancelled;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(
                            "{} pass failed: {e}; retrying with a fresh session",
                            self.handler.handler_type
                        );
                        if self.ctx.sleep_ms(FAILED_PASS_BACKOFF.as_millis() as i64).await.is_err() {
                            self.state = RunState::Cancelled;
                            break;
                        }
                    }
                }
            }
        } else {
            match self.run_once().await {
                Ok(()) => self.state = RunState::Completed,
                Err(e) if e.is_cancelled() => {
                    tracing::trace!("{} cancelled mid-pass", self.handler.handler_type);
                    self.state = RunState::Cancelled;
                }
                Err(e) => {
                    tracing::warn!("{} pass failed: {e}", self.handler.handler_type);
                    self.state = RunState::Completed;
                }
            }
        }

        tracing::info!(
            "🏁 {} runner finished ({:?})",
            self.handler.handler_type,
            self.state
        );
    }

    /// One pass over the handler's event list.
    ///
    /// Opens the invoker session (setup failure is fatal to this pass
    /// only), walks every event in order, and closes the session on every
    /// exit path — normal, error, or cancellation.
    pub async fn run_once(&mut self) -> Result<()> {
        let mut session = self.invoker.open(&self.handler).await?;
        let outcome = Self::walk_events(&self.handler, &mut self.ctx, session.as_mut()).await;
        if let Err(e) = session.close().await {
            tracing::debug!("{} session teardown: {e}", self.handler.handler_type);
        }
        outcome
    }

    async fn walk_events(
        handler: &TimelineHandler,
        ctx: &mut EngineCtx,
        session: &mut dyn ActionSession,
    ) -> Result<()> {
        let probability = handler.execution_probability();
        let jitter_factor =
            jitter::factor_parse(handler.arg("delay-jitter").as_deref().unwrap_or(""));

        for event in &handler.events {
            working_hours::wait(handler, &ctx.token).await?;

            let before = event.delay_before.resolve(&mut ctx.rng);
            if before > 0 {
                ctx.sleep_ms(before).await?;
            }

            tracing::trace!(
                "{} dispatching '{}' with delay after of {:?}",
                handler.handler_type,
                event.command,
                event.delay_after
            );

            if event.command == RANDOM_COMMAND {
                Self::random_loop(handler, ctx, session, event, probability, jitter_factor)
                    .await?;
            } else {
                let args = event.args_as_strings();
                let report_arg = args.join(" ");
                Self::dispatch(handler, ctx, session, event, &event.command, &args, &report_arg)
                    .await?;
            }

            let after = event.delay_after.resolve(&mut ctx.rng);
            if after > 0 {
                ctx.sleep_ms(after).await?;
            }
        }
        Ok(())
    }

    /// Execute one command, reporting on success.
    ///
    /// `command`/`args` are what the session runs; the report always
    /// carries the event's scripted command plus `report_arg`, so random
    /// picks show up as `random` + the chosen argument.
    ///
    /// Action failures are logged and absorbed — the remaining events in
    /// the list still run. Setup failures and cancellation propagate.
    async fn dispatch(
        handler: &TimelineHandler,
        ctx: &mut EngineCtx,
        session: &mut dyn ActionSession,
        event: &TimelineEvent,
        command: &str,
        args: &[String],
        report_arg: &str,
    ) -> Result<()> {
        match session.execute(command, args, event).await {
            Ok(result) => {
                ctx.sink.report(&ReportItem {
                    handler: handler.handler_type.to_string(),
                    command: event.command.clone(),
                    arg: report_arg.to_string(),
                    trackable: event.trackable_id.clone(),
                    result,
                });
                Ok(())
            }
            Err(e @ (WraithError::Cancelled | WraithError::Setup(_))) => Err(e),
            Err(e) => {
                tracing::warn!("{} command '{command}' failed: {e}", handler.handler_type);
                Ok(())
            }
        }
    }

    /// The `"random"` sub-loop: each iteration rolls the execution
    /// probability, picks one argument uniformly, executes it, and sleeps
    /// the jittered post-delay. A skipped roll still sleeps the full
    /// post-delay — the outward request cadence stays the same.
    ///
    /// Deliberately unbounded: it ignores the handler's own `loop` flag
    /// and exits only via cancellation.
    async fn random_loop(
        handler: &TimelineHandler,
        ctx: &mut EngineCtx,
        session: &mut dyn ActionSession,
        event: &TimelineEvent,
        probability: i64,
        jitter_factor: i64,
    ) -> Result<()> {
        let pool = event.args_as_strings();
        if pool.is_empty() {
            tracing::error!(
                "{} 'random' event has an empty argument pool; skipping it",
                handler.handler_type
            );
            return Ok(());
        }

        loop {
            if ctx.token.is_cancelled() {
                return Err(WraithError::Cancelled);
            }

            if !roll_allows(probability, &mut ctx.rng) {
                tracing::trace!(
                    "{} random pick skipped by execution probability",
                    handler.handler_type
                );
            } else if let Some(pick) = pool.choose(&mut ctx.rng) {
                // the chosen argument is itself the thing to execute
                Self::dispatch(handler, ctx, session, event, pick, &[], pick).await?;
            }

            let after = jitter::apply(
                event.delay_after.resolve(&mut ctx.rng),
                jitter_factor,
                &mut ctx.rng,
            );
            ctx.sleep_ms(after.max(1)).await?;
        }
    }
}

/// One execution-probability roll: a uniform draw in [0, 100) against the
/// configured percentage. 0 never passes, 100 always does.
fn roll_allows(probability: i64, rng: &mut impl Rng) -> bool {
    rng.gen_range(0..100) < probability
}
