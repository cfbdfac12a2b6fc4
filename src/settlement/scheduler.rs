// Settlement Scheduler - automatic settlement of unsettled funds
//
// Every tick (1s by default):
// - Re-reads context, balances, preference and clock
// - Runs the guard (kill switch, accounts, preference, unsettled funds,
//   cooldown, auto-approve, connection)
// - Marks last_settled_at and spawns the settlement when the guard passes
//
// The scheduler task is the single writer of guard state. Settlement
// outcomes come back over a channel; failures are logged and never stop the
// loop or roll back the cooldown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::SettlementError;
use crate::panel::{PanelContext, PreferenceStore};
use crate::settlement::guard::{evaluate_auto, AutoSettleInputs, GuardState, SkipReason};
use crate::settlement::{run_settlement, SettlementOperation, SettlementRequest};

/// Wall-clock source in milliseconds since the epoch
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Snapshot published after every tick and completion
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SchedulerStatus {
    pub state: GuardState,
    /// 0 until the first automatic trigger
    pub last_settled_at_ms: i64,
    pub attempts: u64,
    pub failures: u64,
    pub last_skip: Option<SkipReason>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct Completion {
    pub attempt_id: Uuid,
    pub result: Result<(), SettlementError>,
}

#[derive(Debug)]
pub enum TickOutcome {
    Skipped(SkipReason),
    Fired { attempt_id: Uuid, handle: JoinHandle<()> },
}

pub struct AutoSettler {
    context: Arc<dyn PanelContext>,
    preferences: Arc<dyn PreferenceStore>,
    operation: Arc<dyn SettlementOperation>,
    clock: Arc<dyn Clock>,
    override_active: bool,
    cooldown_ms: i64,
    state: GuardState,
    last_settled_at_ms: i64,
    attempts: u64,
    failures: u64,
    last_skip: Option<SkipReason>,
    last_error: Option<String>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: Option<mpsc::UnboundedReceiver<Completion>>,
    status_tx: watch::Sender<SchedulerStatus>,
}

impl AutoSettler {
    pub fn new(
        context: Arc<dyn PanelContext>,
        preferences: Arc<dyn PreferenceStore>,
        operation: Arc<dyn SettlementOperation>,
        clock: Arc<dyn Clock>,
        override_active: bool,
        cooldown: Duration,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(SchedulerStatus {
            state: GuardState::Idle,
            last_settled_at_ms: 0,
            attempts: 0,
            failures: 0,
            last_skip: None,
            last_error: None,
        });

        Self {
            context,
            preferences,
            operation,
            clock,
            override_active,
            cooldown_ms: i64::try_from(cooldown.as_millis()).unwrap_or(i64::MAX),
            state: GuardState::Idle,
            last_settled_at_ms: 0,
            attempts: 0,
            failures: 0,
            last_skip: None,
            last_error: None,
            completions_tx,
            completions_rx: Some(completions_rx),
            status_tx,
        }
    }

    pub fn status(&self) -> watch::Receiver<SchedulerStatus> {
        self.status_tx.subscribe()
    }

    pub fn last_settled_at_ms(&self) -> i64 {
        self.last_settled_at_ms
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// One scheduler cycle: evaluate the guard and fire at most one settlement
    pub fn tick(&mut self) -> TickOutcome {
        let now_ms = self.clock.now_ms();
        self.state = self.state.refresh(now_ms);

        let context = self.context.context();
        let balances = self.context.balances();
        let inputs = AutoSettleInputs {
            override_active: self.override_active,
            context: &context,
            balances: &balances,
            auto_settle_enabled: self.preferences.auto_settle_enabled(),
            now_ms,
        };

        let outcome = match evaluate_auto(&inputs, &self.state) {
            Err(reason) => {
                if self.last_skip != Some(reason) {
                    debug!("Auto-settle skipped: {:?}", reason);
                }
                self.last_skip = Some(reason);
                TickOutcome::Skipped(reason)
            }
            Ok(request) => {
                let attempt_id = Uuid::new_v4();
                self.last_settled_at_ms = now_ms;
                self.state = GuardState::Invoking {
                    attempt_id,
                    started_at_ms: now_ms,
                };
                self.attempts += 1;
                self.last_skip = None;

                let handle = self.spawn_settlement(attempt_id, request);
                TickOutcome::Fired { attempt_id, handle }
            }
        };

        self.publish();
        outcome
    }

    fn spawn_settlement(&self, attempt_id: Uuid, request: SettlementRequest) -> JoinHandle<()> {
        let operation = self.operation.clone();
        let completions = self.completions_tx.clone();

        tokio::spawn(async move {
            info!("🔄 Settling funds... (attempt {})", attempt_id);
            // Always report back, even if the operation panics
            let result = run_settlement(operation.as_ref(), request).await;
            match &result {
                Ok(()) => info!("✓ Finished settling funds."),
                Err(e) => warn!("❌ Error auto settling funds: {}", e),
            }
            // Scheduler gone means the panel was torn down; nothing left to update
            let _ = completions.send(Completion { attempt_id, result });
        })
    }

    /// Apply a settlement outcome reported by a spawned attempt
    pub fn complete(&mut self, completion: Completion) {
        let now_ms = self.clock.now_ms();

        match self.state {
            GuardState::Invoking { attempt_id, .. } if attempt_id == completion.attempt_id => {
                self.state =
                    GuardState::after_completion(self.last_settled_at_ms, self.cooldown_ms, now_ms);
            }
            _ => warn!(
                "Ignoring completion for attempt {} (state: {:?})",
                completion.attempt_id, self.state
            ),
        }

        match completion.result {
            Ok(()) => self.last_error = None,
            Err(e) => {
                self.failures += 1;
                self.last_error = Some(e.to_string());
            }
        }

        self.publish();
    }

    fn publish(&self) {
        self.status_tx.send_replace(SchedulerStatus {
            state: self.state,
            last_settled_at_ms: self.last_settled_at_ms,
            attempts: self.attempts,
            failures: self.failures,
            last_skip: self.last_skip,
            last_error: self.last_error.clone(),
        });
    }

    /// Run the tick loop on its own task until the handle is dropped
    pub fn start(self, tick_interval: Duration) -> SchedulerHandle {
        SchedulerHandle {
            task: tokio::spawn(self.run(tick_interval)),
        }
    }

    async fn run(mut self, tick_interval: Duration) {
        let Some(mut completions) = self.completions_rx.take() else {
            error!("Auto-settle scheduler started twice; refusing to run");
            return;
        };

        // First tick one period after start, then every period
        let mut ticker = interval_at(Instant::now() + tick_interval, tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "⏰ Auto-settle scheduler started (tick: {}ms, cooldown: {}ms, kill switch: {})",
            tick_interval.as_millis(),
            self.cooldown_ms,
            self.override_active
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _ = self.tick();
                }
                Some(completion) = completions.recv() => {
                    self.complete(completion);
                }
            }
        }
    }

    #[cfg(test)]
    fn drain_completions(&mut self) -> usize {
        let done: Vec<Completion> = match self.completions_rx.as_mut() {
            Some(rx) => std::iter::from_fn(|| rx.try_recv().ok()).collect(),
            None => Vec::new(),
        };
        let count = done.len();
        for completion in done {
            self.complete(completion);
        }
        count
    }
}

/// Owns the tick task; dropping it stops automatic settlement.
///
/// Attempts already in flight run to completion on their own tasks.
pub struct SchedulerHandle {
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub async fn shutdown(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
        info!("⏹️  Auto-settle scheduler stopped");
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
