//! Live opinion counter shown on the creation page.

use std::{sync::Arc, time::Duration};

use serde_json::Value;
use shared::domain::QuestionId;
use tokio::{
    sync::watch,
    task::{JoinHandle, JoinSet},
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::BackendGateway;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Count requests allowed in flight at once; ticks beyond this are skipped.
pub const MAX_PENDING_POLLS: usize = 4;

/// What the counter widget should show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterDisplay {
    pub visible: bool,
    pub question_id: Option<QuestionId>,
    /// Last count received for `question_id`; `None` until the first successful poll.
    pub count: Option<u64>,
    generation: u64,
}

struct PollSchedule {
    question_id: QuestionId,
    task: JoinHandle<()>,
}

/// Owns at most one recurring count request at a time.
///
/// Must be started from within a tokio runtime. Dropping the poller cancels its schedule.
pub struct LiveCounterPoller {
    gateway: Arc<dyn BackendGateway>,
    interval: Duration,
    display: Arc<watch::Sender<CounterDisplay>>,
    schedule: Option<PollSchedule>,
}

impl LiveCounterPoller {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        Self::with_interval(gateway, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_interval(gateway: Arc<dyn BackendGateway>, interval: Duration) -> Self {
        let (display, _) = watch::channel(CounterDisplay::default());
        Self {
            gateway,
            interval,
            display: Arc::new(display),
            schedule: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CounterDisplay> {
        self.display.subscribe()
    }

    pub fn display(&self) -> CounterDisplay {
        self.display.borrow().clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn active_question(&self) -> Option<&QuestionId> {
        self.schedule.as_ref().map(|schedule| &schedule.question_id)
    }

    pub fn is_running(&self) -> bool {
        self.schedule
            .as_ref()
            .is_some_and(|schedule| !schedule.task.is_finished())
    }

    /// Shows the counter and polls `question_id` now and then every interval,
    /// replacing whatever schedule was running before.
    pub fn start(&mut self, question_id: QuestionId) {
        self.stop();

        let mut generation = 0;
        self.display.send_modify(|display| {
            display.generation += 1;
            generation = display.generation;
            display.visible = true;
            display.question_id = Some(question_id.clone());
            display.count = None;
        });

        let task = tokio::spawn(run_schedule(
            Arc::clone(&self.gateway),
            question_id.clone(),
            self.interval,
            Arc::clone(&self.display),
            generation,
        ));
        info!(
            %question_id,
            interval_ms = self.interval.as_millis() as u64,
            "opinion counter started"
        );
        self.schedule = Some(PollSchedule { question_id, task });
    }

    /// Cancels the schedule, including requests still in flight. The last count stays shown.
    pub fn stop(&mut self) {
        if let Some(schedule) = self.schedule.take() {
            schedule.task.abort();
            debug!(question_id = %schedule.question_id, "opinion counter stopped");
        }
    }
}

impl Drop for LiveCounterPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_schedule(
    gateway: Arc<dyn BackendGateway>,
    question_id: QuestionId,
    period: Duration,
    display: Arc<watch::Sender<CounterDisplay>>,
    generation: u64,
) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Dropped with this task on abort, which aborts every request still in flight.
    let mut inflight = JoinSet::new();
    let mut issued = 0u64;
    let mut applied = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if inflight.len() >= MAX_PENDING_POLLS {
                    debug!(%question_id, pending = inflight.len(), "skipping tick, backend is slow");
                    continue;
                }
                issued += 1;
                let seq = issued;
                let gateway = Arc::clone(&gateway);
                let question_id = question_id.clone();
                inflight.spawn(async move {
                    (seq, fetch_count(gateway.as_ref(), &question_id).await)
                });
            }
            Some(joined) = inflight.join_next(), if !inflight.is_empty() => {
                let Ok((seq, Some(count))) = joined else {
                    continue;
                };
                if seq < applied {
                    debug!(%question_id, seq, applied, "dropping stale opinion count");
                    continue;
                }
                applied = seq;
                display.send_if_modified(|current| {
                    if current.generation != generation || current.count == Some(count) {
                        return false;
                    }
                    current.count = Some(count);
                    true
                });
            }
        }
    }
}

/// One tick. Every failure is silent: the counter keeps its previous value.
async fn fetch_count(gateway: &dyn BackendGateway, question_id: &QuestionId) -> Option<u64> {
    let response = match gateway.opinion_count(question_id).await {
        Ok(response) => response,
        Err(err) => {
            debug!(%question_id, "opinion count request failed: {err}");
            return None;
        }
    };
    if !response.is_success() {
        debug!(%question_id, status = response.status, "opinion count rejected");
        return None;
    }
    let count = response
        .json::<Value>()
        .and_then(|body| body.get("count").and_then(count_value));
    if count.is_none() {
        debug!(%question_id, "opinion count response carried no numeric count");
    }
    count
}

/// A non-negative JSON number with no fractional part; `4` and `4.0` both read as 4.
fn count_value(value: &Value) -> Option<u64> {
    if let Some(count) = value.as_u64() {
        return Some(count);
    }
    let count = value.as_f64()?;
    (count >= 0.0 && count.fract() == 0.0 && count <= u64::MAX as f64).then_some(count as u64)
}

#[cfg(test)]
#[path = "tests/poller_tests.rs"]
mod tests;
