//! Queue-dispatched recomputation of trust profiles.
//!
//! Notifications are fire-and-forget: they enqueue a task and return. A pool
//! of workers drains the queue, runs the blocking computation under a time
//! budget, and retries transient failures with backoff. A candidate already
//! waiting in the queue is not enqueued twice; once a worker picks it up, new
//! notifications queue a fresh run. Correctness under concurrent runs relies
//! on the store's last-write-wins replace, not on queue order.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::domain::{CandidateId, CriOutcome};
use super::repository::{ContractStore, TrustProfileStore};
use super::service::{RecomputeError, TrustProfileService};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Exponential delay between retry attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        if !delay_secs.is_finite() || delay_secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(delay_secs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecomputeConfig {
    pub workers: usize,
    pub max_attempts: u32,
    pub task_timeout: Duration,
    pub backoff: BackoffPolicy,
}

impl Default for RecomputeConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_attempts: 5,
            task_timeout: Duration::from_secs(30),
            backoff: BackoffPolicy::default(),
        }
    }
}

#[derive(Debug)]
struct RecomputeTask {
    candidate_id: CandidateId,
    reason: String,
    enqueued_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    coalesced: AtomicU64,
    completed: AtomicU64,
    uncomputable: AtomicU64,
    retried: AtomicU64,
    failed: AtomicU64,
}

/// Snapshot of trigger activity since start-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecomputeStats {
    pub enqueued: u64,
    pub coalesced: u64,
    pub completed: u64,
    pub uncomputable: u64,
    pub retried: u64,
    pub failed: u64,
}

/// Handle used by contract-mutation paths to request a recompute.
#[derive(Clone)]
pub struct RecomputeTrigger {
    sender: Arc<Mutex<Option<UnboundedSender<RecomputeTask>>>>,
    queued: Arc<Mutex<HashSet<CandidateId>>>,
    counters: Arc<Counters>,
}

/// Join handles for the worker pool.
pub struct RecomputeWorkers {
    handles: Vec<JoinHandle<()>>,
}

impl RecomputeTrigger {
    /// Start the worker pool. Must be called from within a Tokio runtime.
    pub fn spawn<C, S>(
        service: Arc<TrustProfileService<C, S>>,
        config: RecomputeConfig,
    ) -> (Self, RecomputeWorkers)
    where
        C: ContractStore + 'static,
        S: TrustProfileStore + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let queued = Arc::new(Mutex::new(HashSet::new()));
        let counters = Arc::new(Counters::default());
        let config = Arc::new(config);

        let handles = (0..config.workers.max(1))
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    receiver.clone(),
                    service.clone(),
                    queued.clone(),
                    counters.clone(),
                    config.clone(),
                ))
            })
            .collect();

        let trigger = Self {
            sender: Arc::new(Mutex::new(Some(sender))),
            queued,
            counters,
        };
        (trigger, RecomputeWorkers { handles })
    }

    /// Request a recompute. `reason` is recorded in logs only.
    pub fn notify_contracts_changed(&self, candidate_id: CandidateId, reason: impl Into<String>) {
        let reason = reason.into();
        let sender = lock(&self.sender);
        let Some(sender) = sender.as_ref() else {
            warn!(candidate = %candidate_id, %reason, "recompute trigger closed; dropping notification");
            return;
        };

        if !lock(&self.queued).insert(candidate_id.clone()) {
            self.counters.coalesced.fetch_add(1, Ordering::Relaxed);
            debug!(candidate = %candidate_id, %reason, "recompute already queued");
            return;
        }

        let task = RecomputeTask {
            candidate_id,
            reason,
            enqueued_at: Utc::now(),
        };
        match sender.send(task) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
            }
            Err(mpsc::error::SendError(task)) => {
                lock(&self.queued).remove(&task.candidate_id);
                warn!(candidate = %task.candidate_id, "recompute workers stopped; dropping notification");
            }
        }
    }

    pub fn stats(&self) -> RecomputeStats {
        let counters = &self.counters;
        RecomputeStats {
            enqueued: counters.enqueued.load(Ordering::Relaxed),
            coalesced: counters.coalesced.load(Ordering::Relaxed),
            completed: counters.completed.load(Ordering::Relaxed),
            uncomputable: counters.uncomputable.load(Ordering::Relaxed),
            retried: counters.retried.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting notifications. Workers finish the queued tasks and exit.
    pub fn close(&self) {
        lock(&self.sender).take();
    }
}

impl RecomputeWorkers {
    /// Wait for every worker to drain the queue and exit.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(error) = handle.await {
                error!(%error, "recompute worker panicked");
            }
        }
    }
}

async fn run_worker<C, S>(
    worker: usize,
    receiver: Arc<tokio::sync::Mutex<UnboundedReceiver<RecomputeTask>>>,
    service: Arc<TrustProfileService<C, S>>,
    queued: Arc<Mutex<HashSet<CandidateId>>>,
    counters: Arc<Counters>,
    config: Arc<RecomputeConfig>,
) where
    C: ContractStore + 'static,
    S: TrustProfileStore + 'static,
{
    loop {
        let task = receiver.lock().await.recv().await;
        let Some(task) = task else {
            debug!(worker, "recompute queue closed");
            break;
        };
        lock(&queued).remove(&task.candidate_id);

        debug!(
            worker,
            candidate = %task.candidate_id,
            reason = %task.reason,
            waited_ms = (Utc::now() - task.enqueued_at).num_milliseconds(),
            "recompute started"
        );
        process_task(&task, &service, &counters, &config).await;
    }
}

async fn process_task<C, S>(
    task: &RecomputeTask,
    service: &Arc<TrustProfileService<C, S>>,
    counters: &Counters,
    config: &RecomputeConfig,
) where
    C: ContractStore + 'static,
    S: TrustProfileStore + 'static,
{
    let max_attempts = config.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match run_once(&task.candidate_id, service, config.task_timeout).await {
            Ok(CriOutcome::Scored(_)) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
                return;
            }
            Ok(CriOutcome::Uncomputable(_)) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
                counters.uncomputable.fetch_add(1, Ordering::Relaxed);
                return;
            }
            Err(error) if error.is_transient() && attempt < max_attempts => {
                let delay = config.backoff.delay_for_attempt(attempt);
                counters.retried.fetch_add(1, Ordering::Relaxed);
                warn!(
                    candidate = %task.candidate_id,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    %error,
                    "transient recompute failure; retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    candidate = %task.candidate_id,
                    attempt,
                    reason = %task.reason,
                    %error,
                    "recompute failed"
                );
                return;
            }
        }
    }
}

async fn run_once<C, S>(
    candidate_id: &CandidateId,
    service: &Arc<TrustProfileService<C, S>>,
    budget: Duration,
) -> Result<CriOutcome, RecomputeError>
where
    C: ContractStore + 'static,
    S: TrustProfileStore + 'static,
{
    let service = service.clone();
    let candidate = candidate_id.clone();
    let work = tokio::task::spawn_blocking(move || service.recompute(&candidate));

    match tokio::time::timeout(budget, work).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(RecomputeError::Worker(join_error.to_string())),
        Err(_elapsed) => {
            info!(candidate = %candidate_id, "recompute exceeded time budget");
            Err(RecomputeError::TimedOut {
                budget_ms: budget.as_millis() as u64,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially_up_to_the_cap() {
        let policy = BackoffPolicy {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            multiplier: 2.0,
        };

        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(60), Duration::from_millis(500));
    }
}
