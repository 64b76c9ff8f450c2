use crate::artifact::ArtifactStore;
use crate::error::SynthesisError;
use crate::exec::job::{Job, JobState};
use crate::exec::supervisor::{self, Outcome, SupervisorOptions};
use anyhow::anyhow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Semaphore};
use tracing::{error, info};

/// Fixed-size pool of synthesis slots.
///
/// Saturation policy: blocking with a bounded queue. `submit` admits up to
/// `slots + max_queue_depth` jobs; admitted jobs wait on the slot semaphore,
/// anything beyond the cap is rejected immediately with `PoolSaturated`.
/// Exactly one supervisor invocation happens per admitted job, and at most
/// `slots` jobs run concurrently.
pub struct WorkerPool {
    slots: Arc<Semaphore>,
    admission: Arc<Semaphore>,
    store: Arc<ArtifactStore>,
    options: SupervisorOptions,
    slot_count: usize,
}

impl WorkerPool {
    pub fn new(
        slots: usize,
        max_queue_depth: usize,
        store: Arc<ArtifactStore>,
        options: SupervisorOptions,
    ) -> Self {
        assert!(slots > 0, "pool needs at least one slot");
        Self {
            slots: Arc::new(Semaphore::new(slots)),
            admission: Arc::new(Semaphore::new(slots + max_queue_depth)),
            store,
            options,
            slot_count: slots,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Hand a job to the executor. Returns a handle that resolves once the
    /// job reaches a terminal state; the handle's own deadline is purely an
    /// observation bound and never shortens the worker's life.
    pub fn submit(&self, mut job: Job) -> Result<JobHandle, SynthesisError> {
        let admitted = self
            .admission
            .clone()
            .try_acquire_owned()
            .map_err(|_| SynthesisError::PoolSaturated)?;

        let slots = self.slots.clone();
        let store = self.store.clone();
        let options = self.options.clone();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            // Held for the whole run: admission capacity frees only when the
            // job is done, so the queue bound counts running jobs too.
            let _admitted = admitted;
            let Ok(_slot) = slots.acquire_owned().await else {
                // Pool dropped during shutdown; the job never ran.
                return;
            };

            job.advance(JobState::Running);
            let result = supervisor::run(&job.invocation, job.deadline, &options).await;

            let delivered: Result<Outcome, SynthesisError> = match result {
                Ok(outcome) => {
                    match &outcome {
                        Outcome::Succeeded => job.advance(JobState::Succeeded),
                        Outcome::TimedOut => {
                            job.advance(JobState::TimedOut);
                            store.discard(&job.artifact.path);
                        }
                        Outcome::ProcessFailed { .. } | Outcome::ArtifactMissing => {
                            job.advance(JobState::Failed);
                            store.discard(&job.artifact.path);
                        }
                    }
                    Ok(outcome)
                }
                Err(e) => {
                    error!(error = ?e, artifact = %job.artifact.file_name, "Worker invocation failed");
                    job.advance(JobState::Failed);
                    store.discard(&job.artifact.path);
                    Err(SynthesisError::Internal(e))
                }
            };

            info!(
                artifact = %job.artifact.file_name,
                state = ?job.state(),
                elapsed = ?job.submitted_at.elapsed(),
                "Job finished"
            );
            // The caller may have stopped waiting; that is fine, the job
            // already converged and cleanup already happened.
            let _ = tx.send(delivered);
        });

        Ok(JobHandle { rx })
    }
}

/// Deadline-bounded result handle for one submitted job.
#[derive(Debug)]
pub struct JobHandle {
    rx: oneshot::Receiver<Result<Outcome, SynthesisError>>,
}

impl JobHandle {
    /// Wait until the job reaches a terminal state or `deadline` elapses.
    /// A caller-level timeout only affects what this caller observes; the
    /// supervisor still converges the job and reclaims the process on its
    /// own schedule.
    pub async fn wait(self, deadline: Duration) -> Result<Outcome, SynthesisError> {
        match tokio::time::timeout(deadline, self.rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(SynthesisError::Internal(anyhow!(
                "job executor dropped without delivering a result"
            ))),
            Err(_) => Err(SynthesisError::TimedOut),
        }
    }
}
