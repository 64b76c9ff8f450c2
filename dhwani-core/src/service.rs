use crate::artifact::ArtifactStore;
use crate::error::SynthesisError;
use crate::exec::{Job, Outcome, SupervisorOptions, WorkerInvocation, WorkerPool};
use crate::request::{RawRequest, SynthesisRequest};
use crate::resources::ResourceChecker;
use crate::settings::{Config, WorkerConfig};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Result of one successful synthesis run.
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    /// File name under the artifact directory; the piece clients address.
    pub file_name: String,
    pub path: PathBuf,
    pub elapsed: Duration,
}

/// The orchestration core: validate, preflight, allocate, dispatch, wait,
/// classify. Constructed once at startup and shared by all request
/// handlers; owns the artifact store and the worker pool.
pub struct SynthesisService {
    checker: ResourceChecker,
    store: Arc<ArtifactStore>,
    pool: WorkerPool,
    worker: WorkerConfig,
    max_text_chars: usize,
    request_timeout: Duration,
    worker_timeout: Duration,
}

impl SynthesisService {
    pub fn new(config: &Config) -> Result<Self> {
        let store = Arc::new(ArtifactStore::open(&config.artifacts.dir)?);
        let options = SupervisorOptions {
            kill_grace: config.kill_grace(),
            max_capture_bytes: config.worker.max_capture_bytes,
        };
        let pool = WorkerPool::new(
            config.pool.slots,
            config.pool.max_queue_depth,
            store.clone(),
            options,
        );
        Ok(Self {
            checker: ResourceChecker::new(&config.worker.model_root),
            store,
            pool,
            worker: config.worker.clone(),
            max_text_chars: config.artifacts.max_text_chars,
            request_timeout: config.request_timeout(),
            worker_timeout: config.worker_timeout(),
        })
    }

    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    pub fn checker(&self) -> &ResourceChecker {
        &self.checker
    }

    /// Run one request end to end. Validation and resource preflight happen
    /// before any pool slot or artifact path is taken, so bad requests cost
    /// nothing but the parse.
    pub async fn synthesize(&self, raw: RawRequest) -> Result<SynthesisOutput, SynthesisError> {
        let started = Instant::now();
        let request = SynthesisRequest::validate(raw, self.max_text_chars)?;
        self.checker.check(&request.language, &request.gender)?;

        let artifact = self.store.allocate(&request.language, &request.gender);
        let invocation = WorkerInvocation::synthesis(&self.worker, &request, &artifact);
        let job = Job::new(invocation, artifact.clone(), self.worker_timeout);

        let handle = self.pool.submit(job)?;
        let outcome = handle.wait(self.request_timeout).await?;

        match outcome {
            Outcome::Succeeded => {
                let elapsed = started.elapsed();
                info!(
                    file = %artifact.file_name,
                    language = %request.language,
                    gender = %request.gender,
                    ?elapsed,
                    "Synthesis completed"
                );
                Ok(SynthesisOutput {
                    file_name: artifact.file_name,
                    path: artifact.path,
                    elapsed,
                })
            }
            Outcome::TimedOut => Err(SynthesisError::TimedOut),
            Outcome::ProcessFailed {
                exit_code,
                stderr_tail,
            } => Err(SynthesisError::ProcessFailed {
                exit_code,
                stderr_tail,
            }),
            Outcome::ArtifactMissing => Err(SynthesisError::ArtifactMissing),
        }
    }
}
