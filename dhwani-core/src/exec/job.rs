use crate::artifact::Artifact;
use crate::request::SynthesisRequest;
use crate::settings::WorkerConfig;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::error;

/// The full argument surface of one external worker run. The worker is a
/// black box: argv in, exit code + stderr + artifact file out.
#[derive(Debug, Clone)]
pub struct WorkerInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Where the worker is told to write its output; success is judged by
    /// this file existing non-empty.
    pub expected_artifact: PathBuf,
}

impl WorkerInvocation {
    /// Build the synthesis argv the inference script expects.
    pub fn synthesis(config: &WorkerConfig, request: &SynthesisRequest, artifact: &Artifact) -> Self {
        let args = vec![
            config.script.clone(),
            "--sample_text".to_string(),
            request.text.clone(),
            "--language".to_string(),
            request.language.clone(),
            "--gender".to_string(),
            request.gender.clone(),
            "--alpha".to_string(),
            request.alpha.to_string(),
            "--output_file".to_string(),
            artifact.path.to_string_lossy().into_owned(),
        ];
        Self {
            program: config.program.clone(),
            args,
            working_dir: config.model_root.clone(),
            expected_artifact: artifact.path.clone(),
        }
    }
}

/// Execution state of one job. Transitions are monotonic: Pending →
/// Running → exactly one terminal state, never revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed | JobState::TimedOut)
    }
}

/// One admitted request bound to an allocated artifact path and a
/// process-level deadline. Exclusively owned by the pool slot executing it.
#[derive(Debug)]
pub struct Job {
    pub invocation: WorkerInvocation,
    pub artifact: Artifact,
    pub submitted_at: Instant,
    /// Process-level deadline the supervisor enforces.
    pub deadline: Duration,
    state: JobState,
}

impl Job {
    pub fn new(invocation: WorkerInvocation, artifact: Artifact, deadline: Duration) -> Self {
        Self {
            invocation,
            artifact,
            submitted_at: Instant::now(),
            deadline,
            state: JobState::Pending,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Advance the state machine. A transition out of a terminal state is a
    /// bug in the executor; it is logged loudly and ignored rather than
    /// allowed to corrupt the delivered result.
    pub fn advance(&mut self, next: JobState) {
        if self.state.is_terminal() {
            error!(current = ?self.state, ?next, "Ignoring job transition out of terminal state");
            debug_assert!(false, "job transition out of terminal state");
            return;
        }
        self.state = next;
    }
}
