use thiserror::Error;

/// Which preflight resource was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingResource {
    Model,
    PhoneDictionary,
}

impl std::fmt::Display for MissingResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingResource::Model => write!(f, "TTS model"),
            MissingResource::PhoneDictionary => write!(f, "phone dictionary"),
        }
    }
}

/// Everything that can go wrong between request admission and response.
///
/// Validation and resource errors are detected before a pool slot is
/// consumed. Process-level outcomes are classified by the supervisor and
/// passed up unchanged; nothing here is ever retried automatically.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("{which} for {language} ({gender}) is not available")]
    ResourceNotFound {
        which: MissingResource,
        language: String,
        gender: String,
    },

    #[error("all synthesis slots are busy, try again shortly")]
    PoolSaturated,

    #[error("synthesis timed out")]
    TimedOut,

    #[error("synthesis worker failed (exit code {exit_code})")]
    ProcessFailed { exit_code: i32, stderr_tail: String },

    #[error("synthesis worker produced no audio output")]
    ArtifactMissing,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl SynthesisError {
    /// Message safe to show to a client. Stderr tails and filesystem detail
    /// stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            SynthesisError::Validation(reason) => reason.clone(),
            SynthesisError::ResourceNotFound { .. } => self.to_string(),
            SynthesisError::PoolSaturated => self.to_string(),
            SynthesisError::TimedOut => {
                "Synthesis timed out. Please try with shorter text.".to_string()
            }
            SynthesisError::ProcessFailed { .. } => {
                "Synthesis failed. Please try again with shorter text.".to_string()
            }
            SynthesisError::ArtifactMissing => "Audio file generation failed".to_string(),
            SynthesisError::Internal(_) => {
                "An unexpected error occurred. Please try again.".to_string()
            }
        }
    }
}

impl From<std::io::Error> for SynthesisError {
    fn from(source: std::io::Error) -> Self {
        Self::Internal(anyhow::anyhow!(source))
    }
}
