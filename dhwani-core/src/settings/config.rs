use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Service configuration. Loaded once at process start from an optional TOML
/// file plus environment overrides, then handed to the constructed objects
/// (store, pool, service). Nothing re-reads configuration mid-run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub pool: PoolConfig,
    pub worker: WorkerConfig,
    pub artifacts: ArtifactConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Caller-level deadline: how long one HTTP request waits for its job.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4005,
            request_timeout_secs: 110,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    /// Concurrency slots: jobs running at once.
    pub slots: usize,
    /// Jobs allowed to wait for a slot beyond the running ones. Submissions
    /// past `slots + max_queue_depth` are rejected as saturated.
    pub max_queue_depth: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            slots: 2,
            max_queue_depth: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkerConfig {
    /// Interpreter/binary that runs the synthesis script.
    pub program: String,
    /// Script invoked inside `model_root`.
    pub script: String,
    /// Root directory holding model weights and phone dictionaries.
    pub model_root: PathBuf,
    /// Process-level deadline for one synthesis run.
    pub timeout_secs: u64,
    /// Grace period between SIGTERM and SIGKILL on timeout.
    pub kill_grace_secs: u64,
    /// Per-stream capture cap; output past this is dropped with a marker.
    pub max_capture_bytes: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            script: "inference.py".to_string(),
            model_root: PathBuf::from("Fastspeech2_HS"),
            timeout_secs: 90,
            kill_grace_secs: 5,
            max_capture_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Directory audio files are written to and served from.
    pub dir: PathBuf,
    /// Files older than this are removed by the sweeper.
    pub ttl_secs: u64,
    /// Admission ceiling on request text length. Policy constant, not a
    /// systems limit.
    pub max_text_chars: usize,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("static/audio"),
            ttl_secs: 3600,
            max_text_chars: 500,
        }
    }
}

impl Config {
    /// Load configuration: defaults, then the TOML file if one is given and
    /// exists, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config from {path:?}"))?;
                toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse config at {path:?}"))?
            }
            _ => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Environment overrides. PORT/HOST match the original deployment
    /// surface; the DHWANI_* names cover the knobs operators actually tune.
    fn apply_env(&mut self) {
        if let Some(port) = env_parse::<u16>("PORT") {
            self.server.port = port;
        }
        if let Ok(host) = std::env::var("HOST") {
            if !host.is_empty() {
                self.server.host = host;
            }
        }
        if let Some(slots) = env_parse::<usize>("DHWANI_POOL_SLOTS") {
            if slots > 0 {
                self.pool.slots = slots;
            }
        }
        if let Ok(root) = std::env::var("DHWANI_MODEL_ROOT") {
            if !root.is_empty() {
                self.worker.model_root = PathBuf::from(root);
            }
        }
        if let Ok(dir) = std::env::var("DHWANI_ARTIFACT_DIR") {
            if !dir.is_empty() {
                self.artifacts.dir = PathBuf::from(dir);
            }
        }
        if let Some(secs) = env_parse::<u64>("DHWANI_WORKER_TIMEOUT_SECS") {
            self.worker.timeout_secs = secs;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    pub fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.worker.timeout_secs)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_secs(self.worker.kill_grace_secs)
    }

    pub fn artifact_ttl(&self) -> Duration {
        Duration::from_secs(self.artifacts.ttl_secs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
