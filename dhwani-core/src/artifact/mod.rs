use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// A freshly allocated output slot in the artifact directory. The file does
/// not exist yet; the worker creates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Bare file name, the stable piece clients address.
    pub file_name: String,
    /// Absolute path handed to the worker.
    pub path: PathBuf,
}

/// Owns the artifact directory: collision-free path allocation, time-based
/// sweeping, and cleanup of partial output after failed runs.
///
/// Concurrent jobs share this directory. Safety rests on unique naming
/// rather than locking: the name combines a second-resolution timestamp with
/// a per-process sequence counter, so two jobs for the same language/gender
/// in the same second still get distinct paths.
#[derive(Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
    sequence: AtomicU64,
}

impl ArtifactStore {
    /// Open (creating if needed) the artifact directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create artifact directory {dir:?}"))?;
        let dir = dir
            .canonicalize()
            .with_context(|| format!("Failed to canonicalize artifact directory {dir:?}"))?;
        Ok(Self {
            dir,
            sequence: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Allocate a path no other job holds. Never touches the filesystem.
    pub fn allocate(&self, language: &str, gender: &str) -> Artifact {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let file_name = format!("output_{language}_{gender}_{timestamp}_{seq}.wav");
        let path = self.dir.join(&file_name);
        Artifact { file_name, path }
    }

    /// Delete every regular file older than `max_age`. Individual races
    /// (file already gone, permission hiccup) are logged and skipped; the
    /// sweep itself only fails if the directory cannot be read. Returns the
    /// number of files removed.
    pub fn sweep(&self, max_age: Duration) -> Result<usize> {
        let now = SystemTime::now();
        let mut deleted = 0;

        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read artifact directory {:?}", self.dir))?;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = ?e, "Skipping unreadable directory entry during sweep");
                    continue;
                }
            };
            let path = entry.path();
            let Ok(meta) = entry.metadata() else { continue };
            if !meta.is_file() {
                continue;
            }
            let age = meta
                .modified()
                .ok()
                .and_then(|mtime| now.duration_since(mtime).ok());
            let Some(age) = age else { continue };
            if age > max_age {
                match std::fs::remove_file(&path) {
                    Ok(()) => {
                        debug!(?path, ?age, "Swept expired artifact");
                        deleted += 1;
                    }
                    // Concurrent deletion is fine; anything else is noted
                    // and skipped.
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => warn!(?path, error = ?e, "Failed to sweep artifact"),
                }
            }
        }
        Ok(deleted)
    }

    /// Remove one path if present. Idempotent; used to drop partial output
    /// after a failed or timed-out run.
    pub fn discard(&self, path: &Path) {
        match std::fs::remove_file(path) {
            Ok(()) => debug!(?path, "Discarded partial artifact"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(?path, error = ?e, "Failed to discard artifact"),
        }
    }
}
