use crate::error::{MissingResource, SynthesisError};
use std::path::{Path, PathBuf};
use tracing::error;

/// Preflight probe for the model assets a request names. Runs before a pool
/// slot is consumed so a misconfigured language fails fast instead of
/// burning a synthesis slot on a doomed spawn.
///
/// Layout under the model root (fixed by the worker program):
///   <root>/<language>/<gender>/model/model.pth
///   <root>/phone_dict/<language>
#[derive(Debug, Clone)]
pub struct ResourceChecker {
    model_root: PathBuf,
}

impl ResourceChecker {
    pub fn new(model_root: impl Into<PathBuf>) -> Self {
        Self {
            model_root: model_root.into(),
        }
    }

    /// Whether the model root itself is present. Used by the status
    /// endpoint; absence is not an error there.
    pub fn root_present(&self) -> bool {
        self.model_root.is_dir()
    }

    pub fn check(&self, language: &str, gender: &str) -> Result<(), SynthesisError> {
        let model_path = self
            .model_root
            .join(language)
            .join(gender)
            .join("model")
            .join("model.pth");
        if !model_path.exists() {
            error!(path = ?model_path, "Model not found");
            return Err(SynthesisError::ResourceNotFound {
                which: MissingResource::Model,
                language: language.to_string(),
                gender: gender.to_string(),
            });
        }

        let dict_path = self.model_root.join("phone_dict").join(language);
        if !non_empty_file(&dict_path) {
            error!(path = ?dict_path, "Phone dictionary not found or empty");
            return Err(SynthesisError::ResourceNotFound {
                which: MissingResource::PhoneDictionary,
                language: language.to_string(),
                gender: gender.to_string(),
            });
        }

        Ok(())
    }
}

fn non_empty_file(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.len() > 0)
        .unwrap_or(false)
}
