use dhwani_core::settings::Config;
use std::path::PathBuf;
use tempfile::TempDir;

/// A self-contained service fixture: a model tree for hindi/female, a stub
/// worker script standing in for the synthesis program, and a config wired
/// to both. The script records every invocation by touching a marker file
/// so tests can assert that nothing was spawned.
pub struct Fixture {
    pub root: TempDir,
    pub config: Config,
}

impl Fixture {
    /// `behavior` is shell code run after argument parsing; `$OUTPUT` holds
    /// the path the worker was asked to write.
    pub fn with_worker(behavior: &str) -> Self {
        let root = TempDir::new().unwrap();

        let model_root = root.path().join("models");
        let model_dir = model_root.join("hindi").join("female").join("model");
        std::fs::create_dir_all(&model_dir).unwrap();
        std::fs::write(model_dir.join("model.pth"), b"weights").unwrap();
        let dict_dir = model_root.join("phone_dict");
        std::fs::create_dir_all(&dict_dir).unwrap();
        std::fs::write(dict_dir.join("hindi"), b"a 1\n").unwrap();

        let marker = root.path().join("invoked");
        let script = format!(
            r#"#!/bin/sh
: > "{marker}"
OUTPUT=""
while [ "$#" -gt 0 ]; do
  case "$1" in
    --output_file) OUTPUT="$2"; shift 2 ;;
    *) shift ;;
  esac
done
{behavior}
"#,
            marker = marker.display()
        );
        let script_path = root.path().join("worker.sh");
        std::fs::write(&script_path, script).unwrap();

        let mut config = Config::default();
        config.worker.program = "sh".to_string();
        config.worker.script = script_path.to_string_lossy().into_owned();
        config.worker.model_root = model_root;
        config.worker.timeout_secs = 2;
        config.worker.kill_grace_secs = 1;
        config.artifacts.dir = root.path().join("audio");
        config.server.request_timeout_secs = 10;

        Self { root, config }
    }

    pub fn worker_was_invoked(&self) -> bool {
        self.marker().exists()
    }

    fn marker(&self) -> PathBuf {
        self.root.path().join("invoked")
    }
}
