//! Shared helpers for tests that drive the built `reelpost` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn manifest_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Service account key fixture with a throwaway RSA key.
#[allow(dead_code)]
pub fn service_account_json() -> String {
    let path = manifest_dir().join("tests/fixtures/service_account.json");
    std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("read {}: {err}", path.display()))
}

/// An isolated working directory so no developer `.env` leaks into a test.
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn create() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Run the binary with a cleared environment plus `env`.
    pub fn run(&self, args: &[&str], env: &[(&str, &str)]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_reelpost"));
        command
            .args(args)
            .current_dir(self.path())
            .env_clear()
            .env("RUST_LOG", "off");
        for (key, value) in env {
            command.env(key, value);
        }
        command.output().expect("spawn reelpost")
    }
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}
