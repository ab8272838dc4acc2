use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary `SDB_LOCK_HOME` for driving the binary. Removed on drop.
pub struct TestHomeGuard {
    dir: TempDir,
}

impl TestHomeGuard {
    pub fn new() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("sdb-lock-home-")
            .tempdir()
            .expect("Failed to create test home directory");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn domains_dir(&self) -> PathBuf {
        self.dir.path().join("domains")
    }

    pub fn write_config(&self, contents: &str) -> &Self {
        std::fs::write(self.dir.path().join("config.toml"), contents)
            .expect("Failed to write config.toml");
        self
    }
}
