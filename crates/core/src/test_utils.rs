use std::fs;
use std::path::PathBuf;

use tempfile::{Builder, TempDir};

/// A config file in its own temporary directory, removed on drop.
pub struct TempConfig {
    _dir: TempDir,
    pub path: PathBuf,
}

pub fn create_temp_config(content: &str) -> TempConfig {
    let dir = Builder::new()
        .prefix("resman-test")
        .rand_bytes(8)
        .tempdir()
        .unwrap();
    let path = dir.path().join("resman.yml");
    fs::write(&path, content).unwrap();
    TempConfig { _dir: dir, path }
}
