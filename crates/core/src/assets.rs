//! Where resman keeps its files.
//!
//! `resman.yml` lives in the config dir. Anything resman writes (the CLI log and
//! recorded sessions) goes under the data dir. `XDG_CONFIG_HOME` and `XDG_DATA_HOME`
//! win when set to a non-empty value, otherwise the platform default from `dirs`
//! applies.
use std::ffi::OsString;
use std::path::PathBuf;

const APP_NAME: &str = "resman";
const CONFIG_FILE: &str = "resman.yml";
const LOG_FILE: &str = "resman.log";
const RECORDINGS_DIR: &str = "recordings";

fn app_dir(xdg_home: Option<OsString>, platform_dir: Option<PathBuf>, fallback: &str) -> PathBuf {
    match xdg_home {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(APP_NAME),
        _ => platform_dir
            .map(|dir| dir.join(APP_NAME))
            .unwrap_or_else(|| PathBuf::from(shellexpand::tilde(fallback).as_ref())),
    }
}

fn data_home() -> PathBuf {
    app_dir(
        std::env::var_os("XDG_DATA_HOME"),
        dirs::data_local_dir(),
        "~/.local/share/resman",
    )
}

pub fn get_config_dir() -> PathBuf {
    app_dir(
        std::env::var_os("XDG_CONFIG_HOME"),
        dirs::config_dir(),
        "~/.config/resman",
    )
}

/// Default location of the config file.
pub fn get_config_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILE)
}

/// The data dir, created if missing.
pub fn get_data_dir() -> std::io::Result<PathBuf> {
    let path = data_home();
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

/// Log file written by the CLI when logging is enabled.
pub fn get_log_path() -> std::io::Result<PathBuf> {
    Ok(get_data_dir()?.join(LOG_FILE))
}

/// Where cassettes go unless the config names another directory. Created on first
/// save, not here.
pub fn get_recordings_dir() -> PathBuf {
    data_home().join(RECORDINGS_DIR)
}

pub fn get_default_config() -> &'static str {
    include_str!("../data/config.yml")
}
