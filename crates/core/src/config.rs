use std::{
    fs::{self, File},
    io::Write,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    assets::{get_config_path, get_default_config, get_recordings_dir},
    credential::DEFAULT_AUTHORITY,
    error::{ResourceError, Result},
    pipeline::{DEFAULT_API_VERSION, DEFAULT_ENDPOINT},
};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialConfig {
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    Token {
        token: String,
    },
}

/// Resolved client configuration; `env:` references are already substituted.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClientConfig {
    pub subscription_id: String,
    pub endpoint: String,
    pub authority: String,
    pub api_version: String,
    pub poll_interval_secs: u64,
    pub region: String,
    pub credential: CredentialConfig,
    pub recordings_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            subscription_id: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            authority: DEFAULT_AUTHORITY.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            poll_interval_secs: 30,
            region: default_region(),
            credential: CredentialConfig::Token {
                token: String::new(),
            },
            recordings_dir: PathBuf::from("recordings"),
        }
    }
}

fn default_region() -> String {
    "westus".to_string()
}

#[derive(Deserialize, Debug)]
struct RawConfig {
    subscription_id: String,
    endpoint: Option<String>,
    authority: Option<String>,
    api_version: Option<String>,
    poll_interval_secs: Option<u64>,
    region: Option<String>,
    credential: CredentialConfig,
    recordings_dir: Option<String>,
}

/// Values of the form `env:NAME` are read from the environment.
fn resolve_value(value: &str) -> Result<String> {
    match value.strip_prefix("env:") {
        Some(name) => {
            let name = name.trim();
            std::env::var(name).map_err(|_| {
                ResourceError::Config(format!("Environment variable {name} not found"))
            })
        }
        None => Ok(value.to_string()),
    }
}

impl RawConfig {
    fn to_config(&self) -> Result<ClientConfig> {
        let credential = match &self.credential {
            CredentialConfig::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
            } => CredentialConfig::ClientSecret {
                tenant_id: resolve_value(tenant_id)?,
                client_id: resolve_value(client_id)?,
                client_secret: resolve_value(client_secret)?,
            },
            CredentialConfig::Token { token } => CredentialConfig::Token {
                token: resolve_value(token)?,
            },
        };

        let recordings_dir = match &self.recordings_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).as_ref()),
            None => get_recordings_dir(),
        };

        let defaults = ClientConfig::default();
        Ok(ClientConfig {
            subscription_id: resolve_value(&self.subscription_id)?,
            endpoint: self.endpoint.clone().unwrap_or(defaults.endpoint),
            authority: self.authority.clone().unwrap_or(defaults.authority),
            api_version: self.api_version.clone().unwrap_or(defaults.api_version),
            poll_interval_secs: self
                .poll_interval_secs
                .unwrap_or(defaults.poll_interval_secs),
            region: self.region.clone().unwrap_or_else(default_region),
            credential,
            recordings_dir,
        })
    }
}

#[instrument(skip(config_path))]
pub fn create_or_get_config_file(config_path: Option<PathBuf>) -> Result<(bool, PathBuf)> {
    let actual_path = config_path.unwrap_or_else(get_config_path);

    let parent_dir = actual_path.parent().ok_or_else(|| {
        ResourceError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Config path has no parent directory",
        ))
    })?;

    if !parent_dir.exists() {
        fs::create_dir_all(parent_dir)?;
    }

    if actual_path.exists() {
        Ok((true, actual_path))
    } else {
        File::create(&actual_path)?.write_all(get_default_config().as_bytes())?;
        Ok((false, actual_path))
    }
}

#[instrument(skip(config_path))]
pub fn get_config(config_path: Option<PathBuf>) -> Result<ClientConfig> {
    let (_, config_file) = create_or_get_config_file(config_path)?;
    let content = fs::read_to_string(&config_file)?;
    let raw: RawConfig = serde_yaml::from_str(&content)?;
    raw.to_config()
}
