use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use aidbox_http::{AuthConfig, ConnectionConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProfileConfig {
    pub server: Option<String>,
    pub format: Option<String>,
    pub timeout_secs: Option<u64>,
    pub auth: Option<AuthConfig>,
}

impl ProfileConfig {
    /// Applies `config set <key> <value>`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server" => self.server = Some(value.to_string()),
            "format" => self.format = Some(value.to_string()),
            "timeout" => {
                let secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout \"{value}\", expected seconds"))?;
                self.timeout_secs = Some(secs);
            }
            "basic" => {
                let (username, password) = value
                    .split_once(':')
                    .context("Expected basic credentials as username:password")?;
                self.auth = Some(AuthConfig::Basic {
                    username: username.to_string(),
                    password: password.to_string(),
                });
            }
            "token" => {
                self.auth = Some(AuthConfig::Bearer {
                    token: value.to_string(),
                })
            }
            "authorization" => {
                self.auth = Some(AuthConfig::Header {
                    value: value.to_string(),
                })
            }
            other => anyhow::bail!(
                "Unknown config key: {other}. Valid keys: server, format, timeout, basic, token, authorization"
            ),
        }
        Ok(())
    }
}

pub type ConfigFile = BTreeMap<String, ProfileConfig>;

fn config_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".aidbox");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

fn load_from(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid config: {}", path.display()))
}

fn save_to(path: &Path, all: &ConfigFile) -> Result<()> {
    let content = toml::to_string_pretty(all)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    let mut all = load_from(&config_path()?)?;
    Ok(all.remove(profile).unwrap_or_default())
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    let path = config_path()?;
    let mut all = load_from(&path)?;
    all.insert(profile.to_string(), config.clone());
    save_to(&path, &all)
}

/// Connection settings for `profile`, with `cli_server` taking precedence.
pub fn resolve_connection(cli_server: Option<&str>, profile: &str) -> Result<ConnectionConfig> {
    connection_for(cli_server, load_profile(profile)?)
}

fn connection_for(cli_server: Option<&str>, cfg: ProfileConfig) -> Result<ConnectionConfig> {
    // 1. --server flag / AIDBOX_URL env
    // 2. config.toml profile
    let Some(server) = cli_server.map(str::to_string).or(cfg.server) else {
        anyhow::bail!(
            "No server URL configured. Use --server, set AIDBOX_URL env var, or run: aidbox config set server <url>"
        );
    };

    let mut connection = ConnectionConfig::new(server);
    connection.auth = cfg.auth;
    if let Some(secs) = cfg.timeout_secs {
        connection = connection.with_timeout(Duration::from_secs(secs));
    }
    Ok(connection)
}
