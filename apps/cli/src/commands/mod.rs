//! Subcommand implementations.

pub mod config;
pub mod upload;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Args;
use pushdeck_protocol::{ConnectionCredentials, DEFAULT_SSH_PORT};

use crate::config::{Environment, UploaderConfig};

/// Connection target shared by `upload` and `batch`.
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Environment preset supplying host and login.
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Remote host (overrides the preset).
    #[arg(long)]
    pub host: Option<String>,

    /// SSH username (overrides the preset).
    #[arg(short, long)]
    pub user: Option<String>,

    /// SSH password (overrides the preset).
    #[arg(short, long)]
    pub password: Option<String>,

    /// SSH port.
    #[arg(long, default_value_t = DEFAULT_SSH_PORT)]
    pub port: u16,

    /// Remote destination directory. Defaults to the last one used.
    #[arg(short, long)]
    pub remote: Option<String>,

    /// Seconds allowed for connecting.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Store the password with the last upload target.
    #[arg(long)]
    pub remember_password: bool,
}

/// Fully resolved target of one request.
#[derive(Debug, Clone)]
pub struct Target {
    pub credentials: ConnectionCredentials,
    pub remote_path: String,
    pub timeout: Duration,
}

impl TargetArgs {
    /// Merges flags over the selected preset.
    pub fn resolve(&self, config: &UploaderConfig) -> anyhow::Result<Target> {
        let preset = self.env.map(|env| config.preset_login(env)).unwrap_or_default();
        let pick = |flag: &Option<String>, fallback: String| {
            flag.clone().filter(|v| !v.is_empty()).unwrap_or(fallback)
        };

        let host = pick(&self.host, preset.host);
        let username = pick(&self.user, preset.username);
        let password = pick(&self.password, preset.password);
        let remote_path = pick(&self.remote, config.last_upload_config.remote_path.clone());

        if host.is_empty() {
            bail!("no host given; pass --host or an --env preset with an ip");
        }
        if username.is_empty() {
            bail!("no username given; pass --user or configure the preset");
        }
        if remote_path.is_empty() {
            bail!("no remote directory given; pass --remote");
        }

        let mut credentials = ConnectionCredentials::new(host, username, password);
        credentials.port = self.port;
        Ok(Target {
            credentials,
            remote_path,
            timeout: Duration::from_secs(self.timeout),
        })
    }
}

/// Loads the configuration from `path` or the default location.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<(UploaderConfig, PathBuf)> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => crate::config::config_path()?,
    };
    let config = UploaderConfig::load_from(&path)
        .with_context(|| format!("cannot read configuration {}", path.display()))?;
    Ok((config, path))
}

/// `check <path>`: exit status 0 when the path exists.
pub fn check(path: &Path) -> ExitCode {
    if pushdeck_upload::check_local_path_exists(path) {
        println!("{} exists", path.display());
        ExitCode::SUCCESS
    } else {
        println!("{} does not exist", path.display());
        ExitCode::FAILURE
    }
}
