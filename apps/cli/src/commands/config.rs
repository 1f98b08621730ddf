//! `config` subcommands.

use std::path::Path;

use clap::Subcommand;

use crate::config::{AuthMode, Environment, UploaderConfig};

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Prints the configuration with passwords masked.
    Show,
    /// Updates an environment preset.
    SetEnv {
        #[arg(value_enum)]
        env: Environment,
        /// Display name.
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        ip: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Chooses per-environment or shared logins.
    SetAuthMode {
        #[arg(value_enum)]
        mode: AuthMode,
    },
    /// Sets the shared login used in unified mode.
    SetUnified {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
}

/// Applies `command` to `config`, saving it when anything changed.
pub fn run(command: ConfigCommand, config: &mut UploaderConfig, path: &Path) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Show => {
            println!("# {}", path.display());
            println!("{}", serde_json::to_string_pretty(&config.redacted())?);
            return Ok(());
        }
        ConfigCommand::SetEnv {
            env,
            name,
            ip,
            username,
            password,
        } => {
            let preset = config.preset_mut(env);
            if let Some(v) = name {
                preset.name = v;
            }
            if let Some(v) = ip {
                preset.ip = v;
            }
            if let Some(v) = username {
                preset.username = v;
            }
            if let Some(v) = password {
                preset.password = v;
            }
            println!("updated {env} preset");
        }
        ConfigCommand::SetAuthMode { mode } => {
            config.auth_mode = mode;
            println!("auth mode set to {mode:?}");
        }
        ConfigCommand::SetUnified { username, password } => {
            config.unified_username = username;
            config.unified_password = password;
            println!("unified login updated");
        }
    }
    config.save_to(path)
}
