//! Persisted operator configuration.
//!
//! Stored as pretty-printed JSON in `uploader_config.json` under the
//! platform config directory:
//! - Linux:   `~/.config/pushdeck/uploader_config.json`
//! - Windows: `%APPDATA%\pushdeck\uploader_config.json`
//!
//! The upload pipeline never reads this file; commands resolve
//! credentials from it and pass them in explicitly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "uploader_config.json";
const REDACTED: &str = "********";

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How usernames and passwords are chosen for environment presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Every environment carries its own username and password.
    #[default]
    Individual,
    /// All environments share `unifiedUsername` / `unifiedPassword`.
    Unified,
}

/// Named host preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Environment {
    Dev,
    Test,
    Release,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Release => "release",
        })
    }
}

// ---------------------------------------------------------------------------
// File layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentPreset {
    pub name: String,
    pub ip: String,
    pub username: String,
    pub password: String,
}

impl EnvironmentPreset {
    fn named(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// The most recent successful upload target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LastUploadConfig {
    pub server_ip: String,
    pub username: String,
    pub password: String,
    pub remote_path: String,
}

/// Whole configuration file. Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploaderConfig {
    pub auth_mode: AuthMode,
    pub dev: EnvironmentPreset,
    pub test: EnvironmentPreset,
    pub release: EnvironmentPreset,
    pub unified_username: String,
    pub unified_password: String,
    pub last_upload_config: LastUploadConfig,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            auth_mode: AuthMode::Individual,
            dev: EnvironmentPreset::named("Development"),
            test: EnvironmentPreset::named("Test"),
            release: EnvironmentPreset::named("Release"),
            unified_username: String::new(),
            unified_password: String::new(),
            last_upload_config: LastUploadConfig::default(),
        }
    }
}

/// Host and login derived from a preset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetLogin {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl UploaderConfig {
    /// Loads from `path`. A missing file yields defaults; an unparsable
    /// one yields defaults with a warning.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<Self>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse configuration, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Saves to `path`, creating its directory. Owner-only on Unix.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        set_permissions_0600(path);
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn preset(&self, env: Environment) -> &EnvironmentPreset {
        match env {
            Environment::Dev => &self.dev,
            Environment::Test => &self.test,
            Environment::Release => &self.release,
        }
    }

    pub fn preset_mut(&mut self, env: Environment) -> &mut EnvironmentPreset {
        match env {
            Environment::Dev => &mut self.dev,
            Environment::Test => &mut self.test,
            Environment::Release => &mut self.release,
        }
    }

    /// Host from the preset; login from the preset or the unified pair,
    /// depending on [`AuthMode`].
    pub fn preset_login(&self, env: Environment) -> PresetLogin {
        let preset = self.preset(env);
        let (username, password) = match self.auth_mode {
            AuthMode::Individual => (preset.username.clone(), preset.password.clone()),
            AuthMode::Unified => (self.unified_username.clone(), self.unified_password.clone()),
        };
        PresetLogin {
            host: preset.ip.clone(),
            username,
            password,
        }
    }

    /// Records a successful upload target. The password is kept only
    /// when `password` is `Some`.
    pub fn remember_upload(
        &mut self,
        host: &str,
        username: &str,
        password: Option<&str>,
        remote_path: &str,
    ) {
        self.last_upload_config = LastUploadConfig {
            server_ip: host.into(),
            username: username.into(),
            password: password.unwrap_or_default().into(),
            remote_path: remote_path.into(),
        };
    }

    /// Copy with every non-empty password masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for preset in [&mut copy.dev, &mut copy.test, &mut copy.release] {
            mask(&mut preset.password);
        }
        mask(&mut copy.unified_password);
        mask(&mut copy.last_upload_config.password);
        copy
    }
}

fn mask(password: &mut String) {
    if !password.is_empty() {
        *password = REDACTED.into();
    }
}

fn set_permissions_0600(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

/// Default location of the configuration file.
pub fn config_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join("pushdeck").join(CONFIG_FILE_NAME))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA")
            .map_err(|_| anyhow::anyhow!("APPDATA is not set; pass --config"))?;
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home).join(".config"))
    }
}
