//! Configuration file for the `veil` binary.
//!
//! Resolution order: `--config`, then `$VEIL_CONFIG`, then
//! `<config dir>/veil/config.toml`. A missing file yields the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use veil_acl::AclConfig;
use veil_auth::AuthConfig;
use veil_core::{Error, Result};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "VEIL_CONFIG";

/// A TOML-backed configuration that the `config` subcommands operate on.
pub trait ConfigManager: Serialize + DeserializeOwned + Default {
    /// Name used for the config directory and env var prefix.
    fn project_name() -> &'static str;

    /// `<config dir>/<project>/config.toml`, if the platform has one.
    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::project_name()).join("config.toml"))
    }

    /// Resolve the config file path from an explicit path, the environment,
    /// or the platform default.
    fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        let var = format!("{}_CONFIG", Self::project_name().to_ascii_uppercase());
        if let Ok(path) = std::env::var(var) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        Self::default_config_path()
    }

    /// Load the resolved file, or the defaults if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but can't be read or parsed.
    fn load(explicit: Option<&str>) -> Result<Self> {
        match Self::resolve_config_path(explicit) {
            Some(path) if path.exists() => Self::load_file(&path),
            Some(path) => {
                log::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse a config file.
    ///
    /// # Errors
    ///
    /// Fails if the file can't be read or is not valid TOML for this type.
    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Serialize as pretty TOML.
    ///
    /// # Errors
    ///
    /// Fails if the value can't be represented in TOML.
    fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten into `PROJECT_SECTION_KEY=value` pairs.
    ///
    /// # Errors
    ///
    /// Fails if the value can't be represented in TOML.
    fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value = toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_env(
            &Self::project_name().to_ascii_uppercase(),
            &value,
            &mut vars,
        );
        Ok(vars)
    }
}

fn flatten_env(prefix: &str, value: &toml::Value, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, child) in table {
                let name = format!("{prefix}_{}", key.to_ascii_uppercase());
                flatten_env(&name, child, out);
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        toml::Value::Array(items) => {
            let joined = items
                .iter()
                .map(|item| match item {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(",");
            out.push((prefix.to_string(), joined));
        }
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VeilConfig {
    /// Host fixture the commands operate on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture: Option<PathBuf>,
    /// Confidentiality layer tunables
    pub acl: AclConfig,
    /// HTTP server
    pub server: ServerConfig,
    /// Bearer-token auth
    pub auth: AuthConfig,
    /// Logging
    pub log: LogConfig,
}

impl ConfigManager for VeilConfig {
    fn project_name() -> &'static str {
        "veil"
    }

    /// Bearer tokens are secrets and are left out.
    fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let public = VeilConfig {
            auth: AuthConfig {
                tokens: Default::default(),
                ..self.auth.clone()
            },
            ..self.clone()
        };
        let value = toml::Value::try_from(&public).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_env("VEIL", &value, &mut vars);
        Ok(vars)
    }
}

impl VeilConfig {
    /// The fixture path, preferring `overridden`.
    ///
    /// # Errors
    ///
    /// Fails if neither is set.
    pub fn fixture_path(&self, overridden: Option<&Path>) -> Result<PathBuf> {
        overridden
            .map(Path::to_path_buf)
            .or_else(|| self.fixture.clone())
            .ok_or_else(|| {
                Error::config("No host fixture configured; set `fixture` or pass --fixture")
            })
    }
}
