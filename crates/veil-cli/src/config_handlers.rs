//! Handlers for `veil config`.
//!
//! The `cmd_config_*` functions are generic over [`ConfigManager`]; the
//! dotted-key helpers work on any TOML tree.

use std::path::PathBuf;

use veil_core::{Error, Result};

use crate::cli::ConfigAction;
use crate::config::{ConfigManager, VeilConfig};

/// Dispatch a config subcommand against [`VeilConfig`].
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path::<VeilConfig>(config_path),
        ConfigAction::Get { key } => cmd_config_get::<VeilConfig>(config_path, &key),
        ConfigAction::Set { key, value } => cmd_config_set::<VeilConfig>(config_path, &key, &value),
        ConfigAction::Init { file, force } => {
            cmd_config_init::<VeilConfig>(file.as_deref().or(config_path), force)
        }
        ConfigAction::Export { docker_env } => {
            let config = VeilConfig::load(config_path)?;
            cmd_config_export(&config, docker_env)
        }
    }
}

/// Print the resolved config file path.
pub fn cmd_config_path<C: ConfigManager>(config_path: Option<&str>) -> Result<()> {
    let path = C::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory for this platform"))?;
    println!("{}", path.display());
    if !path.exists() {
        eprintln!(
            "(file does not exist; run `{} config init` to create it)",
            C::project_name()
        );
    }
    Ok(())
}

/// Print one value by dotted key.
pub fn cmd_config_get<C: ConfigManager>(config_path: Option<&str>, key: &str) -> Result<()> {
    println!("{}", config_value::<C>(config_path, key)?);
    Ok(())
}

/// Look up a dotted key in the loaded config, formatted for display.
pub fn config_value<C: ConfigManager>(config_path: Option<&str>, key: &str) -> Result<String> {
    let config = C::load(config_path)?;
    let value = toml::Value::try_from(&config).map_err(|e| Error::config(e.to_string()))?;
    get_nested_value(&value, key)
        .map(format_toml_value)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))
}

/// Set a dotted key in the config file. The file must exist.
pub fn cmd_config_set<C: ConfigManager>(
    config_path: Option<&str>,
    key: &str,
    value: &str,
) -> Result<()> {
    let path = C::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory"))?;
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `{} config init` first.",
            path.display(),
            C::project_name()
        )));
    }

    let content = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
    let mut doc: toml::Value = toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
    set_nested_value(&mut doc, key, parse_value(value))?;

    // Reject edits that would make the file unloadable.
    let text = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    toml::from_str::<C>(&text)
        .map_err(|e| Error::config(format!("Invalid value for '{key}': {e}")))?;

    std::fs::write(&path, text).map_err(|e| Error::io_with_path(e, &path))?;
    println!("Set {key} = {value} in {}", path.display());
    Ok(())
}

/// Write a default config file.
pub fn cmd_config_init<C: ConfigManager>(file: Option<&str>, force: bool) -> Result<()> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => C::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }

    let text = C::default().to_toml_string()?;
    std::fs::write(&path, text).map_err(|e| Error::io_with_path(e, &path))?;
    println!("Config file created at {}", path.display());
    Ok(())
}

/// Print the config as environment variables.
pub fn cmd_config_export<C: ConfigManager>(config: &C, docker_env: bool) -> Result<()> {
    for (key, value) in config.to_env_vars()? {
        if docker_env {
            println!("--env {key}={value}");
        } else {
            println!("{key}={value}");
        }
    }
    Ok(())
}

/// Walk a dotted key path.
pub fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Set a value at a dotted key path, creating tables along the way.
pub fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let mut parts = key.split('.').peekable();
    let mut current = root;

    while let Some(part) = parts.next() {
        if part.is_empty() {
            return Err(Error::config(format!("Invalid key '{key}'")));
        }
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config(format!("Cannot set '{key}': '{part}' is inside a non-table value")))?;
        if parts.peek().is_none() {
            table.insert(part.to_string(), value);
            return Ok(());
        }
        current = table
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    Err(Error::config("Empty key path"))
}

/// Parse a CLI string into a TOML value: bool, then integer, then float,
/// then string.
pub fn parse_value(s: &str) -> toml::Value {
    match s {
        "true" => return toml::Value::Boolean(true),
        "false" => return toml::Value::Boolean(false),
        _ => {}
    }
    if let Ok(i) = s.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(s.to_string())
}

/// Format a TOML value for stdout.
pub fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}
