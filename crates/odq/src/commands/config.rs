//! Config command implementation.
//!
//! View and manage configuration settings.
//! Config file is located at ~/.config/odq/config.toml.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::BaseDirs;
use odata_client::settings::StaticSettings;
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Request timeout used when the config sets none.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Prefix for keys that address an alternate backend in `config set`.
const ALTERNATE_PREFIX: &str = "alternate.";

/// Configuration file structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    /// Defaults to current version when not present in file.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Default service root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_address: Option<String>,

    /// Alternate service roots keyed by backend name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub alternate_base_addresses: BTreeMap<String, String>,

    /// Rows per page when a query gives no `--top`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,

    /// Request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            base_address: None,
            alternate_base_addresses: BTreeMap::new(),
            page_size: None,
            timeout_secs: None,
        }
    }
}

impl Config {
    /// Settings for the query engine.
    pub fn settings(&self) -> StaticSettings {
        let mut settings = StaticSettings::new(self.base_address.clone().unwrap_or_default());
        for (key, address) in &self.alternate_base_addresses {
            settings = settings.with_alternate(key.clone(), address.clone());
        }
        settings.page_size = self.page_size;
        settings
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

/// Gets the config file path.
///
/// Resolution order: `$ODQ_CONFIG`, `$XDG_CONFIG_HOME/odq/config.toml`,
/// `~/.config/odq/config.toml`.
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var("ODQ_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("odq").join("config.toml"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("odq").join("config.toml"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Loads the configuration from disk. A missing file yields defaults.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    Ok(migrate_config(config))
}

/// Brings an older config up to the current version.
fn migrate_config(mut config: Config) -> Config {
    // Version 1 is the initial schema.
    config.version = CONFIG_VERSION;
    config
}

/// Saves the configuration to disk.
fn save_config(config: &Config) -> Result<PathBuf> {
    let path = get_config_path()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CommandError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| CommandError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(&path, content)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    Ok(path)
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config()?;
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        if path.exists() {
            println!("Settings:");
            if let Some(ref address) = config.base_address {
                println!("  base_address: {}", address);
            }
            if let Some(size) = config.page_size {
                println!("  page_size: {}", size);
            }
            println!("  timeout_secs: {}", config.timeout().as_secs());

            if !config.alternate_base_addresses.is_empty() {
                println!("\n[alternate_base_addresses]");
                for (key, address) in &config.alternate_base_addresses {
                    println!("  {}: {}", key, address);
                }
            }
        } else {
            println!("(No config file exists. Run 'odq config set base_address <url>' to create one.)");
        }
    }

    Ok(())
}

/// Options for the config set command.
pub struct ConfigSetOptions {
    /// Configuration key.
    pub key: String,
    /// Configuration value.
    pub value: String,
}

/// Applies one `key = value` assignment to `config`.
fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "base_address" => {
            config.base_address = Some(parse_address(value)?);
        }
        "page_size" => {
            config.page_size = Some(parse_positive(key, value)?);
        }
        "timeout_secs" => {
            config.timeout_secs = Some(u64::from(parse_positive(key, value)?));
        }
        _ => {
            let Some(name) = key.strip_prefix(ALTERNATE_PREFIX).filter(|n| !n.is_empty()) else {
                return Err(CommandError::Config(format!(
                    "Unknown config key '{}'. Valid keys: base_address, page_size, timeout_secs, alternate.<name>",
                    key
                )));
            };
            config
                .alternate_base_addresses
                .insert(name.to_string(), parse_address(value)?);
        }
    }
    Ok(())
}

/// Executes the config set command.
pub fn execute_set(ctx: &CommandContext, opts: &ConfigSetOptions) -> Result<()> {
    let mut config = load_config()?;
    apply_setting(&mut config, &opts.key, &opts.value)?;
    let path = save_config(&config)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "key": opts.key,
            "value": opts.value,
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Set {} = {}", opts.key, opts.value);
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Accepts absolute http(s) addresses only.
fn parse_address(value: &str) -> Result<String> {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(CommandError::Config(format!(
            "Invalid address '{}'. Use an http:// or https:// URL",
            value
        )))
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::Config(format!(
            "Invalid {} value '{}'. Use a positive integer",
            key, value
        ))),
    }
}
