//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.fetchlog/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::response_log::DEFAULT_LOG_CAPACITY;
use crate::core::state::DEFAULT_INPUT_CAPACITY;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FetchlogConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LogConfig {
    pub capacity: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NetworkConfig {
    pub poll_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct InputConfig {
    pub max_len: Option<usize>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 10;

pub fn default_user_agent() -> String {
    format!("fetchlog/{}", env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub log_capacity: usize,
    pub poll_timeout: Duration,
    pub connect_timeout: Option<Duration>,
    pub user_agent: String,
    pub input_capacity: usize,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            log_capacity: DEFAULT_LOG_CAPACITY,
            poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
            connect_timeout: None,
            user_agent: default_user_agent(),
            input_capacity: DEFAULT_INPUT_CAPACITY,
        }
    }
}

/// Overrides from the command line (None = not specified).
#[derive(Debug, Default, Clone, Copy)]
pub struct CliOverrides {
    pub capacity: Option<usize>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.fetchlog/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".fetchlog").join("config.toml"))
}

/// Load config from `~/.fetchlog/config.toml`, or from `explicit` if given.
///
/// A missing default file is generated (commented out) and treated as empty.
/// A missing explicit file is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<FetchlogConfig, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match config_path() {
            Some(p) => p,
            None => {
                warn!("Could not determine home directory, using default config");
                return Ok(FetchlogConfig::default());
            }
        },
    };

    if explicit.is_none() && !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(FetchlogConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: FetchlogConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# fetchlog configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [log]
# capacity = 1024                  # Responses kept per run; FETCHLOG_LOG_CAPACITY

# [network]
# poll_timeout_secs = 10           # Worker wake-up interval; FETCHLOG_POLL_TIMEOUT_SECS
# connect_timeout_secs = 30        # FETCHLOG_CONNECT_TIMEOUT_SECS
# user_agent = "fetchlog/0.1.0"    # FETCHLOG_USER_AGENT

# [input]
# max_len = 127                    # Longest URL that can be typed
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &FetchlogConfig, cli: CliOverrides) -> Result<ResolvedConfig, ConfigError> {
    resolve_with_env(config, cli, |name| std::env::var(name).ok())
}

/// Same as `resolve`, reading environment variables through `env`.
pub fn resolve_with_env(
    config: &FetchlogConfig,
    cli: CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig, ConfigError> {
    // Capacity: CLI → env → config → default
    let log_capacity = match cli.capacity {
        Some(n) => n,
        None => match parse_env::<usize>(&env, "FETCHLOG_LOG_CAPACITY")? {
            Some(n) => n,
            None => config.log.capacity.unwrap_or(DEFAULT_LOG_CAPACITY),
        },
    };
    if log_capacity == 0 {
        return Err(ConfigError::Invalid("log capacity must be at least 1".to_string()));
    }

    // Poll timeout: env → config → default
    let poll_timeout_secs = parse_env::<u64>(&env, "FETCHLOG_POLL_TIMEOUT_SECS")?
        .or(config.network.poll_timeout_secs)
        .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS);
    if poll_timeout_secs == 0 {
        return Err(ConfigError::Invalid("poll timeout must be at least 1 second".to_string()));
    }

    let connect_timeout = parse_env::<u64>(&env, "FETCHLOG_CONNECT_TIMEOUT_SECS")?
        .or(config.network.connect_timeout_secs)
        .map(Duration::from_secs);

    let user_agent = env("FETCHLOG_USER_AGENT")
        .or_else(|| config.network.user_agent.clone())
        .unwrap_or_else(default_user_agent);

    Ok(ResolvedConfig {
        log_capacity,
        poll_timeout: Duration::from_secs(poll_timeout_secs),
        connect_timeout,
        user_agent,
        input_capacity: config.input.max_len.unwrap_or(DEFAULT_INPUT_CAPACITY),
    })
}

fn parse_env<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, ConfigError> {
    match env(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(format!("{name}={raw:?} is not a valid number"))),
    }
}
