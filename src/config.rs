//! Configuration management for agent-gateway.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::ServerConfig;
use crate::cli::Args;
use crate::execution::{default_fixed_env, CommandExecutor};
use crate::tunnel::{ReadinessMatcher, TunnelMonitor, DEFAULT_SUCCESS_MARKERS};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerSection,
    /// Security configuration.
    pub security: SecuritySection,
    /// Logging configuration.
    pub logging: LoggingSection,
    /// Tunnel startup settings.
    pub tunnel: TunnelSection,
    /// Settings for every external command.
    pub executor: ExecutorSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable graceful shutdown.
    pub graceful_shutdown: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6280,
            graceful_shutdown: true,
        }
    }
}

/// Security configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    /// Authentication settings.
    pub auth: AuthSection,
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Enable authentication.
    pub enabled: bool,
    /// API keys.
    pub api_keys: Vec<String>,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or filter directives.
    pub level: String,
    /// Append-only log file; `null` disables it.
    pub file: Option<PathBuf>,
}

/// Log file used unless configured otherwise.
pub const DEFAULT_LOG_FILE: &str = "logs/agent-gateway.log";

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

/// Tunnel configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelSection {
    /// Program invoked as `<program> share <name> ...`.
    pub program: String,
    /// Startup window in seconds.
    pub deadline_secs: u64,
    /// Substrings that mark a ready tunnel.
    pub success_markers: Vec<String>,
}

impl Default for TunnelSection {
    fn default() -> Self {
        Self {
            program: "mcpm".to_string(),
            deadline_secs: 30,
            success_markers: DEFAULT_SUCCESS_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Executor configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSection {
    /// Environment overrides applied to every child process.
    pub env: BTreeMap<String, String>,
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            env: default_fixed_env(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("AGENT_GATEWAY_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("AGENT_GATEWAY_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Ok(key) = std::env::var("AGENT_GATEWAY_API_KEY") {
            self.add_api_key(key);
        }

        if let Ok(level) = std::env::var("AGENT_GATEWAY_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }

        if let Ok(file) = std::env::var("AGENT_GATEWAY_LOG_FILE") {
            // Empty disables the file sink.
            self.logging.file = (!file.is_empty()).then(|| PathBuf::from(file));
        }

        if let Ok(program) = std::env::var("AGENT_GATEWAY_TUNNEL_PROGRAM") {
            if !program.is_empty() {
                self.tunnel.program = program;
            }
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }

        if let Some(ref key) = args.api_key {
            self.add_api_key(key.clone());
        }

        if args.no_auth {
            self.security.auth.enabled = false;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }

        if let Some(ref file) = args.log_file {
            self.logging.file = Some(file.clone());
        }
        if args.no_log_file {
            self.logging.file = None;
        }
    }

    fn add_api_key(&mut self, key: String) {
        if key.is_empty() {
            return;
        }
        self.security.auth.enabled = true;
        if !self.security.auth.api_keys.contains(&key) {
            self.security.auth.api_keys.push(key);
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Convert to ServerConfig for the API server.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        let mut server_config = ServerConfig::new(host.to_string(), self.server.port);
        if !self.server.graceful_shutdown {
            server_config = server_config.without_graceful_shutdown();
        }
        Ok(server_config)
    }

    /// Monitor built from the tunnel section.
    pub fn tunnel_monitor(&self) -> TunnelMonitor {
        TunnelMonitor::new(
            Duration::from_secs(self.tunnel.deadline_secs),
            ReadinessMatcher::new(self.tunnel.success_markers.iter().cloned()),
        )
    }

    /// Executor built from the executor section.
    pub fn command_executor(&self) -> CommandExecutor {
        CommandExecutor::new(self.executor.env.clone())
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing error.
    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
    /// Invalid host address.
    #[error("invalid host address: {0}")]
    InvalidHost(String),
}
