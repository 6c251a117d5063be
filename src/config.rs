//! Configuration module for the vocount server.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values. Configuration is
//! resolved once at startup and immutable afterwards.

use crate::analysis::AnalysisMode;
use crate::pool::{PoolPolicy, DEFAULT_WORKERS};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

/// Command-line arguments for the analysis server
#[derive(Parser, Debug)]
#[command(name = "vocount")]
#[command(author = "vocount authors")]
#[command(version = "0.1.0")]
#[command(about = "A concurrent TCP text-analysis server", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 0.0.0.0:5050)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Number of pool workers (bounded policy)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Spawn a task per connection instead of using the bounded pool
    #[arg(long)]
    pub unbounded: bool,

    /// Analysis mode
    #[arg(short = 'm', long, value_enum)]
    pub mode: Option<AnalysisMode>,

    /// Journal file path (last-vowel mode)
    #[arg(short = 'j', long)]
    pub journal: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub analysis: AnalysisSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Address to bind to
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Number of pool workers
    pub workers: Option<usize>,
    /// Task-per-connection policy instead of the bounded pool
    #[serde(default)]
    pub unbounded: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            workers: None,
            unbounded: false,
        }
    }
}

/// Analysis-related configuration
#[derive(Debug, Deserialize)]
pub struct AnalysisSection {
    /// Which character to count
    #[serde(default = "default_mode")]
    pub mode: AnalysisMode,
    /// Journal file path, used in last-vowel mode
    pub journal: Option<PathBuf>,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            journal: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:5050".to_string()
}

fn default_mode() -> AnalysisMode {
    AnalysisMode::LastChar
}

fn default_journal() -> PathBuf {
    PathBuf::from("resultados.txt")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: String,
    pub pool: PoolPolicy,
    pub mode: AnalysisMode,
    /// `Some` only in last-vowel mode; last-char mode never opens a journal.
    pub journal: Option<PathBuf>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse();

        // Load TOML config if specified
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        Ok(Self::resolve(cli, toml_config))
    }

    /// Merge CLI args with TOML config (CLI takes precedence).
    fn resolve(cli: CliArgs, toml_config: TomlConfig) -> Config {
        let mode = cli.mode.unwrap_or(toml_config.analysis.mode);

        let pool = if cli.unbounded || toml_config.server.unbounded {
            PoolPolicy::Unbounded
        } else {
            PoolPolicy::Bounded(
                cli.workers
                    .or(toml_config.server.workers)
                    .unwrap_or(DEFAULT_WORKERS),
            )
        };

        let journal = match mode {
            AnalysisMode::LastChar => None,
            AnalysisMode::LastVowel => Some(
                cli.journal
                    .or(toml_config.analysis.journal)
                    .unwrap_or_else(default_journal),
            ),
        };

        Config {
            listen: cli.listen.unwrap_or(toml_config.server.listen),
            pool,
            mode,
            journal,
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
        }
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TomlConfig::default();
        assert_eq!(config.server.listen, "0.0.0.0:5050");
        assert!(!config.server.unbounded);
        assert_eq!(config.analysis.mode, AnalysisMode::LastChar);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [server]
            listen = "0.0.0.0:6000"
            workers = 8

            [analysis]
            mode = "last-vowel"
            journal = "registro.txt"

            [logging]
            level = "debug"
        "#;

        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:6000");
        assert_eq!(config.server.workers, Some(8));
        assert_eq!(config.analysis.mode, AnalysisMode::LastVowel);
        assert_eq!(config.analysis.journal, Some(PathBuf::from("registro.txt")));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_cli_overrides_toml() {
        let cli =
            CliArgs::parse_from(["vocount", "--listen", "127.0.0.1:7000", "--workers", "4"]);
        let toml_config: TomlConfig = toml::from_str(
            r#"
            [server]
            listen = "0.0.0.0:6000"
            workers = 8
        "#,
        )
        .unwrap();

        let config = Config::resolve(cli, toml_config);
        assert_eq!(config.listen, "127.0.0.1:7000");
        assert_eq!(config.pool, PoolPolicy::Bounded(4));
    }

    #[test]
    fn test_bounded_pool_default_capacity() {
        let cli = CliArgs::parse_from(["vocount"]);
        let config = Config::resolve(cli, TomlConfig::default());
        assert_eq!(config.pool, PoolPolicy::Bounded(DEFAULT_WORKERS));
    }

    #[test]
    fn test_unbounded_flag() {
        let cli = CliArgs::parse_from(["vocount", "--unbounded"]);
        let config = Config::resolve(cli, TomlConfig::default());
        assert_eq!(config.pool, PoolPolicy::Unbounded);
    }

    #[test]
    fn test_journal_only_in_vowel_mode() {
        let cli = CliArgs::parse_from(["vocount", "--mode", "last-char", "--journal", "x.txt"]);
        let config = Config::resolve(cli, TomlConfig::default());
        assert_eq!(config.journal, None);

        let cli = CliArgs::parse_from(["vocount", "--mode", "last-vowel"]);
        let config = Config::resolve(cli, TomlConfig::default());
        assert_eq!(config.journal, Some(PathBuf::from("resultados.txt")));
    }
}
