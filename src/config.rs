use crate::arguments::{ArgumentSource, ArgumentTable};
use crate::cli::{Cli, Command, OutputFormat};
use crate::convert::{self, EnumDescription};
use crate::error::ToolkitError;
use crate::json::{JsonFormatting, JsonSettings};
use crate::validator::ValidationMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_NAME: &str = "validate-toolkit";

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Arguments(#[from] ToolkitError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub validation: ValidationSettings,
    pub output: OutputConfig,
}

/// Defaults for the `validate` command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ValidationSettings {
    /// How documents and schemas are read
    pub mode: ValidationMode,
    /// Target namespace every schema must declare
    pub namespace: Option<String>,
    /// Number of concurrent validation threads
    pub threads: Option<usize>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormatConfig,
    /// Verbose output
    pub verbose: bool,
    /// Quiet mode (errors only)
    pub quiet: bool,
    /// Layout and escaping of JSON output
    pub json: JsonSettings,
}

/// Output format configuration (serializable version of CLI OutputFormat)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormatConfig {
    #[default]
    Human,
    Json,
    Summary,
}

impl EnumDescription for OutputFormatConfig {
    const TABLE: &'static [(Self, &'static str, &'static str)] = &[
        (OutputFormatConfig::Human, "human", "one line per document"),
        (OutputFormatConfig::Json, "json", "validation report as JSON"),
        (OutputFormatConfig::Summary, "summary", "totals only"),
    ];
}

impl From<OutputFormat> for OutputFormatConfig {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputFormatConfig::Human,
            OutputFormat::Json => OutputFormatConfig::Json,
            OutputFormat::Summary => OutputFormatConfig::Summary,
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: file -> environment -> `--set` -> CLI flags
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        let mut config = match &cli.config {
            Some(config_path) => Self::load_from_file(config_path).await?,
            None => Self::find_config_file().await?.unwrap_or_default(),
        };

        config = Self::apply_environment_overrides(config)?;

        if !cli.overrides.is_empty() {
            let table = ArgumentTable::parse(&cli.overrides)?;
            config = Self::apply_argument_overrides(config, &table)?;
        }

        config = Self::merge_with_cli(config, cli)?;

        Self::validate_config(&config)?;

        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find a configuration file in the current directory, then the user config directory
    pub async fn find_config_file() -> Result<Option<Config>> {
        let mut search_dirs = vec![PathBuf::from(".")];
        if let Some(config_dir) = dirs::config_dir() {
            search_dirs.push(config_dir.join(APP_NAME));
        }

        for dir in &search_dirs {
            if let Some(config) = Self::find_config_in(dir).await? {
                return Ok(Some(config));
            }
        }

        Ok(None)
    }

    /// Load the first known configuration file name present in `dir`
    pub async fn find_config_in(dir: &Path) -> Result<Option<Config>> {
        let config_names = [
            format!("{APP_NAME}.toml"),
            format!("{APP_NAME}.json"),
            format!(".{APP_NAME}.toml"),
            format!(".{APP_NAME}.json"),
        ];

        for name in &config_names {
            let path = dir.join(name);
            if tokio::fs::try_exists(&path).await? {
                tracing::debug!(path = %path.display(), "using configuration file");
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        let invalid = |name: &str, value: &str| {
            ConfigError::Environment(format!("Invalid VALIDATE_TOOLKIT_{name} value: {value}"))
        };

        // Validation settings
        if let Some(mode) = env.get("VALIDATE_TOOLKIT_MODE") {
            config.validation.mode = mode.parse().map_err(|_| invalid("MODE", &mode))?;
        }

        if let Some(namespace) = env.get("VALIDATE_TOOLKIT_NAMESPACE") {
            config.validation.namespace = Some(namespace).filter(|ns| convert::has_value(ns));
        }

        if let Some(threads) = env.get("VALIDATE_TOOLKIT_THREADS") {
            config.validation.threads =
                Some(convert::parse_or_none(&threads).ok_or_else(|| invalid("THREADS", &threads))?);
        }

        // Output settings
        if let Some(format) = env.get("VALIDATE_TOOLKIT_FORMAT") {
            config.output.format =
                convert::parse_insensitive(&format).ok_or_else(|| invalid("FORMAT", &format))?;
        }

        if let Some(verbose) = env.get("VALIDATE_TOOLKIT_VERBOSE") {
            config.output.verbose =
                convert::parse_bool_lenient(&verbose).ok_or_else(|| invalid("VERBOSE", &verbose))?;
        }

        if let Some(quiet) = env.get("VALIDATE_TOOLKIT_QUIET") {
            config.output.quiet =
                convert::parse_bool_lenient(&quiet).ok_or_else(|| invalid("QUIET", &quiet))?;
        }

        if let Some(pretty) = env.get("VALIDATE_TOOLKIT_PRETTY") {
            let pretty =
                convert::parse_bool_lenient(&pretty).ok_or_else(|| invalid("PRETTY", &pretty))?;
            config.output.json.formatting = formatting_for(pretty);
        }

        if let Some(escape) = env.get("VALIDATE_TOOLKIT_ESCAPE_HTML") {
            config.output.json.escape_html =
                convert::parse_bool_lenient(&escape).ok_or_else(|| invalid("ESCAPE_HTML", &escape))?;
        }

        Ok(config)
    }

    /// Apply `key=value` overrides collected by an [`ArgumentSource`]
    ///
    /// Recognized keys are `mode`, `namespace`, `threads`, `format`, `pretty`
    /// and `escape-html`; any other key is rejected.
    pub fn apply_argument_overrides(
        mut config: Config,
        source: &impl ArgumentSource,
    ) -> Result<Config> {
        for (key, value) in source.all_arguments() {
            let invalid = || ConfigError::Validation(format!("Invalid value for '{key}': {value}"));

            match key.as_str() {
                "mode" => config.validation.mode = value.parse()?,
                "namespace" => {
                    config.validation.namespace = Some(value.clone()).filter(|ns| convert::has_value(ns))
                }
                "threads" => {
                    config.validation.threads = Some(convert::parse_or_none(&value).ok_or_else(invalid)?)
                }
                "format" => {
                    config.output.format = convert::parse_insensitive(&value).ok_or_else(invalid)?
                }
                "pretty" => {
                    let pretty = convert::parse_bool_lenient(&value).ok_or_else(invalid)?;
                    config.output.json.formatting = formatting_for(pretty);
                }
                "escape-html" | "escape_html" => {
                    config.output.json.escape_html =
                        convert::parse_bool_lenient(&value).ok_or_else(invalid)?
                }
                _ => {
                    return Err(ConfigError::Validation(format!(
                        "Unknown configuration key: {key}"
                    )));
                }
            }
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Result<Config> {
        if let Command::Validate {
            namespace, mode, ..
        } = &cli.command
        {
            if let Some(mode) = mode {
                config.validation.mode = mode.parse()?;
            }
            if namespace.is_some() {
                config.validation.namespace = namespace.clone();
            }
        }

        if let Some(format) = cli.format {
            config.output.format = format.into();
        }
        if cli.verbose {
            config.output.verbose = true;
            config.output.quiet = false;
        }
        if cli.quiet {
            config.output.quiet = true;
            config.output.verbose = false;
        }

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if let Some(threads) = config.validation.threads {
            if threads == 0 {
                return Err(ConfigError::Validation(
                    "Number of threads must be greater than 0".to_string(),
                ));
            }
            if threads > 1000 {
                return Err(ConfigError::Validation(
                    "Number of threads cannot exceed 1000".to_string(),
                ));
            }
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the effective thread count
    pub fn get_thread_count(config: &Config) -> usize {
        config.validation.threads.unwrap_or_else(num_cpus::get)
    }
}

fn formatting_for(pretty: bool) -> JsonFormatting {
    if pretty {
        JsonFormatting::Indented
    } else {
        JsonFormatting::Compact
    }
}
