use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show errors
    Quiet,
    /// Show per-document results and a summary
    #[default]
    Normal,
    /// Also show every schema issue
    Verbose,
}

impl VerbosityLevel {
    /// Maximum `tracing` level for this verbosity
    pub fn tracing_level(&self) -> tracing::Level {
        match self {
            VerbosityLevel::Quiet => tracing::Level::ERROR,
            VerbosityLevel::Normal => tracing::Level::WARN,
            VerbosityLevel::Verbose => tracing::Level::DEBUG,
        }
    }
}

/// Output format selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Summary,
}

/// Validate XML documents against XML Schemas and inspect key=value arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "validate-toolkit")]
#[command(about = "Validate XML documents against XML Schemas and parse key=value arguments")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format
    #[arg(long = "format", global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Override a configuration value (key=value, repeatable)
    #[arg(long = "set", global = true, action = clap::ArgAction::Append)]
    pub overrides: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Validate documents against a schema
    Validate {
        /// Schema (XSD) file
        #[arg(short = 's', long = "schema")]
        schema: PathBuf,

        /// Target namespace the schema must declare
        #[arg(short = 'n', long = "namespace")]
        namespace: Option<String>,

        /// Validation mode: file-system or in-memory
        #[arg(short = 'm', long = "mode")]
        mode: Option<String>,

        /// Documents to validate
        #[arg(required = true)]
        documents: Vec<PathBuf>,
    },

    /// Parse key=value tokens and print the resulting table
    Args {
        /// Tokens such as `--key=value` or `key=value`
        #[arg(required = true, allow_hyphen_values = true, trailing_var_arg = true)]
        tokens: Vec<String>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}
