use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use validate_toolkit::arguments::ArgumentTable;
use validate_toolkit::cli::{Cli, Command, VerbosityLevel};
use validate_toolkit::config::{Config, ConfigManager};
use validate_toolkit::error::ToolkitError;
use validate_toolkit::output::{BatchTotals, Output};
use validate_toolkit::validator::{DocumentValidation, SchemaValidator, ValidationMode};

const EXIT_ISSUES: u8 = 1;
const EXIT_HARD_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.verbosity());

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(EXIT_HARD_ERROR)
        }
    }
}

fn init_tracing(verbosity: VerbosityLevel) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(verbosity.tracing_level())
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = ConfigManager::load_config(&cli)
        .await
        .context("failed to load configuration")?;
    let output = Output::from_config(&config);

    match &cli.command {
        Command::Validate {
            schema, documents, ..
        } => run_validate(&config, &output, schema.clone(), documents.clone()).await,
        Command::Args { tokens } => run_args(&output, tokens),
    }
}

async fn run_validate(
    config: &Config,
    output: &Output,
    schema: PathBuf,
    documents: Vec<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let validator =
        SchemaValidator::new().with_threads(ConfigManager::get_thread_count(config))?;
    let mode = config.validation.mode;
    let namespace = config.validation.namespace.clone();

    let started = Instant::now();
    tracing::debug!(%mode, documents = documents.len(), "starting validation");

    // libxml2 work is blocking; keep it off the async runtime
    let results = tokio::task::spawn_blocking(move || {
        validate_all(&validator, mode, &schema, &documents, namespace.as_deref())
    })
    .await
    .context("validation task failed")??;

    let rendered = output.format_validation(
        &results,
        config.validation.namespace.as_deref(),
        started.elapsed(),
    )?;
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }

    let totals = BatchTotals::from_results(&results);
    Ok(if totals.all_valid() {
        ExitCode::SUCCESS
    } else if totals.errors > 0 {
        ExitCode::from(EXIT_HARD_ERROR)
    } else {
        ExitCode::from(EXIT_ISSUES)
    })
}

fn validate_all(
    validator: &SchemaValidator,
    mode: ValidationMode,
    schema: &Path,
    documents: &[PathBuf],
    namespace: Option<&str>,
) -> anyhow::Result<Vec<DocumentValidation>> {
    match mode {
        ValidationMode::FileSystem => Ok(validator.validate_files(schema, documents, namespace)?),
        ValidationMode::InMemory => {
            let schema_text = std::fs::read_to_string(schema)
                .with_context(|| format!("failed to read schema {}", schema.display()))?;

            Ok(documents
                .iter()
                .map(|path| DocumentValidation {
                    path: path.clone(),
                    result: read_document(path).and_then(|text| {
                        validator.validate(mode, &text, &schema_text, namespace)
                    }),
                })
                .collect())
        }
    }
}

fn read_document(path: &Path) -> validate_toolkit::Result<String> {
    if !path.is_file() {
        return Err(ToolkitError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

fn run_args(output: &Output, tokens: &[String]) -> anyhow::Result<ExitCode> {
    match ArgumentTable::parse(tokens) {
        Ok(table) => {
            println!("{}", output.format_arguments(&table)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => match err.argument_errors() {
            Some(errors) => {
                println!("{}", output.format_argument_errors(errors)?);
                Ok(ExitCode::from(EXIT_ISSUES))
            }
            None => Err(err.into()),
        },
    }
}
