mod config;
mod logging;
mod redaction;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use config::{ConfigError, LogFormat, Overrides, Settings, environment, load_config};
use logging::{LoggingError, init_logging};
use redaction::redact_connection_string;
use schemafs_core::{Error as CoreError, SchemaRestorer, SchemaWriter, TracingLogger};
use schemafs_introspect::{PgExecutor, capture_schema, database_name, ensure_empty_database};
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

#[derive(Parser, Debug)]
#[command(name = "schemafs", version, about = "Capture a Postgres schema as flat .sql files and restore it")]
struct Cli {
    /// Path to a TOML config file (defaults to ./schemafs.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log format for stderr.
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,
    /// Also append JSON log lines to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write every captured object of a database as one .sql file.
    Dump(DumpArgs),
    /// Replay a dump directory against a database.
    Restore(RestoreArgs),
}

#[derive(Args, Debug)]
struct CaptureArgs {
    /// Schema to skip (repeatable; replaces the configured list).
    #[arg(long = "skip-schema", value_name = "SCHEMA")]
    skip_schemas: Vec<String>,
    /// Function name to skip (repeatable; replaces the configured list).
    #[arg(long = "skip-function", value_name = "FUNCTION")]
    skip_functions: Vec<String>,
    /// Extension to skip (repeatable; replaces the configured list).
    #[arg(long = "skip-extension", value_name = "EXTENSION")]
    skip_extensions: Vec<String>,
    /// Maximum pool connections.
    #[arg(long)]
    max_connections: Option<u32>,
}

#[derive(Args, Debug)]
struct DumpArgs {
    /// Database connection string.
    #[arg(value_name = "CONNECTION_STRING")]
    url: String,
    /// Output directory; defaults to <dump_root>/<env>/<database>.
    #[arg(long)]
    out: Option<PathBuf>,
    #[command(flatten)]
    capture: CaptureArgs,
}

#[derive(Args, Debug)]
struct RestoreArgs {
    /// Connection string of the target server or database.
    #[arg(value_name = "CONNECTION_STRING")]
    url: String,
    /// Dump directory; defaults to <dump_root>/<env>/<database>.
    #[arg(long)]
    src: Option<PathBuf>,
    /// Drop and recreate this database, then restore into it.
    #[arg(long, value_name = "DATABASE")]
    recreate: Option<String>,
    /// Maximum pool connections.
    #[arg(long)]
    max_connections: Option<u32>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(event = "command_failed", error = %err);
            eprintln!("schemafs: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let file = load_config(cli.config.as_deref())?;
    let overrides = match &cli.command {
        Command::Dump(args) => Overrides {
            skip_schemas: args.capture.skip_schemas.clone(),
            skip_functions: args.capture.skip_functions.clone(),
            skip_extensions: args.capture.skip_extensions.clone(),
            max_connections: args.capture.max_connections,
            log_format: cli.log_format,
        },
        Command::Restore(args) => Overrides {
            max_connections: args.max_connections,
            log_format: cli.log_format,
            ..Overrides::default()
        },
    };
    let settings = Settings::resolve(file, overrides, environment());
    init_logging(settings.log_format, cli.log_file.as_deref())?;

    match cli.command {
        Command::Dump(args) => run_dump(args, &settings).await,
        Command::Restore(args) => run_restore(args, &settings).await,
    }
}

async fn run_dump(args: DumpArgs, settings: &Settings) -> Result<(), CliError> {
    let logger = TracingLogger;
    let timer = Instant::now();
    tracing::info!(
        event = "dump_started",
        connection = %redact_connection_string(&args.url),
        env = %settings.environment
    );

    let executor = PgExecutor::connect(&args.url, &settings.pool).await?;
    let outcome = async {
        let database = database_name(&executor).await?;
        let root = args
            .out
            .clone()
            .unwrap_or_else(|| settings.dump_dir(&database));
        let writer = SchemaWriter::new(&root, &logger);
        let report = capture_schema(&executor, &writer, &settings.capture, &logger).await?;
        Ok::<_, CoreError>((root, report))
    }
    .await;
    executor.close().await;
    let (root, report) = outcome?;

    tracing::info!(
        event = "dump_finished",
        root = %root.display(),
        files = report.files.len(),
        schemas = report.schemas.len(),
        duration_ms = elapsed_ms(timer)
    );
    Ok(())
}

async fn run_restore(args: RestoreArgs, settings: &Settings) -> Result<(), CliError> {
    let logger = TracingLogger;
    let timer = Instant::now();
    tracing::info!(
        event = "restore_started",
        connection = %redact_connection_string(&args.url),
        env = %settings.environment
    );

    let executor = match &args.recreate {
        Some(name) => {
            let admin = PgExecutor::connect(&args.url, &settings.pool).await?;
            let target =
                ensure_empty_database(&admin, &args.url, name, &settings.pool, &logger).await;
            admin.close().await;
            target?
        }
        None => PgExecutor::connect(&args.url, &settings.pool).await?,
    };

    let outcome = async {
        let src = match &args.src {
            Some(src) => src.clone(),
            None => settings.dump_dir(&database_name(&executor).await?),
        };
        if !src.is_dir() {
            return Err(CliError::InvalidArgs(format!(
                "dump directory does not exist: {}",
                src.display()
            )));
        }
        let report = SchemaRestorer::new(&src, &executor, &logger)
            .restore()
            .await?;
        Ok::<_, CliError>((src, report))
    }
    .await;
    executor.close().await;
    let (src, report) = outcome?;

    tracing::info!(
        event = "restore_finished",
        src = %src.display(),
        executed = report.executed.len(),
        deferred = report.deferred,
        duration_ms = elapsed_ms(timer)
    );
    Ok(())
}

fn elapsed_ms(timer: Instant) -> u64 {
    u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX)
}
