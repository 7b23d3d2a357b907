//! access-mysql-migrate CLI - Microsoft Access to MySQL migration.

use clap::{Parser, Subcommand};
use access_mysql_migrate::{
    ensure_row_counts_match, Config, MigrateError, MigrationResult, Orchestrator,
};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

#[derive(Parser)]
#[command(name = "access-mysql-migrate")]
#[command(about = "Translate a Microsoft Access database to MySQL and copy its data")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    /// Append log output to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate DDL, recreate target tables and transfer all rows
    Run {
        /// Dry run: write the DDL script without touching the target
        #[arg(long)]
        dry_run: bool,

        /// Override rows per transferred chunk
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Override the DDL script output path
        #[arg(long)]
        ddl_script: Option<PathBuf>,
    },

    /// Write the CREATE TABLE script only
    GenerateDdl {
        /// Output path [default: migration.ddl_script from config]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare row counts between source and target
    Validate,

    /// Test database connections
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format, cli.log_file.as_deref())?;

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Run {
            dry_run,
            chunk_size,
            ddl_script,
        } => {
            let mut orchestrator = Orchestrator::new(config).await?;
            if let Some(size) = chunk_size {
                orchestrator = orchestrator.with_chunk_size(size);
            }
            if let Some(path) = ddl_script {
                orchestrator = orchestrator.with_ddl_script(path);
            }

            let outcome = orchestrator.run(dry_run).await;
            orchestrator.close().await;
            let result = outcome?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                print_summary(&result, dry_run, &orchestrator.config().migration.ddl_script);
            }

            if result.has_failures() {
                return Err(MigrateError::transfer(
                    result.failed_tables.join(", "),
                    format!("{} of {} tables failed", result.tables_failed, result.tables_total),
                ));
            }
        }

        Commands::GenerateDdl { output } => {
            let orchestrator = Orchestrator::new(config).await?;
            let path = output.unwrap_or_else(|| orchestrator.config().migration.ddl_script.clone());
            let outcome = orchestrator.write_script(Some(&path)).await;
            orchestrator.close().await;
            let script = outcome?;

            if cli.output_json {
                let summary = serde_json::json!({
                    "path": path,
                    "tables": script.definitions().iter().map(|d| &d.table_name).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Wrote {} table definitions to {}", script.len(), path.display());
            }
        }

        Commands::Validate => {
            let orchestrator = Orchestrator::new(config).await?;
            let outcome = orchestrator.validate().await;
            orchestrator.close().await;
            let checks = outcome?;
            let mismatched = checks.iter().filter(|c| !c.matches).count();

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&checks)?);
            } else {
                println!("Row count validation:");
                for check in &checks {
                    println!(
                        "  {:<32} source={:<10} target={:<10} {}",
                        check.table,
                        check.source_rows,
                        check.target_rows,
                        if check.matches { "OK" } else { "MISMATCH" }
                    );
                }
                println!("\n  {}/{} tables match", checks.len() - mismatched, checks.len());
            }

            ensure_row_counts_match(&checks)?;
        }

        Commands::HealthCheck => {
            let orchestrator = Orchestrator::new(config).await?;
            let result = orchestrator.health_check().await?;
            orchestrator.close().await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (Access): {} ({}ms)",
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target (MySQL): {} ({}ms)",
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            result.ensure_healthy()?;
        }
    }

    Ok(())
}

fn print_summary(result: &MigrationResult, dry_run: bool, ddl_script: &Path) {
    let status_msg = if dry_run { "Dry run completed!" } else { "Migration completed!" };
    println!("\n{}", status_msg);
    println!("  Run ID: {}", result.run_id);
    println!("  DDL script: {}", ddl_script.display());
    println!("  Duration: {:.2}s", result.duration_seconds);
    if dry_run {
        println!("  Tables: {}", result.tables_total);
        return;
    }
    println!("  Tables: {}/{}", result.tables_success, result.tables_total);
    println!("  Rows: {}", result.rows_transferred);
    println!("  Throughput: {} rows/sec", result.rows_per_second);
    for table in result.tables.iter().filter(|t| !t.is_success()) {
        println!(
            "  FAILED {}: {} rows committed, {}",
            table.table,
            table.rows,
            table.error.as_deref().unwrap_or("unknown error")
        );
    }
}

fn setup_logging(verbosity: &str, format: &str, log_file: Option<&Path>) -> Result<(), MigrateError> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let writer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    // stdout is reserved for results
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_ansi(log_file.is_none())
        .with_writer(writer);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
