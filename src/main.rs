use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use saas_cleanup::config::{parse_reference_date, Config};
use saas_cleanup::constants::CONFIG_PATH_ENV;
use saas_cleanup::domain::Timestamp;
use saas_cleanup::infra::http_client::ReqwestHttp;
use saas_cleanup::observability::{self, metrics};
use saas_cleanup::server::{self, AppState};
use saas_cleanup::{CleanupReport, ReportUseCase};

#[derive(Parser)]
#[command(name = "saas-cleanup")]
#[command(about = "SaaS account cleanup report across identity, collaboration and mail systems")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Summary,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one report and print it
    Report {
        /// Reference date (YYYY-MM-DD) inactivity is measured against
        #[arg(long)]
        reference_date: Option<String>,
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Serve reports over HTTP
    Serve {
        /// Port to bind (defaults to server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Explicit argument, otherwise the configured reference date.
fn resolve_reference(explicit: Option<&str>, config: &Config) -> anyhow::Result<Timestamp> {
    match explicit {
        Some(raw) => Ok(parse_reference_date(raw)?),
        None => Ok(config.reference_time()?),
    }
}

fn print_summary(report: &CleanupReport) {
    println!("\n📊 SaaS Cleanup Report:");
    println!("   Inactive users: {}", report.summary.inactive);
    println!("   Orphans:        {}", report.summary.orphans);
    println!("   Conflicts:      {}", report.summary.conflicts);

    if !report.conflicts.is_empty() {
        println!("\n⚠️  Disabled in identity provider but still active:");
        for profile in &report.conflicts {
            println!("   - {}", profile.identifier);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    // Flushes buffered file logs on drop
    let _log_guard = observability::init_logging(&config.logging).context("failed to initialize logging")?;
    let http = Arc::new(ReqwestHttp::new());
    let reports = Arc::new(ReportUseCase::from_config(http, &config));

    match cli.command {
        Commands::Report { reference_date, format } => {
            let reference_time = resolve_reference(reference_date.as_deref(), &config)?;
            info!(reference = %reference_time, base_url = %config.sources.base_url, "Generating report");

            let report = match reports.generate_report(reference_time).await {
                Ok(report) => report,
                Err(e) => {
                    error!("Report generation failed: {}", e);
                    return Err(e.into());
                }
            };

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Summary => print_summary(&report),
            }
        }
        Commands::Serve { port } => {
            metrics::init().map_err(|e| anyhow::anyhow!(e.to_string()))?;
            let state = AppState {
                reports,
                default_reference: config.reference_time()?,
            };
            server::start_server(state, port.unwrap_or(config.server.port)).await?;
        }
    }

    Ok(())
}
