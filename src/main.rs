//! sheet_export CLI - Export every Google Sheet in a Drive folder to CSV.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info};

use sheet_export::config::{FailurePolicy, RunConfig, DEFAULT_PAGE_SIZE};
use sheet_export::{Authenticator, DriveClient, SheetExporter};

/// Download Google Sheets files from a specified folder as CSV.
#[derive(Parser, Debug)]
#[command(name = "sheet_export")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The ID (or folder URL) of the folder to search for Google Sheets files.
    #[arg(short = 'f', long = "folder_id")]
    folder_id: String,

    /// The output directory for the downloaded files.
    #[arg(short = 'o', long = "ouput_dir", visible_alias = "output_dir")]
    output_dir: PathBuf,

    /// Path to the service account JSON credentials file.
    #[arg(short = 'c', long = "credential_json_dir")]
    credentials: PathBuf,

    /// Number of files requested per listing page.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,

    /// Continue with the remaining files when one fails.
    #[arg(long)]
    keep_going: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    debug!("{:?}", cli);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when some files failed under `--keep-going`.
async fn run(cli: Cli) -> Result<bool> {
    let policy = if cli.keep_going {
        FailurePolicy::KeepGoing
    } else {
        FailurePolicy::FailFast
    };
    let config = RunConfig::new(&cli.folder_id, &cli.credentials, &cli.output_dir)?
        .with_page_size(cli.page_size)
        .with_failure_policy(policy);

    let auth = Authenticator::from_file(&config.credentials)?;
    info!("Authenticated as {}", auth.client_email());

    let client = DriveClient::new(auth).with_page_size(config.page_size);
    let exporter =
        SheetExporter::new(&client, &config.output_dir).with_failure_policy(config.failure_policy);

    let report = exporter
        .export_folder(&config.folder_id)
        .await
        .with_context(|| format!("Export of folder {} failed", config.folder_id))?;

    for (file, e) in &report.failed {
        error!("{}: {}", file, e);
    }
    Ok(report.is_success())
}
