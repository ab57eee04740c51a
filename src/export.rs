//! Drives one export run: list a folder, then download, convert and write
//! each spreadsheet in discovery order.

use std::fs;
use std::path::PathBuf;

use log::{error, info, warn};

use crate::client::DriveClient;
use crate::config::FailurePolicy;
use crate::convert::{parse_workbook, write_csv};
use crate::error::{ExportError, Result};
use crate::models::{format_size, FileDescriptor};

/// Outcome of an export run.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Files written, in processing order.
    pub written: Vec<PathBuf>,
    /// Files that failed when running with [`FailurePolicy::KeepGoing`].
    pub failed: Vec<(FileDescriptor, ExportError)>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Exports every spreadsheet in a folder to `<output_dir>/<id>.csv`.
pub struct SheetExporter<'a> {
    client: &'a DriveClient,
    output_dir: PathBuf,
    policy: FailurePolicy,
}

impl<'a> SheetExporter<'a> {
    pub fn new(client: &'a DriveClient, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create the output directory and its parents if needed.
    pub fn prepare_output_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ExportError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })
    }

    /// Run the export for a folder.
    ///
    /// Listing failures always abort. Per-file failures abort under
    /// [`FailurePolicy::FailFast`]; files already written stay on disk.
    pub async fn export_folder(&self, folder_id: &str) -> Result<ExportReport> {
        let files = self.client.list_spreadsheets(folder_id).await?;
        let ids: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
        info!("File IDs: {:?}", ids);

        self.prepare_output_dir()?;

        let mut report = ExportReport::default();
        for file in files {
            match self.export_file(&file).await {
                Ok(path) => report.written.push(path),
                Err(e) if self.policy == FailurePolicy::KeepGoing => {
                    warn!("Skipping {}: {}", file, e);
                    report.failed.push((file, e));
                }
                Err(e) => {
                    error!("Aborting run at {}", file);
                    return Err(e);
                }
            }
        }

        info!(
            "Exported {} file(s), {} failed",
            report.written.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Download, convert and write a single spreadsheet.
    pub async fn export_file(&self, file: &FileDescriptor) -> Result<PathBuf> {
        info!("Exporting {}", file);

        let mut last_percent = None;
        let bytes = self
            .client
            .export_spreadsheet(&file.id, |progress| {
                let percent = progress.percent();
                if last_percent != Some(percent) {
                    info!("Download {}%.", percent);
                    last_percent = Some(percent);
                }
            })
            .await?;
        info!("Downloaded {} ({})", file.id, format_size(bytes.len() as u64));

        let table = parse_workbook(&file.id, bytes)?;
        let path = write_csv(&table, &self.output_dir, &file.id)?;
        info!("File saved to {}", path.display());
        Ok(path)
    }
}
