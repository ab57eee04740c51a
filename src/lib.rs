//! sheet_export - Export the Google Sheets in a Drive folder to CSV files.
//!
//! This library provides functionality to:
//! - Authenticate with a service account
//! - List the spreadsheets directly inside a Drive folder
//! - Export each one as XLSX and write its first sheet to `<id>.csv`
//!
//! # Example
//!
//! ```no_run
//! use sheet_export::{Authenticator, DriveClient, SheetExporter};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let auth = Authenticator::from_file("~/service-account.json")?;
//!     let client = DriveClient::new(auth);
//!
//!     let report = SheetExporter::new(&client, "out")
//!         .export_folder("folder-id")
//!         .await?;
//!     for path in &report.written {
//!         println!("{}", path.display());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod models;
pub mod url_parser;

// Re-exports for convenience
pub use auth::Authenticator;
pub use client::{DownloadProgress, DriveClient};
pub use convert::SheetTable;
pub use error::{DriveError, ExportError, Result};
pub use export::{ExportReport, SheetExporter};
pub use models::FileDescriptor;
pub use url_parser::extract_id;
