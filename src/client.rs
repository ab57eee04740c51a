//! Google Drive API client for listing and exporting spreadsheets.

use futures::StreamExt;
use log::{debug, info};
use reqwest::{Client, Response};

use crate::auth::Authenticator;
use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::{DriveError, ExportError, Result};
use crate::models::{
    ApiErrorResponse, FileDescriptor, FileListResponse, SPREADSHEET_MIME_TYPE, XLSX_MIME_TYPE,
};
use crate::url_parser::validate_file_id;

/// Base URL for Google Drive API v3.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Upper bound on buffer preallocation from an announced Content-Length.
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// Progress of a single export transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub bytes_received: u64,
    /// Size announced by the server, if any.
    pub total_bytes: Option<u64>,
    pub done: bool,
}

impl DownloadProgress {
    /// Completion percentage in `0..=100`.
    ///
    /// Unknown totals report 0 until the transfer is done.
    pub fn percent(&self) -> u8 {
        if self.done {
            return 100;
        }
        match self.total_bytes {
            Some(total) if total > 0 => {
                (self.bytes_received.saturating_mul(100) / total).min(100) as u8
            }
            _ => 0,
        }
    }
}

/// Client for the Drive endpoints used by an export run.
pub struct DriveClient {
    auth: Authenticator,
    http: Client,
    api_base: String,
    page_size: u32,
}

impl DriveClient {
    /// Create a client against the public Drive API.
    pub fn new(auth: Authenticator) -> Self {
        Self {
            auth,
            http: Client::new(),
            api_base: DRIVE_API_BASE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Point the client at another API root (e.g. a mock server).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Maximum number of files requested per listing page.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// List the spreadsheets directly inside a folder.
    ///
    /// Follows `nextPageToken` until the listing is exhausted. Files are
    /// returned in the order the pages arrived. Any rejected page aborts the
    /// listing.
    pub async fn list_spreadsheets(&self, folder_id: &str) -> Result<Vec<FileDescriptor>> {
        let query = format!(
            "'{}' in parents and mimeType = '{}'",
            folder_id.replace('\'', "\\'"),
            SPREADSHEET_MIME_TYPE
        );
        let listing_error = |source: DriveError| ExportError::Listing {
            folder_id: folder_id.to_string(),
            source,
        };

        let token = self.auth.get_access_token().await.map_err(listing_error)?;
        let mut all_files: Vec<FileDescriptor> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_page(&token, &query, page_token.as_deref())
                .await
                .map_err(listing_error)?;

            if page.files.is_empty() {
                info!("No files found.");
            }
            for file in &page.files {
                info!("Found file: {}", file);
            }
            all_files.extend(page.files);

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        Ok(all_files)
    }

    async fn list_page(
        &self,
        token: &str,
        query: &str,
        page_token: Option<&str>,
    ) -> std::result::Result<FileListResponse, DriveError> {
        let page_size = self.page_size.to_string();
        let mut request = self
            .http
            .get(format!("{}/files", self.api_base))
            .bearer_auth(token)
            .query(&[
                ("q", query),
                ("spaces", "drive"),
                ("fields", "nextPageToken, files(id, name)"),
                ("pageSize", page_size.as_str()),
                ("includeItemsFromAllDrives", "true"),
                ("supportsAllDrives", "true"),
            ]);

        if let Some(page_token) = page_token {
            request = request.query(&[("pageToken", page_token)]);
        }

        debug!("Listing page (token: {:?})", page_token);
        let response = check_status(request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Export a spreadsheet as XLSX and read it fully into memory.
    ///
    /// `on_progress` is called after every received chunk and once more when
    /// the transfer completes.
    pub async fn export_spreadsheet<F>(
        &self,
        file_id: &str,
        mut on_progress: F,
    ) -> Result<Vec<u8>>
    where
        F: FnMut(DownloadProgress),
    {
        validate_file_id(file_id)?;
        let download_error = |source: DriveError| ExportError::Download {
            file_id: file_id.to_string(),
            source,
        };

        let token = self.auth.get_access_token().await.map_err(download_error)?;

        let response = self
            .http
            .get(format!("{}/files/{}/export", self.api_base, file_id))
            .bearer_auth(&token)
            .query(&[("mimeType", XLSX_MIME_TYPE)])
            .send()
            .await
            .map_err(|e| download_error(e.into()))?;
        let response = check_status(response).await.map_err(download_error)?;

        let total_bytes = response.content_length();
        let mut progress = DownloadProgress {
            bytes_received: 0,
            total_bytes,
            done: false,
        };
        let capacity = total_bytes.unwrap_or(0).min(MAX_PREALLOCATION) as usize;
        let mut buffer = Vec::with_capacity(capacity);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| download_error(e.into()))?;
            buffer.extend_from_slice(&chunk);
            progress.bytes_received += chunk.len() as u64;
            on_progress(progress);
        }

        progress.done = true;
        on_progress(progress);

        Ok(buffer)
    }
}

/// Turn a non-success response into an `ApiError`, decoding Google's error
/// body when present.
async fn check_status(response: Response) -> std::result::Result<Response, DriveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
        return Err(DriveError::ApiError {
            status: api_error.error.code,
            message: api_error.error.message,
        });
    }
    Err(DriveError::ApiError {
        status: status.as_u16(),
        message: error_body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_with_known_total() {
        let mut progress = DownloadProgress {
            bytes_received: 0,
            total_bytes: Some(200),
            done: false,
        };
        assert_eq!(progress.percent(), 0);

        progress.bytes_received = 50;
        assert_eq!(progress.percent(), 25);

        progress.bytes_received = 200;
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn test_progress_never_exceeds_100() {
        let progress = DownloadProgress {
            bytes_received: 500,
            total_bytes: Some(200),
            done: false,
        };
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn test_progress_unknown_total() {
        let mut progress = DownloadProgress {
            bytes_received: 4096,
            total_bytes: None,
            done: false,
        };
        assert_eq!(progress.percent(), 0);

        progress.done = true;
        assert_eq!(progress.percent(), 100);
    }
}
