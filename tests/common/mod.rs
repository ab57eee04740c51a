//! Shared helpers: throwaway service account, mocked token endpoint and
//! synthetic workbooks.

#![allow(dead_code)]

use std::io::Write;

use mockito::{Mock, ServerGuard};
use rust_xlsxwriter::{Workbook, XlsxError};
use serde_json::json;
use sheet_export::models::XLSX_MIME_TYPE;
use sheet_export::{Authenticator, DriveClient};
use tempfile::NamedTempFile;

/// RSA key generated for tests only.
pub const TEST_PRIVATE_KEY: &str = include_str!("../fixtures/test_key.pem");

pub const ACCESS_TOKEN: &str = "test-access-token";

/// Write a service account file whose token endpoint is the mock server.
pub fn credentials_file(server: &ServerGuard) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    let creds = json!({
        "type": "service_account",
        "client_email": "exporter@test-project.iam.gserviceaccount.com",
        "private_key": TEST_PRIVATE_KEY,
        "token_uri": format!("{}/token", server.url()),
    });
    file.write_all(creds.to_string().as_bytes()).unwrap();
    file
}

pub async fn mock_token(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "access_token": ACCESS_TOKEN,
                "token_type": "Bearer",
                "expires_in": 3600
            })
            .to_string(),
        )
        .create_async()
        .await
}

/// Client wired to the mock server. The credentials file and token mock
/// are held so they outlive the client.
pub struct Harness {
    pub client: DriveClient,
    _credentials: NamedTempFile,
    _token: Mock,
}

pub async fn harness(server: &mut ServerGuard) -> Harness {
    let token = mock_token(server).await;
    let credentials = credentials_file(server);
    let auth = Authenticator::from_file(credentials.path()).unwrap();
    Harness {
        client: DriveClient::new(auth).with_api_base(server.url()),
        _credentials: credentials,
        _token: token,
    }
}

pub fn files_page(files: &[(&str, &str)], next_page_token: Option<&str>) -> String {
    let files: Vec<_> = files
        .iter()
        .map(|(id, name)| {
            json!({
                "id": id,
                "name": name,
                "mimeType": "application/vnd.google-apps.spreadsheet"
            })
        })
        .collect();
    let mut body = json!({ "files": files });
    if let Some(token) = next_page_token {
        body["nextPageToken"] = json!(token);
    }
    body.to_string()
}

pub async fn mock_export(server: &mut ServerGuard, file_id: &str, body: Vec<u8>) -> Mock {
    server
        .mock("GET", format!("/files/{}/export", file_id).as_str())
        .match_query(mockito::Matcher::UrlEncoded(
            "mimeType".into(),
            XLSX_MIME_TYPE.into(),
        ))
        .match_header("authorization", format!("Bearer {}", ACCESS_TOKEN).as_str())
        .with_status(200)
        .with_header("content-type", XLSX_MIME_TYPE)
        .with_body(body)
        .create_async()
        .await
}

/// Workbook with a header row and integer rows on its first sheet.
pub fn numeric_workbook(headers: &[&str], rows: &[&[i32]]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet.write_number(r as u32 + 1, col as u16, *value)?;
        }
    }

    workbook.save_to_buffer()
}
