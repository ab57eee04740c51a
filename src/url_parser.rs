//! Folder reference parsing: raw Drive IDs or folder share links.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ExportError, Result};

/// Share-link shapes that carry a folder ID in their first capture group.
static FOLDER_LINK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^https?://drive\.google\.com/drive/(?:u/\d+/)?folders/([a-zA-Z0-9_-]+)",
        r"^https?://drive\.google\.com/(?:open|folderview)\?(?:[^#]*&)?id=([a-zA-Z0-9_-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid folder link regex"))
    .collect()
});

static ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("Invalid ID regex"));

/// Resolve a folder reference to a bare Drive ID.
///
/// Accepts:
/// - `https://drive.google.com/drive/folders/<ID>`
/// - `https://drive.google.com/drive/u/<N>/folders/<ID>`
/// - `https://drive.google.com/open?id=<ID>` and `folderview?id=<ID>`
/// - a raw ID
///
/// ```
/// use sheet_export::url_parser::extract_id;
///
/// let id = extract_id("https://drive.google.com/drive/folders/1abc123").unwrap();
/// assert_eq!(id, "1abc123");
/// assert_eq!(extract_id("1abc123").unwrap(), "1abc123");
/// ```
pub fn extract_id(reference: &str) -> Result<String> {
    let trimmed = reference.trim();

    let from_link = FOLDER_LINK_PATTERNS
        .iter()
        .find_map(|re| re.captures(trimmed).and_then(|c| c.get(1)));
    if let Some(id) = from_link {
        return Ok(id.as_str().to_string());
    }

    if ID_REGEX.is_match(trimmed) {
        return Ok(trimmed.to_string());
    }

    Err(ExportError::InvalidUrlOrId(reference.to_string()))
}

/// Check that an ID returned by the API is safe to use as a URL segment and
/// a file name.
pub fn validate_file_id(id: &str) -> Result<&str> {
    if ID_REGEX.is_match(id) {
        Ok(id)
    } else {
        Err(ExportError::InvalidUrlOrId(id.to_string()))
    }
}
