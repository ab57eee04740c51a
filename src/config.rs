//! Run configuration resolved from command-line input.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::url_parser::extract_id;

/// Default number of files requested per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// What to do when a single file fails to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the run on the first failing file.
    #[default]
    FailFast,
    /// Log the failure, record it in the report and continue.
    KeepGoing,
}

/// Fully resolved inputs for one export run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub folder_id: String,
    pub credentials: PathBuf,
    pub output_dir: PathBuf,
    pub page_size: u32,
    pub failure_policy: FailurePolicy,
}

impl RunConfig {
    /// Build a config from raw user input.
    ///
    /// `folder` may be a raw ID or a Drive folder URL. `~` is expanded in
    /// both paths.
    pub fn new(folder: &str, credentials: &Path, output_dir: &Path) -> Result<Self> {
        Ok(Self {
            folder_id: extract_id(folder)?,
            credentials: expand_home(credentials),
            output_dir: expand_home(output_dir),
            page_size: DEFAULT_PAGE_SIZE,
            failure_policy: FailurePolicy::default(),
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Expand a leading `~` to the user's home directory.
///
/// `~user` forms are left untouched, as are paths when no home is known.
pub fn expand_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(first) if first.as_os_str() == "~" => match home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}
