use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default upper bound for files whose contents are scanned (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Everything the engine needs to run one search.
///
/// Built by the caller, validated by the orchestrator and then frozen: the
/// orchestrator takes it by value and only ever hands out shared references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParameters {
    /// Directory the search starts from
    pub path: PathBuf,
    /// Wildcard applied to entry names (`*`, `*.rs`, ...)
    pub pattern: String,
    /// String looked for in names, paths and/or contents
    pub search_string: String,

    pub search_for_files: bool,
    pub search_in_file_name: bool,
    pub search_in_file_path: bool,
    pub search_in_file_contents: bool,
    pub contents_as_utf8: bool,
    pub contents_as_utf16: bool,

    pub search_for_directories: bool,
    pub search_in_directory_path: bool,
    pub search_in_directory_name: bool,

    pub recursive: bool,
    pub ignore_case: bool,
    /// Skip files and directories whose name starts with a dot
    pub skip_dot_entries: bool,

    /// Files larger than this are enumerated but their contents are not scanned
    pub max_file_size: u64,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            pattern: "*".to_string(),
            search_string: String::new(),
            search_for_files: true,
            search_in_file_name: true,
            search_in_file_path: false,
            search_in_file_contents: false,
            contents_as_utf8: false,
            contents_as_utf16: false,
            search_for_directories: false,
            search_in_directory_path: false,
            search_in_directory_name: false,
            recursive: true,
            ignore_case: true,
            skip_dot_entries: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl SearchParameters {
    /// Parameters with defaults for everything but the location and the string
    pub fn new(path: impl Into<PathBuf>, search_string: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            search_string: search_string.into(),
            ..Self::default()
        }
    }

    /// `path/pattern` as shown in result headers
    pub fn path_and_pattern(&self) -> String {
        let mut result = self.path.to_string_lossy().into_owned();
        if !result.ends_with('/') && !result.ends_with('\\') {
            result.push(std::path::MAIN_SEPARATOR);
        }
        result.push_str(&self.pattern);
        result
    }
}

/// Snapshot of engine counters.
///
/// Every snapshot fully supersedes the previous one. Counters are expected to
/// grow but nothing in this crate enforces it; snapshots are relayed as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStatistics {
    pub directories_enumerated: u64,
    pub files_enumerated: u64,
    pub file_contents_searched: u64,
    pub results_found: u64,
    /// Cumulative size of all enumerated files
    pub total_file_size: u64,
    /// Cumulative size of all content-scanned files
    pub scanned_file_size: u64,
    pub search_time_secs: f64,
}

/// A matching file or directory reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: u64,
    /// Seconds since the unix epoch, when the platform reports it
    pub modified: Option<u64>,
}
