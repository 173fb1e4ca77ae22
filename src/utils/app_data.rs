use crate::search::types::{DEFAULT_MAX_FILE_SIZE, SearchParameters};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "fss";
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding [`AppConfig::max_file_size`] (accepts units)
pub const ENV_MAX_FILE_SIZE: &str = "FSS_MAX_FILE_SIZE";
/// Environment variable overriding [`AppConfig::search_threads`]
pub const ENV_SEARCH_THREADS: &str = "FSS_SEARCH_THREADS";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Wildcard used when none is given on the command line
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Files larger than this are not content-scanned
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    #[serde(default = "default_true")]
    pub recursive: bool,

    #[serde(default = "default_true")]
    pub ignore_case: bool,

    #[serde(default = "default_true")]
    pub skip_dot_entries: bool,

    /// Threads used for content scans
    /// If 0, uses the number of CPU cores
    #[serde(default)]
    pub search_threads: usize,
}

fn default_pattern() -> String {
    "*".to_string()
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            max_file_size: default_max_file_size(),
            recursive: true,
            ignore_case: true,
            skip_dot_entries: true,
            search_threads: 0,
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not
    /// found, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load config from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Apply `FSS_*` overrides looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MAX_FILE_SIZE) {
            self.max_file_size = super::parse_byte_size(&value)
                .with_context(|| format!("Invalid {}", ENV_MAX_FILE_SIZE))?;
        }
        if let Some(value) = lookup(ENV_SEARCH_THREADS) {
            self.search_threads = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}", ENV_SEARCH_THREADS))?;
        }
        Ok(())
    }

    /// Get the effective search thread count (resolves 0 to CPU count)
    pub fn effective_search_threads(&self) -> usize {
        if self.search_threads == 0 {
            num_cpus()
        } else {
            self.search_threads
        }
    }

    /// Parameters for a search of `search_string` under `path` with the
    /// configured defaults
    pub fn parameters(
        &self,
        path: impl Into<PathBuf>,
        search_string: impl Into<String>,
    ) -> SearchParameters {
        SearchParameters {
            pattern: self.pattern.clone(),
            recursive: self.recursive,
            ignore_case: self.ignore_case,
            skip_dot_entries: self.skip_dot_entries,
            max_file_size: self.max_file_size,
            ..SearchParameters::new(path, search_string)
        }
    }
}

/// Get the number of CPUs available
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}
