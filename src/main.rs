use anyhow::{Context, Result, bail};
use clap::Parser;
use fss::engine::{SearchEngine, WalkEngine};
use fss::output::{print_entry, print_summary, progress_message, summary_json};
use fss::search::{SearchEvent, SearchOrchestrator, SearchParameters};
use fss::utils::progress::search_spinner;
use fss::utils::{AppConfig, parse_byte_size};
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::time::Duration;

/// How long to wait for the engine to let go of a finished search on exit
const RELEASE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "fss")]
#[command(about = "Search a directory tree for files and directories by name, path or contents")]
struct Cli {
    /// String to look for
    search_string: String,

    /// Directory to search in
    #[arg(short, long, default_value = ".")]
    path: PathBuf,

    /// Wildcard for entry names (default from config, usually "*")
    #[arg(short = 'g', long)]
    pattern: Option<String>,

    /// Match file names (the default file mode)
    #[arg(long)]
    name: bool,

    /// Match full file paths
    #[arg(long)]
    file_path: bool,

    /// Match file contents
    #[arg(long)]
    contents: bool,

    /// Search contents as UTF-8 (ASCII search strings only)
    #[arg(long)]
    utf8: bool,

    /// Search contents as UTF-16
    #[arg(long)]
    utf16: bool,

    /// Also search directories (by name unless --dir-path is given)
    #[arg(long)]
    dirs: bool,

    /// Match directory names
    #[arg(long)]
    dir_name: bool,

    /// Match full directory paths
    #[arg(long)]
    dir_path: bool,

    /// Do not search files
    #[arg(long)]
    no_files: bool,

    /// Only look at the top level of the directory
    #[arg(long)]
    no_recursive: bool,

    #[arg(long)]
    case_sensitive: bool,

    /// Include files and directories whose name starts with a dot
    #[arg(long)]
    include_dot: bool,

    /// Skip contents of files larger than this (e.g. 512K, 10MB)
    #[arg(long, value_parser = parse_size_arg)]
    max_size: Option<u64>,

    /// Stream results to stdout instead of opening the results window
    #[arg(long)]
    print: bool,

    /// Print final statistics as JSON (implies --print)
    #[arg(long)]
    json: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn parse_size_arg(value: &str) -> Result<u64, String> {
    parse_byte_size(value).map_err(|e| e.to_string())
}

impl Cli {
    fn parameters(&self, config: &AppConfig) -> SearchParameters {
        let mut params = config.parameters(&self.path, self.search_string.as_str());

        if let Some(pattern) = &self.pattern {
            params.pattern = pattern.clone();
        }

        params.search_for_files = !self.no_files;
        if self.name || self.file_path || self.contents {
            params.search_in_file_name = self.name;
            params.search_in_file_path = self.file_path;
            params.search_in_file_contents = self.contents;
        }
        if self.contents {
            if self.utf8 || self.utf16 {
                params.contents_as_utf8 = self.utf8;
                params.contents_as_utf16 = self.utf16;
            } else {
                // UTF-8 scanning only takes ASCII strings
                params.contents_as_utf8 = self.search_string.is_ascii();
                params.contents_as_utf16 = true;
            }
        }

        params.search_for_directories = self.dirs || self.dir_name || self.dir_path;
        params.search_in_directory_name = self.dir_name || (self.dirs && !self.dir_path);
        params.search_in_directory_path = self.dir_path;

        if self.no_recursive {
            params.recursive = false;
        }
        if self.case_sensitive {
            params.ignore_case = false;
        }
        if self.include_dot {
            params.skip_dot_entries = false;
        }
        if let Some(max_size) = self.max_size {
            params.max_file_size = max_size;
        }
        params
    }

    fn streaming(&self) -> bool {
        self.print || self.json || cfg!(not(feature = "interactive"))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("FSS_LOG", "warn")).init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;
    let params = cli.parameters(&config);
    log::debug!("search parameters: {:?}", params);

    let engine: Arc<dyn SearchEngine> =
        Arc::new(WalkEngine::new(config.effective_search_threads()));

    if cli.streaming() {
        return run_print(engine, params, cli.json, !cli.no_color);
    }

    #[cfg(feature = "interactive")]
    fss::tui::run(engine, params)?;

    Ok(())
}

fn run_print(
    engine: Arc<dyn SearchEngine>,
    params: SearchParameters,
    json: bool,
    color: bool,
) -> Result<()> {
    let orchestrator = SearchOrchestrator::new(engine);
    let (tx, rx) = mpsc::channel();
    let job = orchestrator.submit(params, Arc::new(tx))?;

    let spinner = search_spinner();
    let mut outcome = None;

    for event in rx.iter() {
        match event {
            SearchEvent::FoundItem(entry) => {
                spinner
                    .suspend(|| print_entry(&entry, color))
                    .context("Failed to write result")?;
            }
            SearchEvent::ProgressChanged(update) => {
                spinner.set_message(progress_message(&update.stats, update.fraction));
            }
            SearchEvent::Completed(stats) => {
                outcome = Some(Ok(stats));
                break;
            }
            SearchEvent::Failed(message) => {
                outcome = Some(Err(message));
                break;
            }
        }
    }
    spinner.finish_and_clear();

    if !job.wait_disposed(RELEASE_TIMEOUT) {
        log::warn!("search was not released within {:?}", RELEASE_TIMEOUT);
    }

    match outcome {
        Some(Ok(stats)) if json => println!("{}", summary_json(&stats)?),
        Some(Ok(stats)) => print_summary(&stats, color).context("Failed to write summary")?,
        Some(Err(message)) => bail!("Search failed: {}", message),
        None => bail!("Search ended without a result"),
    }
    Ok(())
}
