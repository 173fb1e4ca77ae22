use crate::engine::SearchEngine;
use crate::search::{
    CleanupTask, SearchEvent, SearchOrchestrator, SearchParameters, SearchStatistics,
};
use crate::search::types::FoundEntry;
use anyhow::Result;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Results,
    Help,
}

/// Where the search stands, as far as the window knows
#[derive(Debug, Clone, PartialEq)]
pub enum SearchStatus {
    Running,
    Completed,
    Cancelled,
    Failed(String),
}

impl SearchStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, SearchStatus::Running)
    }
}

/// Page size for PageUp/PageDown
const PAGE: usize = 10;

/// Results window state
pub struct App {
    /// `Results for "X" in "path/pattern"`
    pub header: String,
    pub results: Vec<FoundEntry>,
    pub selected: usize,
    pub stats: SearchStatistics,
    /// `None` while the amount of work is unknown
    pub fraction: Option<f64>,
    pub status: SearchStatus,
    pub mode: Mode,
    orchestrator: SearchOrchestrator,
    events: Receiver<SearchEvent>,
    /// Releases started from the window; waited for on exit
    cleanups: Vec<CleanupTask>,
}

impl App {
    /// Open the window and start searching
    pub fn start(engine: Arc<dyn SearchEngine>, parameters: SearchParameters) -> Result<Self> {
        let header = format!(
            "Results for \"{}\" in \"{}\"",
            parameters.search_string,
            parameters.path_and_pattern()
        );

        let orchestrator = SearchOrchestrator::new(engine);
        let (tx, rx) = mpsc::channel();
        orchestrator.submit(parameters, Arc::new(tx))?;

        Ok(Self {
            header,
            results: Vec::new(),
            selected: 0,
            stats: SearchStatistics::default(),
            fraction: None,
            status: SearchStatus::Running,
            mode: Mode::Results,
            orchestrator,
            events: rx,
            cleanups: Vec::new(),
        })
    }

    /// Apply every queued event (non-blocking)
    pub fn poll_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn apply(&mut self, event: SearchEvent) {
        match event {
            SearchEvent::FoundItem(entry) => self.results.push(entry),
            SearchEvent::ProgressChanged(update) => {
                self.stats = update.stats;
                if update.fraction.is_some() {
                    self.fraction = update.fraction;
                }
                // Dropping the update lets the next one through
            }
            SearchEvent::Completed(stats) => {
                self.stats = stats;
                self.fraction = Some(1.0);
                self.status = SearchStatus::Completed;
            }
            SearchEvent::Failed(message) => {
                self.status = SearchStatus::Failed(message);
            }
        }
    }

    /// Stop the search but keep the window open
    pub fn cancel(&mut self) {
        if !self.status.is_running() {
            return;
        }
        if let Some(task) = self.orchestrator.cancel() {
            self.cleanups.push(task);
        }
        self.status = SearchStatus::Cancelled;
        self.stats = self.orchestrator.statistics();
    }

    /// Close the window. The returned tasks finish releasing the engine.
    pub fn close(mut self) -> Vec<CleanupTask> {
        if let Some(task) = self.orchestrator.dispose() {
            self.cleanups.push(task);
        }
        std::mem::take(&mut self.cleanups)
    }

    pub fn status_line(&self) -> String {
        match &self.status {
            SearchStatus::Running => crate::output::progress_message(&self.stats, self.fraction),
            SearchStatus::Completed => format!(
                "Done: {} results in {}",
                self.stats.results_found,
                crate::output::format_search_time(self.stats.search_time_secs)
            ),
            SearchStatus::Cancelled => "Cancelled".to_string(),
            SearchStatus::Failed(message) => format!("Search failed: {}", message),
        }
    }

    pub fn selected_entry(&self) -> Option<&FoundEntry> {
        self.results.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if !self.results.is_empty() {
            self.selected = (self.selected + 1).min(self.results.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_page_down(&mut self) {
        if !self.results.is_empty() {
            self.selected = (self.selected + PAGE).min(self.results.len() - 1);
        }
    }

    pub fn select_page_up(&mut self) {
        self.selected = self.selected.saturating_sub(PAGE);
    }

    /// Jump to first result
    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    /// Jump to last result
    pub fn select_last(&mut self) {
        self.selected = self.results.len().saturating_sub(1);
    }

    pub fn show_help(&mut self) {
        self.mode = Mode::Help;
    }

    pub fn hide_help(&mut self) {
        self.mode = Mode::Results;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::testing::ScriptedEngine;
    use std::time::Duration;

    fn entry(name: &str) -> FoundEntry {
        FoundEntry {
            path: name.into(),
            is_dir: false,
            size: 1,
            modified: None,
        }
    }

    fn files(n: u64) -> SearchStatistics {
        SearchStatistics {
            files_enumerated: n,
            ..Default::default()
        }
    }

    fn app() -> (App, Arc<ScriptedEngine>) {
        let engine = ScriptedEngine::new();
        let app = App::start(
            Arc::clone(&engine) as Arc<dyn SearchEngine>,
            SearchParameters::new("/data", "needle"),
        )
        .unwrap();
        (app, engine)
    }

    #[test]
    fn test_header_names_string_and_location() {
        let (app, _) = app();
        let expected = format!(
            "Results for \"needle\" in \"/data{}*\"",
            std::path::MAIN_SEPARATOR
        );
        assert_eq!(app.header, expected);
    }

    #[test]
    fn test_events_fill_the_window() {
        let (mut app, engine) = app();
        let callbacks = engine.last_callbacks();

        callbacks.found_path(entry("a.txt"));
        callbacks.progress(&files(3), f64::NAN);
        app.poll_events();
        assert_eq!(app.results.len(), 1);
        assert_eq!(app.stats, files(3));
        assert_eq!(app.fraction, None);

        // The applied update was dropped, so the next one gets through
        callbacks.progress(&files(4), 0.25);
        app.poll_events();
        assert_eq!(app.fraction, Some(0.25));

        callbacks.done(&files(5));
        app.poll_events();
        assert_eq!(app.status, SearchStatus::Completed);
        assert_eq!(app.stats, files(5));
        assert_eq!(app.fraction, Some(1.0));
        assert!(engine.wait_released(1, Duration::from_secs(5)));
    }

    #[test]
    fn test_failure_is_shown() {
        let (mut app, engine) = app();
        engine.last_callbacks().error("permission denied");
        app.poll_events();

        assert_eq!(
            app.status,
            SearchStatus::Failed("permission denied".to_string())
        );
        assert_eq!(app.status_line(), "Search failed: permission denied");
    }

    #[test]
    fn test_cancel_keeps_window_and_releases_once() {
        let (mut app, engine) = app();
        app.cancel();
        app.cancel();
        assert_eq!(app.status, SearchStatus::Cancelled);

        engine.last_callbacks().found_path(entry("late.txt"));
        app.poll_events();
        assert!(app.results.is_empty());

        for task in app.close() {
            task.wait();
        }
        assert_eq!(engine.release_count(1), 1);
    }

    #[test]
    fn test_close_while_running_releases() {
        let (app, engine) = app();
        for task in app.close() {
            task.wait();
        }
        assert_eq!(engine.release_count(1), 1);
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let (mut app, engine) = app();
        let callbacks = engine.last_callbacks();
        for i in 0..15 {
            callbacks.found_path(entry(&format!("{}.txt", i)));
        }
        app.poll_events();

        app.select_prev();
        assert_eq!(app.selected, 0);
        app.select_page_down();
        assert_eq!(app.selected, 10);
        app.select_page_down();
        assert_eq!(app.selected, 14);
        app.select_next();
        assert_eq!(app.selected, 14);
        app.select_first();
        assert_eq!(app.selected_entry().map(|e| e.path.clone()), Some("0.txt".into()));
        app.select_last();
        assert_eq!(app.selected, 14);
    }
}
