//! Portable engine: directory walk with `ignore`, content scans over
//! memory-mapped files in a rayon pool.
//!
//! Each operation runs on its own `fss-search-<id>` thread in two phases:
//!
//! 1. Enumerate the tree, matching names and paths as entries go by. The
//!    amount of work is unknown here, so progress carries a NaN fraction.
//! 2. Scan the contents of candidate files in parallel. Progress is the share
//!    of candidate bytes already scanned.
//!
//! A released operation stops at the next entry or file and never reports
//! `done` or `error`.

use crate::engine::{
    EngineCallbacks, EngineError, EngineRequest, OperationHandle, SearchEngine, SearchFlags,
};
use crate::search::types::{FoundEntry, SearchStatistics};
use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use memchr::memmem;
use memmap2::Mmap;
use rayon::prelude::*;
use regex::bytes::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::fs::{self, File};
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, UNIX_EPOCH};

/// Minimum spacing between progress reports of one operation
const PROGRESS_INTERVAL: Duration = Duration::from_millis(50);

struct Operation {
    cancel: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

pub struct WalkEngine {
    /// Content scan threads per operation (0 = one per CPU)
    threads: usize,
    next_id: AtomicU64,
    operations: Mutex<HashMap<u64, Operation>>,
}

impl WalkEngine {
    pub fn new(threads: usize) -> Self {
        Self {
            threads,
            next_id: AtomicU64::new(0),
            operations: Mutex::new(HashMap::new()),
        }
    }

    /// Number of operations submitted and not yet released
    pub fn live_operations(&self) -> usize {
        self.lock_operations().len()
    }

    fn lock_operations(&self) -> MutexGuard<'_, HashMap<u64, Operation>> {
        self.operations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for WalkEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SearchEngine for WalkEngine {
    fn submit(
        &self,
        request: EngineRequest,
        callbacks: Arc<dyn EngineCallbacks>,
    ) -> Result<OperationHandle, EngineError> {
        if !request.path.is_dir() {
            return Err(EngineError::Rejected(format!(
                "not a directory: {}",
                request.path.display()
            )));
        }
        let matcher = Matcher::new(&request)?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = NonZeroU64::new(id)
            .map(OperationHandle::new)
            .ok_or_else(|| EngineError::Rejected("operation ids exhausted".to_string()))?;

        let cancel = Arc::new(AtomicBool::new(false));
        let search = Search {
            root: request.path,
            matcher,
            max_file_size: request.max_file_size,
            threads: self.threads,
            cancel: Arc::clone(&cancel),
            callbacks,
        };

        let thread = thread::Builder::new()
            .name(format!("fss-search-{}", id))
            .spawn(move || search.run())
            .map_err(|e| EngineError::Rejected(format!("failed to spawn search thread: {}", e)))?;

        log::debug!("operation {} started", id);
        self.lock_operations().insert(id, Operation { cancel, thread });
        Ok(handle)
    }

    fn release(&self, handle: OperationHandle) -> Result<(), EngineError> {
        let operation = self
            .lock_operations()
            .remove(&handle.raw())
            .ok_or(EngineError::UnknownOperation(handle.raw()))?;

        operation.cancel.store(true, Ordering::SeqCst);

        // Released from inside one of its own callbacks: the thread is about
        // to return on its own
        if operation.thread.thread().id() == thread::current().id() {
            return Ok(());
        }

        operation
            .thread
            .join()
            .map_err(|_| EngineError::Release(format!("search thread {} panicked", handle.raw())))?;
        log::debug!("operation {} released", handle.raw());
        Ok(())
    }
}

impl Drop for WalkEngine {
    fn drop(&mut self) {
        for operation in self.lock_operations().values() {
            operation.cancel.store(true, Ordering::SeqCst);
        }
    }
}

/// Content needle in one encoding
enum ContentPattern {
    Exact(memmem::Finder<'static>),
    Folded(Regex),
}

impl ContentPattern {
    fn is_match(&self, haystack: &[u8]) -> bool {
        match self {
            ContentPattern::Exact(finder) => finder.find(haystack).is_some(),
            ContentPattern::Folded(regex) => regex.is_match(haystack),
        }
    }
}

/// Compiled form of a request's matching rules
struct Matcher {
    flags: SearchFlags,
    glob: GlobMatcher,
    /// Lowercased when matching ignores case
    needle: String,
    utf8: Option<ContentPattern>,
    utf16: Option<ContentPattern>,
}

impl Matcher {
    fn new(request: &EngineRequest) -> Result<Self, EngineError> {
        let flags = request.flags;
        let ignore_case = flags.contains(SearchFlags::IGNORE_CASE);

        let glob = GlobBuilder::new(&request.pattern)
            .case_insensitive(ignore_case)
            .literal_separator(true)
            .build()
            .map_err(|e| EngineError::Rejected(format!("invalid pattern: {}", e)))?
            .compile_matcher();

        let contents = flags.contains(SearchFlags::SEARCH_FOR_FILES)
            && flags.contains(SearchFlags::SEARCH_IN_FILE_CONTENTS);

        let utf8 = if contents && flags.contains(SearchFlags::CONTENTS_AS_UTF8) {
            Some(utf8_pattern(&request.search_string, ignore_case)?)
        } else {
            None
        };
        let utf16 = if contents && flags.contains(SearchFlags::CONTENTS_AS_UTF16) {
            Some(utf16_pattern(&request.search_string, ignore_case)?)
        } else {
            None
        };

        let needle = if ignore_case {
            request.search_string.to_lowercase()
        } else {
            request.search_string.clone()
        };

        Ok(Self {
            flags,
            glob,
            needle,
            utf8,
            utf16,
        })
    }

    fn has(&self, flag: SearchFlags) -> bool {
        self.flags.contains(flag)
    }

    fn text_matches(&self, text: &str) -> bool {
        if self.has(SearchFlags::IGNORE_CASE) {
            text.to_lowercase().contains(&self.needle)
        } else {
            text.contains(&self.needle)
        }
    }

    fn name_matches(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.text_matches(&name.to_string_lossy()))
            .unwrap_or(false)
    }

    fn path_matches(&self, path: &Path) -> bool {
        self.text_matches(&path.to_string_lossy())
    }

    fn pattern_matches(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.glob.is_match(name))
            .unwrap_or(false)
    }

    fn directory_matches(&self, path: &Path) -> bool {
        self.has(SearchFlags::SEARCH_FOR_DIRECTORIES)
            && self.pattern_matches(path)
            && ((self.has(SearchFlags::SEARCH_IN_DIRECTORY_NAME) && self.name_matches(path))
                || (self.has(SearchFlags::SEARCH_IN_DIRECTORY_PATH) && self.path_matches(path)))
    }

    /// Name/path match of a file, before its contents are looked at
    fn file_matches(&self, path: &Path) -> bool {
        (self.has(SearchFlags::SEARCH_IN_FILE_NAME) && self.name_matches(path))
            || (self.has(SearchFlags::SEARCH_IN_FILE_PATH) && self.path_matches(path))
    }

    fn scans_contents(&self) -> bool {
        self.utf8.is_some() || self.utf16.is_some()
    }

    fn contents_match(&self, bytes: &[u8]) -> bool {
        self.utf8.as_ref().is_some_and(|p| p.is_match(bytes))
            || self.utf16.as_ref().is_some_and(|p| p.is_match(bytes))
    }
}

fn utf8_pattern(needle: &str, ignore_case: bool) -> Result<ContentPattern, EngineError> {
    if !ignore_case {
        return Ok(ContentPattern::Exact(
            memmem::Finder::new(needle.as_bytes()).into_owned(),
        ));
    }
    RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .unicode(false)
        .build()
        .map(ContentPattern::Folded)
        .map_err(|e| EngineError::Rejected(format!("invalid search string: {}", e)))
}

/// UTF-16LE needle; case folding covers ASCII letters only
fn utf16_pattern(needle: &str, ignore_case: bool) -> Result<ContentPattern, EngineError> {
    if !ignore_case {
        let bytes: Vec<u8> = needle.encode_utf16().flat_map(u16::to_le_bytes).collect();
        return Ok(ContentPattern::Exact(memmem::Finder::new(&bytes).into_owned()));
    }

    let mut pattern = String::from("(?s-u)");
    for unit in needle.encode_utf16() {
        let [lo, hi] = unit.to_le_bytes();
        if hi == 0 && lo.is_ascii_alphabetic() {
            pattern.push_str(&format!(
                "[\\x{:02X}\\x{:02X}]\\x00",
                lo.to_ascii_uppercase(),
                lo.to_ascii_lowercase()
            ));
        } else {
            pattern.push_str(&format!("\\x{:02X}\\x{:02X}", lo, hi));
        }
    }
    Regex::new(&pattern)
        .map(ContentPattern::Folded)
        .map_err(|e| EngineError::Rejected(format!("invalid search string: {}", e)))
}

fn found_entry(path: PathBuf, metadata: Option<&fs::Metadata>) -> FoundEntry {
    let is_dir = metadata.is_some_and(|m| m.is_dir());
    let size = metadata.filter(|m| !m.is_dir()).map(|m| m.len()).unwrap_or(0);
    let modified = metadata
        .and_then(|m| m.modified().ok())
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs());
    FoundEntry {
        path,
        is_dir,
        size,
        modified,
    }
}

/// A file whose contents still need to be scanned
struct Candidate {
    path: PathBuf,
    size: u64,
    metadata: fs::Metadata,
}

/// Counters of the content phase, shared by the scan threads
#[derive(Default)]
struct ScanCounters {
    searched: AtomicU64,
    scanned_bytes: AtomicU64,
    results: AtomicU64,
}

struct Search {
    root: PathBuf,
    matcher: Matcher,
    max_file_size: u64,
    threads: usize,
    cancel: Arc<AtomicBool>,
    callbacks: Arc<dyn EngineCallbacks>,
}

impl Search {
    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn run(self) {
        let started = Instant::now();
        let mut stats = SearchStatistics::default();

        let candidates = match self.enumerate(started, &mut stats) {
            Some(candidates) => candidates,
            None => return,
        };

        if !candidates.is_empty() && !self.scan(started, &mut stats, candidates) {
            return;
        }

        if self.cancelled() {
            return;
        }
        stats.search_time_secs = started.elapsed().as_secs_f64();
        self.callbacks.done(&stats);
    }

    /// Phase 1. Returns `None` when cancelled.
    fn enumerate(&self, started: Instant, stats: &mut SearchStatistics) -> Option<Vec<Candidate>> {
        let matcher = &self.matcher;
        let mut walker = WalkBuilder::new(&self.root);
        walker
            .standard_filters(false)
            .hidden(matcher.has(SearchFlags::SKIP_DOT_ENTRIES))
            .follow_links(false);
        if !matcher.has(SearchFlags::RECURSIVE) {
            walker.max_depth(Some(1));
        }

        let mut candidates = Vec::new();
        let mut last_report = Instant::now();

        for entry in walker.build() {
            if self.cancelled() {
                return None;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::debug!("skipping entry: {}", e);
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    log::trace!("no metadata for {}: {}", path.display(), e);
                    continue;
                }
            };

            if metadata.is_dir() {
                stats.directories_enumerated += 1;
                if matcher.directory_matches(path) {
                    stats.results_found += 1;
                    self.callbacks
                        .found_path(found_entry(path.to_path_buf(), Some(&metadata)));
                }
            } else if metadata.is_file() {
                let size = metadata.len();
                stats.files_enumerated += 1;
                stats.total_file_size += size;

                if matcher.has(SearchFlags::SEARCH_FOR_FILES) && matcher.pattern_matches(path) {
                    if matcher.file_matches(path) {
                        stats.results_found += 1;
                        self.callbacks
                            .found_path(found_entry(path.to_path_buf(), Some(&metadata)));
                    } else if matcher.scans_contents() && size > 0 && size <= self.max_file_size {
                        candidates.push(Candidate {
                            path: path.to_path_buf(),
                            size,
                            metadata,
                        });
                    }
                }
            }

            if last_report.elapsed() >= PROGRESS_INTERVAL {
                last_report = Instant::now();
                stats.search_time_secs = started.elapsed().as_secs_f64();
                self.callbacks.progress(stats, f64::NAN);
            }
        }

        Some(candidates)
    }

    /// Phase 2. Returns `false` when the operation ended early.
    fn scan(
        &self,
        started: Instant,
        stats: &mut SearchStatistics,
        candidates: Vec<Candidate>,
    ) -> bool {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("fss-scan-{}", i))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                self.callbacks
                    .error(&format!("failed to start content scan: {}", e));
                return false;
            }
        };

        let to_scan: u64 = candidates.iter().map(|c| c.size).sum();
        let base = *stats;
        let counters = ScanCounters::default();
        let last_report_ms = AtomicU64::new(0);

        let snapshot = |counters: &ScanCounters| SearchStatistics {
            file_contents_searched: base.file_contents_searched
                + counters.searched.load(Ordering::Relaxed),
            scanned_file_size: base.scanned_file_size
                + counters.scanned_bytes.load(Ordering::Relaxed),
            results_found: base.results_found + counters.results.load(Ordering::Relaxed),
            search_time_secs: started.elapsed().as_secs_f64(),
            ..base
        };

        pool.install(|| {
            candidates.par_iter().for_each(|candidate| {
                if self.cancelled() {
                    return;
                }

                if self.scan_file(candidate) {
                    counters.results.fetch_add(1, Ordering::Relaxed);
                    self.callbacks.found_path(found_entry(
                        candidate.path.clone(),
                        Some(&candidate.metadata),
                    ));
                }
                counters.searched.fetch_add(1, Ordering::Relaxed);
                let scanned =
                    counters.scanned_bytes.fetch_add(candidate.size, Ordering::Relaxed)
                        + candidate.size;

                // One thread per interval gets to report
                let now_ms = started.elapsed().as_millis() as u64;
                let last = last_report_ms.load(Ordering::Relaxed);
                if now_ms.saturating_sub(last) >= PROGRESS_INTERVAL.as_millis() as u64
                    && last_report_ms
                        .compare_exchange(last, now_ms, Ordering::Relaxed, Ordering::Relaxed)
                        .is_ok()
                {
                    let fraction = scanned as f64 / to_scan as f64;
                    self.callbacks.progress(&snapshot(&counters), fraction.min(1.0));
                }
            });
        });

        *stats = snapshot(&counters);
        true
    }

    fn scan_file(&self, candidate: &Candidate) -> bool {
        let file = match File::open(&candidate.path) {
            Ok(file) => file,
            Err(e) => {
                log::debug!("cannot open {}: {}", candidate.path.display(), e);
                return false;
            }
        };
        // SAFETY: read-only mapping; a file truncated underneath us is the
        // same hazard every mmap-based scanner accepts
        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(e) => {
                log::debug!("cannot map {}: {}", candidate.path.display(), e);
                return false;
            }
        };
        self.matcher.contents_match(&mmap)
    }
}
