//! # FSS - File System Search
//!
//! FSS searches a directory tree for files and directories by name, path or
//! contents (UTF-8 and UTF-16) and streams matches as they are found.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`engine`] - Engine boundary (`SearchEngine`, callbacks, flags) and the
//!   portable [`WalkEngine`](engine::WalkEngine)
//! - [`search`] - Search lifecycle: validation, statistics, progress
//!   throttling and exactly-once teardown
//! - [`tui`] - Interactive results window
//! - [`output`] - Streaming printer and statistics summary
//! - [`utils`] - Configuration, byte units, progress spinner
//!
//! ## Quick Start
//!
//! ```no_run
//! use fss::engine::WalkEngine;
//! use fss::search::{SearchEvent, SearchOrchestrator, SearchParameters};
//! use std::sync::{mpsc, Arc};
//!
//! let orchestrator = SearchOrchestrator::new(Arc::new(WalkEngine::default()));
//! let (tx, rx) = mpsc::channel();
//! orchestrator
//!     .submit(SearchParameters::new("/path/to/dir", "needle"), Arc::new(tx))
//!     .unwrap();
//!
//! for event in rx {
//!     match event {
//!         SearchEvent::FoundItem(entry) => println!("{}", entry.path.display()),
//!         SearchEvent::ProgressChanged(_) => {}
//!         SearchEvent::Completed(stats) => {
//!             println!("{} results", stats.results_found);
//!             break;
//!         }
//!         SearchEvent::Failed(message) => {
//!             eprintln!("{}", message);
//!             break;
//!         }
//!     }
//! }
//! ```

pub mod engine;
pub mod output;
pub mod search;
#[cfg(feature = "interactive")]
pub mod tui;
pub mod utils;
