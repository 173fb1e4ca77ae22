//! Single-slot holder for the latest statistics snapshot.
//!
//! The engine publishes from its own threads and must never wait on the UI.
//! `AtomicCell` gives a whole-value store and optimistic reads, so a reader
//! never observes a mix of two snapshots and never holds anything the
//! publisher has to wait for.

use crate::search::types::SearchStatistics;
use crossbeam_utils::atomic::AtomicCell;

#[derive(Debug, Default)]
pub struct StatsBox {
    latest: AtomicCell<SearchStatistics>,
}

impl StatsBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held snapshot
    pub fn publish(&self, snapshot: SearchStatistics) {
        self.latest.store(snapshot);
    }

    /// Latest published snapshot, or all zeroes before the first publish
    pub fn read(&self) -> SearchStatistics {
        self.latest.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    fn uniform(n: u64) -> SearchStatistics {
        SearchStatistics {
            directories_enumerated: n,
            files_enumerated: n,
            file_contents_searched: n,
            results_found: n,
            total_file_size: n,
            scanned_file_size: n,
            search_time_secs: n as f64,
        }
    }

    fn is_uniform(stats: &SearchStatistics) -> bool {
        let n = stats.directories_enumerated;
        stats.files_enumerated == n
            && stats.file_contents_searched == n
            && stats.results_found == n
            && stats.total_file_size == n
            && stats.scanned_file_size == n
            && stats.search_time_secs == n as f64
    }

    #[test]
    fn test_read_before_publish_is_zero() {
        let stats = StatsBox::new();
        assert_eq!(stats.read(), SearchStatistics::default());
    }

    #[test]
    fn test_publish_replaces_whole_value() {
        let stats = StatsBox::new();
        stats.publish(uniform(3));
        stats.publish(SearchStatistics {
            files_enumerated: 7,
            ..Default::default()
        });

        let read = stats.read();
        assert_eq!(read.files_enumerated, 7);
        assert_eq!(read.directories_enumerated, 0);
    }

    #[test]
    fn test_concurrent_reads_never_tear() {
        let stats = Arc::new(StatsBox::new());
        let stop = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let stats = Arc::clone(&stats);
                let stop = Arc::clone(&stop);
                thread::spawn(move || {
                    let mut reads = 0u64;
                    loop {
                        let snapshot = stats.read();
                        assert!(is_uniform(&snapshot), "torn read: {:?}", snapshot);
                        reads += 1;
                        if stop.load(Ordering::Relaxed) {
                            break reads;
                        }
                    }
                })
            })
            .collect();

        for n in 0..50_000 {
            stats.publish(uniform(n));
        }
        stop.store(true, Ordering::Relaxed);

        for reader in readers {
            assert!(reader.join().unwrap() > 0);
        }
        assert_eq!(stats.read(), uniform(49_999));
    }
}
