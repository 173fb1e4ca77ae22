//! Hot-path benchmarks for the callback side of a search.
//!
//! Run with: `cargo bench`
//! Save baseline: `cargo bench -- --save-baseline main`
//! Compare: `cargo bench -- --baseline main`

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use fss::engine::WalkEngine;
use fss::search::{
    ProgressThrottle, SearchEvent, SearchOrchestrator, SearchParameters, SearchStatistics,
    StatsBox,
};
use std::fs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, mpsc};

fn stats(n: u64) -> SearchStatistics {
    SearchStatistics {
        files_enumerated: n,
        total_file_size: n * 4096,
        ..Default::default()
    }
}

fn bench_stats_box(c: &mut Criterion) {
    let mut group = c.benchmark_group("stats_box");
    let cell = StatsBox::new();

    group.bench_function("publish", |b| {
        let mut n = 0;
        b.iter(|| {
            n += 1;
            cell.publish(black_box(stats(n)));
        })
    });

    group.bench_function("read", |b| b.iter(|| black_box(cell.read())));
    group.finish();
}

fn bench_throttle(c: &mut Criterion) {
    let mut group = c.benchmark_group("throttle");

    let delivered = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&delivered);
    let sync = ProgressThrottle::new(move |_, _| {
        counter.fetch_add(1, Ordering::Relaxed);
    });
    group.bench_function("report_delivered", |b| {
        b.iter(|| sync.report(black_box(0.5)))
    });

    // Consumer never applies the update, so every report is dropped
    let (tx, _rx) = mpsc::channel();
    let parked = ProgressThrottle::new(move |fraction, token| {
        let _ = tx.send((fraction, token));
    });
    parked.report(0.0);
    group.bench_function("report_dropped", |b| {
        b.iter(|| parked.report(black_box(0.5)))
    });

    group.finish();
}

fn bench_small_tree(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for i in 0..20 {
        let sub = dir.path().join(format!("dir{}", i));
        fs::create_dir_all(&sub).expect("Failed to create dir");
        for j in 0..50 {
            fs::write(sub.join(format!("file{}.txt", j)), "lorem ipsum dolor sit amet")
                .expect("Failed to write file");
        }
    }

    let orchestrator = SearchOrchestrator::new(Arc::new(WalkEngine::default()));
    let mut group = c.benchmark_group("walk");
    group.sample_size(20);

    group.bench_function("contents_1000_files", |b| {
        b.iter(|| {
            let mut params = SearchParameters::new(dir.path(), "amet");
            params.search_in_file_contents = true;
            params.contents_as_utf8 = true;

            let (tx, rx) = mpsc::channel();
            let job = orchestrator
                .submit(params, Arc::new(tx))
                .expect("Failed to start search");
            for event in rx.iter() {
                if let SearchEvent::Completed(_) | SearchEvent::Failed(_) = event {
                    break;
                }
            }
            job.wait_disposed(std::time::Duration::from_secs(10));
        })
    });

    group.finish();
}

criterion_group!(benches, bench_stats_box, bench_throttle, bench_small_tree);
criterion_main!(benches);
