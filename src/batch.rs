//! Bounded batch fan-out of date resolutions
//!
//! Each resolution spawns up to three short-lived tool processes, so the
//! work is latency bound rather than CPU bound. Files are resolved in
//! fixed-size batches on a dedicated Rayon pool: a batch is issued at once,
//! and the next batch only starts after the whole batch has finished. At most
//! `batch_size` resolutions are in flight at any time.

use crate::error::Result;
use crate::progress::ProgressSink;
use crate::time::{MetadataTool, ResolvedDate, resolve_date};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{Level, debug, span};

/// Batch size used when none is configured
pub const DEFAULT_BATCH_SIZE: usize = 128;

/// Resolves dates for many files, preserving input order
pub struct BatchScheduler {
    pool: ThreadPool,
    batch_size: usize,
}

impl BatchScheduler {
    /// Create a scheduler
    ///
    /// `threads == 0` gives one worker per batch slot; otherwise the worker
    /// count is capped at `batch_size`.
    pub fn new(batch_size: usize, threads: usize) -> Result<Self> {
        let batch_size = batch_size.max(1);
        let workers = if threads == 0 {
            batch_size
        } else {
            threads.min(batch_size)
        };

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("resolver-{}", i))
            .build()?;

        Ok(Self { pool, batch_size })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Resolve every path; `result[i]` belongs to `paths[i]`
    ///
    /// The first failing batch stops the run. Resolutions of that batch that
    /// were already issued still run to completion.
    pub fn resolve_all(
        &self,
        tool: &dyn MetadataTool,
        paths: &[PathBuf],
        progress: &dyn ProgressSink,
    ) -> Result<Vec<ResolvedDate>> {
        let total = paths.len();
        let completed = AtomicUsize::new(0);
        let mut dates = Vec::with_capacity(total);

        for (index, batch) in paths.chunks(self.batch_size).enumerate() {
            let _span = span!(Level::DEBUG, "batch", index, len = batch.len()).entered();

            let resolved: Vec<Result<ResolvedDate>> = self.pool.install(|| {
                batch
                    .par_iter()
                    .with_max_len(1)
                    .map(|path| {
                        let date = resolve_date(tool, path);
                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        progress.on_resolved(done, total, path);
                        date
                    })
                    .collect()
            });

            for date in resolved {
                dates.push(date?);
            }
            debug!(resolved = dates.len(), total, "Batch complete");
        }

        progress.finish();
        Ok(dates)
    }
}
