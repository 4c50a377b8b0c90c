//! Parallel decomposition of partitions.
//!
//! Partitions are independent, so their decompositions can run on a rayon pool. This module
//! provides:
//!
//! - [`ExecutionEngine::decompose_all`], which keeps partition order in its output
//! - real-time metrics + observer hooks for monitoring

mod observer;

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{ProcessingError, ProcessingResult};
use crate::processing::{decompose, AttributeTable, Partition};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, LogExecutionObserver,
};

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
}

/// Runs decomposition across partitions on a dedicated thread pool.
pub struct ExecutionEngine {
    pool: ThreadPool,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// # Errors
    ///
    /// [`ProcessingError::InvalidConfig`] if `num_threads == Some(0)` or the pool cannot be built.
    pub fn new(opts: ExecutionOptions) -> ProcessingResult<Self> {
        if opts.num_threads == Some(0) {
            return Err(ProcessingError::InvalidConfig {
                message: "num_threads must be > 0 when set".to_string(),
            });
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .map_err(|e| ProcessingError::InvalidConfig {
                message: format!("failed to build thread pool: {e}"),
            })?;

        Ok(Self {
            pool,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Decompose every partition in parallel.
    ///
    /// Tables are returned grouped by partition, in input partition order, exactly as a
    /// sequential `partitions.iter().map(decompose)` would produce them. The first error aborts
    /// the run.
    pub fn decompose_all(&self, partitions: &[Partition]) -> ProcessingResult<Vec<AttributeTable>> {
        self.pool.install(|| self.decompose_all_impl(partitions))
    }

    fn decompose_all_impl(&self, partitions: &[Partition]) -> ProcessingResult<Vec<AttributeTable>> {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted {
            partitions: partitions.len(),
        });

        let per_partition: ProcessingResult<Vec<Vec<AttributeTable>>> = partitions
            .par_iter()
            .map(|p| -> ProcessingResult<Vec<AttributeTable>> {
                self.metrics.on_partition_start();
                self.emit(ExecutionEvent::PartitionStarted {
                    name: p.name.clone(),
                    rows: p.dataset.row_count(),
                });

                let tables = decompose(p)?;

                self.metrics.on_partition_end(tables.len(), tables.len() * p.dataset.row_count());
                self.emit(ExecutionEvent::PartitionFinished {
                    name: p.name.clone(),
                    tables: tables.len(),
                });
                Ok(tables)
            })
            .collect();

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });

        Ok(per_partition?.into_iter().flatten().collect())
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::{ExecutionEngine, ExecutionOptions};
    use crate::execution::{ExecutionEvent, ExecutionObserver};
    use crate::processing::{decompose, partition, PartitionOptions};
    use crate::types::{DataSet, Schema, Value};

    fn many_classes(classes: usize, students_per_class: usize) -> DataSet {
        let schema = Schema::from_names(["Name", "Class", "Math", "English", "Biology"]);
        let mut rows = Vec::new();
        for s in 0..students_per_class {
            for c in 0..classes {
                rows.push(vec![
                    Value::Utf8(format!("student-{c}-{s}")),
                    Value::Utf8(format!("JSS{c}")),
                    Value::Int64((s * 3 % 100) as i64),
                    Value::Int64((s * 7 % 100) as i64),
                    Value::Null,
                ]);
            }
        }
        DataSet::new(schema, rows)
    }

    #[test]
    fn parallel_output_matches_sequential() {
        let parts = partition(&many_classes(12, 25), &PartitionOptions::default()).unwrap();
        let engine = ExecutionEngine::new(ExecutionOptions { num_threads: Some(4) }).unwrap();

        let parallel = engine.decompose_all(&parts).unwrap();
        let sequential: Vec<_> = parts.iter().flat_map(|p| decompose(p).unwrap()).collect();

        assert_eq!(parallel, sequential);
        assert_eq!(parallel.len(), 12 * 4);
    }

    #[test]
    fn metrics_are_available_after_run() {
        let parts = partition(&many_classes(5, 10), &PartitionOptions::default()).unwrap();
        let engine = ExecutionEngine::new(ExecutionOptions { num_threads: Some(2) }).unwrap();
        let metrics = engine.metrics();

        engine.decompose_all(&parts).unwrap();

        let snap = metrics.snapshot();
        assert_eq!(snap.partitions_started, 5);
        assert_eq!(snap.partitions_finished, 5);
        assert_eq!(snap.tables_emitted, 20);
        assert_eq!(snap.rows_emitted, 20 * 10);
        assert!(snap.max_active_partitions >= 1);
        assert!(snap.elapsed.is_some());
    }

    #[derive(Default)]
    struct CountingObserver {
        finished: AtomicUsize,
        runs: AtomicUsize,
    }

    impl ExecutionObserver for CountingObserver {
        fn on_event(&self, event: &ExecutionEvent) {
            match event {
                ExecutionEvent::PartitionFinished { .. } => {
                    let _ = self.finished.fetch_add(1, Ordering::SeqCst);
                }
                ExecutionEvent::RunFinished { .. } => {
                    let _ = self.runs.fetch_add(1, Ordering::SeqCst);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn observer_sees_every_partition() {
        let parts = partition(&many_classes(7, 3), &PartitionOptions::default()).unwrap();
        let observer = Arc::new(CountingObserver::default());
        let obs_trait: Arc<dyn ExecutionObserver> = observer.clone();
        let engine = ExecutionEngine::new(ExecutionOptions { num_threads: Some(3) })
            .unwrap()
            .with_observer(obs_trait);

        engine.decompose_all(&parts).unwrap();

        assert_eq!(observer.finished.load(Ordering::SeqCst), 7);
        assert_eq!(observer.runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_threads_is_rejected() {
        assert!(ExecutionEngine::new(ExecutionOptions { num_threads: Some(0) }).is_err());
    }
}
