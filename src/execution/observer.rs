use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Execution events emitted by the engine.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted { partitions: usize },
    PartitionStarted { name: String, rows: usize },
    PartitionFinished { name: String, tables: usize },
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Logs execution events at debug level (run summaries at info).
#[derive(Default)]
pub struct LogExecutionObserver;

impl ExecutionObserver for LogExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::RunFinished { metrics, .. } => log::info!("decomposition finished: {metrics}"),
            other => log::debug!("{other:?}"),
        }
    }
}

/// Real-time metrics for an execution run.
///
/// The engine updates these counters during execution; callers can snapshot them at any time.
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    partitions_started: AtomicU64,
    partitions_finished: AtomicU64,
    tables_emitted: AtomicU64,
    rows_emitted: AtomicU64,

    active_partitions: AtomicUsize,
    max_active_partitions: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            partitions_started: AtomicU64::new(0),
            partitions_finished: AtomicU64::new(0),
            tables_emitted: AtomicU64::new(0),
            rows_emitted: AtomicU64::new(0),
            active_partitions: AtomicUsize::new(0),
            max_active_partitions: AtomicUsize::new(0),
        }
    }

    pub fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);

        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.partitions_started.store(0, Ordering::SeqCst);
        self.partitions_finished.store(0, Ordering::SeqCst);
        self.tables_emitted.store(0, Ordering::SeqCst);
        self.rows_emitted.store(0, Ordering::SeqCst);
        self.active_partitions.store(0, Ordering::SeqCst);
        self.max_active_partitions.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        // Keep a non-zero value so snapshots can tell a finished run from an unstarted one.
        let ns = elapsed.as_nanos().clamp(1, u64::MAX as u128) as u64;
        self.elapsed_ns.store(ns, Ordering::SeqCst);
    }

    pub fn on_partition_start(&self) {
        let _ = self.partitions_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_partitions.fetch_add(1, Ordering::SeqCst) + 1;
        update_max_usize(&self.max_active_partitions, now);
    }

    pub fn on_partition_end(&self, tables: usize, rows: usize) {
        let _ = self.partitions_finished.fetch_add(1, Ordering::SeqCst);
        let _ = self.tables_emitted.fetch_add(tables as u64, Ordering::SeqCst);
        let _ = self.rows_emitted.fetch_add(rows as u64, Ordering::SeqCst);
        let _ = self.active_partitions.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        let elapsed = if elapsed_ns > 0 {
            Some(Duration::from_nanos(elapsed_ns))
        } else {
            None
        };

        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed,
            partitions_started: self.partitions_started.load(Ordering::SeqCst),
            partitions_finished: self.partitions_finished.load(Ordering::SeqCst),
            tables_emitted: self.tables_emitted.load(Ordering::SeqCst),
            rows_emitted: self.rows_emitted.load(Ordering::SeqCst),
            max_active_partitions: self.max_active_partitions.load(Ordering::SeqCst),
        }
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn update_max_usize(dst: &AtomicUsize, now: usize) {
    loop {
        let cur = dst.load(Ordering::SeqCst);
        if now <= cur {
            break;
        }
        if dst
            .compare_exchange(cur, now, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            break;
        }
    }
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub partitions_started: u64,
    pub partitions_finished: u64,
    pub tables_emitted: u64,
    pub rows_emitted: u64,
    pub max_active_partitions: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, partitions={}/{}, tables={}, rows={}, max_active_partitions={}, elapsed={:?}",
            self.run_id,
            self.partitions_finished,
            self.partitions_started,
            self.tables_emitted,
            self.rows_emitted,
            self.max_active_partitions,
            self.elapsed
        )
    }
}
