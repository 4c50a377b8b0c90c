//! Observer hooks for pipeline stages.
//!
//! Every stage (ingest, partition, decompose, write, package) reports its outcome to an optional
//! [`PipelineObserver`]. Implementations here log to stderr, append to a file, forward to the
//! [`log`] facade, or fan out to several observers.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{ErrorKind, ProcessingError};

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

impl Severity {
    /// Severity for a failed stage.
    pub fn for_error(error: &ProcessingError) -> Self {
        match error.kind() {
            ErrorKind::Io => Severity::Critical,
            ErrorKind::Schema | ErrorKind::EmptyInput | ErrorKind::NameCollision | ErrorKind::Config => {
                Severity::Error
            }
        }
    }
}

/// Pipeline stage an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Partition,
    Decompose,
    Write,
    Package,
}

/// Context about a stage execution.
#[derive(Debug, Clone)]
pub struct StageContext {
    /// Stage being reported.
    pub stage: Stage,
    /// What the stage worked on: an input path, a base name, an output directory.
    pub subject: String,
}

impl StageContext {
    pub fn new(stage: Stage, subject: impl Into<String>) -> Self {
        Self {
            stage,
            subject: subject.into(),
        }
    }
}

/// Minimal stats reported on stage success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageStats {
    /// Number of tables (or files) produced by the stage.
    pub outputs: usize,
    /// Total rows across those outputs (or rows read, for ingestion).
    pub rows: usize,
}

/// Observer interface for pipeline outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait PipelineObserver: Send + Sync {
    /// Called when a stage succeeds.
    fn on_success(&self, _ctx: &StageContext, _stats: StageStats) {}

    /// Called for non-fatal conditions, such as two classes merged or overwritten because their
    /// names collide.
    fn on_warning(&self, _ctx: &StageContext, _message: &str) {}

    /// Called when a stage fails.
    fn on_failure(&self, _ctx: &StageContext, _severity: Severity, _error: &ProcessingError) {}

    /// Called when a failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &StageContext, severity: Severity, error: &ProcessingError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Reports a stage result to an optional observer, alerting when the severity is at or above
/// `alert_at_or_above`.
pub(crate) fn report<T>(
    observer: Option<&Arc<dyn PipelineObserver>>,
    alert_at_or_above: Severity,
    ctx: &StageContext,
    result: &Result<T, ProcessingError>,
    stats: impl FnOnce(&T) -> StageStats,
) {
    let Some(obs) = observer else {
        return;
    };
    match result {
        Ok(v) => obs.on_success(ctx, stats(v)),
        Err(e) => {
            let sev = Severity::for_error(e);
            obs.on_failure(ctx, sev, e);
            if sev >= alert_at_or_above {
                obs.on_alert(ctx, sev, e);
            }
        }
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_success(&self, ctx: &StageContext, stats: StageStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_warning(&self, ctx: &StageContext, message: &str) {
        for o in &self.observers {
            o.on_warning(ctx, message);
        }
    }

    fn on_failure(&self, ctx: &StageContext, severity: Severity, error: &ProcessingError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &StageContext, severity: Severity, error: &ProcessingError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs pipeline events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl PipelineObserver for StdErrObserver {
    fn on_success(&self, ctx: &StageContext, stats: StageStats) {
        eprintln!(
            "[{:?}][ok] subject={} outputs={} rows={}",
            ctx.stage, ctx.subject, stats.outputs, stats.rows
        );
    }

    fn on_warning(&self, ctx: &StageContext, message: &str) {
        eprintln!("[{:?}][warn] subject={} {}", ctx.stage, ctx.subject, message);
    }

    fn on_failure(&self, ctx: &StageContext, severity: Severity, error: &ProcessingError) {
        eprintln!(
            "[{:?}][{:?}] subject={} err={}",
            ctx.stage, severity, ctx.subject, error
        );
    }

    fn on_alert(&self, ctx: &StageContext, severity: Severity, error: &ProcessingError) {
        eprintln!(
            "[ALERT][{:?}][{:?}] subject={} err={}",
            ctx.stage, severity, ctx.subject, error
        );
    }
}

/// Forwards pipeline events to the [`log`] facade (target `class_data_processor`).
#[derive(Debug, Default)]
pub struct LogObserver;

impl PipelineObserver for LogObserver {
    fn on_success(&self, ctx: &StageContext, stats: StageStats) {
        log::info!(
            "{:?} ok: subject={} outputs={} rows={}",
            ctx.stage,
            ctx.subject,
            stats.outputs,
            stats.rows
        );
    }

    fn on_warning(&self, ctx: &StageContext, message: &str) {
        log::warn!("{:?}: subject={} {}", ctx.stage, ctx.subject, message);
    }

    fn on_failure(&self, ctx: &StageContext, severity: Severity, error: &ProcessingError) {
        log::error!(
            "{:?} failed ({:?}): subject={} err={}",
            ctx.stage,
            severity,
            ctx.subject,
            error
        );
    }

    fn on_alert(&self, ctx: &StageContext, severity: Severity, error: &ProcessingError) {
        log::error!(
            "ALERT {:?} ({:?}): subject={} err={}",
            ctx.stage,
            severity,
            ctx.subject,
            error
        );
    }
}

/// Appends pipeline events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl PipelineObserver for FileObserver {
    fn on_success(&self, ctx: &StageContext, stats: StageStats) {
        self.append_line(&format!(
            "{} ok stage={:?} subject={} outputs={} rows={}",
            unix_ts(),
            ctx.stage,
            ctx.subject,
            stats.outputs,
            stats.rows
        ));
    }

    fn on_warning(&self, ctx: &StageContext, message: &str) {
        self.append_line(&format!(
            "{} warn stage={:?} subject={} msg={}",
            unix_ts(),
            ctx.stage,
            ctx.subject,
            message
        ));
    }

    fn on_failure(&self, ctx: &StageContext, severity: Severity, error: &ProcessingError) {
        self.append_line(&format!(
            "{} fail severity={:?} stage={:?} subject={} err={}",
            unix_ts(),
            severity,
            ctx.stage,
            ctx.subject,
            error
        ));
    }

    fn on_alert(&self, ctx: &StageContext, severity: Severity, error: &ProcessingError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} stage={:?} subject={} err={}",
            unix_ts(),
            severity,
            ctx.stage,
            ctx.subject,
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{report, PipelineObserver, Severity, Stage, StageContext, StageStats};
    use crate::error::ProcessingError;

    #[derive(Default)]
    struct Recording {
        successes: Mutex<Vec<StageStats>>,
        failures: Mutex<Vec<Severity>>,
        alerts: Mutex<Vec<Severity>>,
    }

    impl PipelineObserver for Recording {
        fn on_success(&self, _ctx: &StageContext, stats: StageStats) {
            self.successes.lock().unwrap().push(stats);
        }
        fn on_failure(&self, _ctx: &StageContext, severity: Severity, _error: &ProcessingError) {
            self.failures.lock().unwrap().push(severity);
        }
        fn on_alert(&self, _ctx: &StageContext, severity: Severity, _error: &ProcessingError) {
            self.alerts.lock().unwrap().push(severity);
        }
    }

    #[test]
    fn io_failures_are_critical_and_alert() {
        let rec = Arc::new(Recording::default());
        let obs: Arc<dyn PipelineObserver> = rec.clone();
        let ctx = StageContext::new(Stage::Write, "out");
        let result: Result<(), _> = Err(ProcessingError::from(std::io::Error::other("boom")));

        report(Some(&obs), Severity::Critical, &ctx, &result, |_| StageStats::default());

        assert_eq!(*rec.failures.lock().unwrap(), vec![Severity::Critical]);
        assert_eq!(*rec.alerts.lock().unwrap(), vec![Severity::Critical]);
    }

    #[test]
    fn schema_failures_do_not_alert_at_critical_threshold() {
        let rec = Arc::new(Recording::default());
        let obs: Arc<dyn PipelineObserver> = rec.clone();
        let ctx = StageContext::new(Stage::Partition, "grades");
        let result: Result<(), _> = Err(ProcessingError::schema("missing required column 'Class'"));

        report(Some(&obs), Severity::Critical, &ctx, &result, |_| StageStats::default());

        assert_eq!(*rec.failures.lock().unwrap(), vec![Severity::Error]);
        assert!(rec.alerts.lock().unwrap().is_empty());
    }

    #[test]
    fn success_reports_stats() {
        let rec = Arc::new(Recording::default());
        let obs: Arc<dyn PipelineObserver> = rec.clone();
        let ctx = StageContext::new(Stage::Decompose, "grades");
        let result: Result<usize, ProcessingError> = Ok(4);

        report(Some(&obs), Severity::Critical, &ctx, &result, |n| StageStats {
            outputs: *n,
            rows: 10,
        });

        assert_eq!(
            *rec.successes.lock().unwrap(),
            vec![StageStats { outputs: 4, rows: 10 }]
        );
    }
}
