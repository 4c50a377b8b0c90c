use std::sync::{Arc, Mutex};

use class_data_processor::config::{CollisionPolicy, PipelineConfig};
use class_data_processor::ingestion::{ingest_from_path, IngestionFormat, IngestionOptions};
use class_data_processor::observability::{PipelineObserver, Severity, Stage, StageContext, StageStats};
use class_data_processor::pipeline::Pipeline;
use class_data_processor::ProcessingError;

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<(Stage, StageStats)>>,
    warnings: Mutex<Vec<(Stage, String)>>,
    failures: Mutex<Vec<(Stage, Severity)>>,
    alerts: Mutex<Vec<Severity>>,
}

impl PipelineObserver for RecordingObserver {
    fn on_success(&self, ctx: &StageContext, stats: StageStats) {
        self.successes.lock().unwrap().push((ctx.stage, stats));
    }

    fn on_warning(&self, ctx: &StageContext, message: &str) {
        self.warnings.lock().unwrap().push((ctx.stage, message.to_string()));
    }

    fn on_failure(&self, ctx: &StageContext, severity: Severity, _error: &ProcessingError) {
        self.failures.lock().unwrap().push((ctx.stage, severity));
    }

    fn on_alert(&self, _ctx: &StageContext, severity: Severity, _error: &ProcessingError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn options(obs: &Arc<RecordingObserver>) -> IngestionOptions {
    let observer: Arc<dyn PipelineObserver> = obs.clone();
    IngestionOptions {
        format: Some(IngestionFormat::Csv),
        observer: Some(observer),
        alert_at_or_above: Severity::Critical,
        ..Default::default()
    }
}

#[test]
fn observer_receives_failure_and_alert_on_critical_io_error() {
    let obs = Arc::new(RecordingObserver::default());

    // Missing file -> Io error -> Critical
    let _ = ingest_from_path("tests/fixtures/does_not_exist.csv", &options(&obs)).unwrap_err();

    let failures = obs.failures.lock().unwrap().clone();
    let alerts = obs.alerts.lock().unwrap().clone();
    assert_eq!(failures, vec![(Stage::Ingest, Severity::Critical)]);
    assert_eq!(alerts, vec![Severity::Critical]);
}

#[test]
fn observer_receives_failure_without_alert_for_schema_error() {
    let obs = Arc::new(RecordingObserver::default());
    let ds = ingest_from_path("tests/fixtures/students.csv", &options(&obs)).unwrap();

    let config = PipelineConfig {
        group_column: "Form".to_string(),
        ..PipelineConfig::default()
    };
    let observer: Arc<dyn PipelineObserver> = obs.clone();
    let _ = Pipeline::new(config).with_observer(observer).run(&ds).unwrap_err();

    let failures = obs.failures.lock().unwrap().clone();
    assert_eq!(failures, vec![(Stage::Partition, Severity::Error)]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn every_stage_reports_success_with_stats() {
    let obs = Arc::new(RecordingObserver::default());
    let ds = ingest_from_path("tests/fixtures/students.csv", &options(&obs)).unwrap();

    let observer: Arc<dyn PipelineObserver> = obs.clone();
    let pipeline = Pipeline::new(PipelineConfig::default().with_base_name("students")).with_observer(observer);
    let out = pipeline.run(&ds).unwrap();
    pipeline.package(&out).unwrap();

    let stages: Vec<Stage> = obs.successes.lock().unwrap().iter().map(|(s, _)| *s).collect();
    assert_eq!(
        stages,
        vec![Stage::Ingest, Stage::Partition, Stage::Decompose, Stage::Package]
    );

    let successes = obs.successes.lock().unwrap().clone();
    assert_eq!(successes[0].1, StageStats { outputs: 1, rows: 5 });
    // JSS1, JSS2, unnamed
    assert_eq!(successes[1].1, StageStats { outputs: 3, rows: 5 });
    // 5 non-key columns per partition
    assert_eq!(successes[2].1, StageStats { outputs: 15, rows: 25 });
}

#[test]
fn merged_class_names_are_reported_as_warnings() {
    let obs = Arc::new(RecordingObserver::default());
    let ds = ingest_from_path("tests/fixtures/students.csv", &options(&obs)).unwrap();

    let config = PipelineConfig {
        collision_policy: CollisionPolicy::Merge,
        ..PipelineConfig::default().with_base_name("students")
    };
    let observer: Arc<dyn PipelineObserver> = obs.clone();
    Pipeline::new(config).with_observer(observer).run(&ds).unwrap();

    let warnings = obs.warnings.lock().unwrap().clone();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].0, Stage::Partition);
    assert!(warnings[0].1.contains("'students_JSS1'"));
}
