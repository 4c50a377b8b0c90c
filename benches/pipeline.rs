use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use class_data_processor::config::{DropPreset, PipelineConfig};
use class_data_processor::execution::{ExecutionEngine, ExecutionOptions};
use class_data_processor::output::OutputFormat;
use class_data_processor::pipeline::{run_pipeline, Pipeline};
use class_data_processor::types::{DataSet, Schema, Value};

/// A 27-column score sheet: S/N, Class, 25 subject columns.
fn score_sheet(classes: usize, students_per_class: usize) -> DataSet {
    let mut headers = vec!["S/N".to_string(), "Class".to_string()];
    headers.extend((0..25).map(|i| format!("Subject {i}")));

    let mut rows = Vec::with_capacity(classes * students_per_class);
    for s in 0..students_per_class {
        for c in 0..classes {
            let mut row = vec![
                Value::Int64((s * classes + c) as i64),
                Value::Utf8(format!("JSS{c}\n")),
            ];
            row.extend((0..25).map(|i| Value::Float64(((s * 31 + i * 7) % 100) as f64)));
            rows.push(row);
        }
    }
    DataSet::new(Schema::from_names(headers), rows)
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let config = PipelineConfig {
        output_format: OutputFormat::Csv,
        ..PipelineConfig::default().with_drop_positions(DropPreset::Trailing.positions())
    };

    for &(classes, students) in &[(6usize, 40usize), (24, 200)] {
        let ds = score_sheet(classes, students);
        let id = format!("{classes}x{students}");

        group.bench_with_input(BenchmarkId::new("sequential", &id), &ds, |b, ds| {
            b.iter(|| run_pipeline(black_box(ds), &config).unwrap())
        });

        let engine = ExecutionEngine::new(ExecutionOptions::default()).unwrap();
        let pipeline = Pipeline::new(config.clone()).with_engine(engine);
        group.bench_with_input(BenchmarkId::new("parallel", &id), &ds, |b, ds| {
            b.iter(|| pipeline.run(black_box(ds)).unwrap())
        });

        let out = run_pipeline(&ds, &config).unwrap();
        let packager = Pipeline::new(config.clone());
        group.bench_with_input(BenchmarkId::new("package_csv", &id), &out, |b, out| {
            b.iter(|| packager.package(black_box(out)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
