//! End-to-end transformation: partition, resolve name clashes, decompose.
//!
//! [`run_pipeline`] is the pure core: a [`DataSet`] plus a [`PipelineConfig`] in, an
//! [`OutputCollection`] out, no filesystem access. [`Pipeline`] wraps the same logic with an
//! optional parallel [`ExecutionEngine`], observer reporting, and helpers for writing or
//! packaging the result.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{CollisionPolicy, PipelineConfig};
use crate::error::{ProcessingError, ProcessingResult};
use crate::execution::ExecutionEngine;
use crate::observability::{report, PipelineObserver, Severity, Stage, StageContext, StageStats};
use crate::output::{self, WriteOptions};
use crate::processing::{decompose, partition, AttributeTable, Partition, PartitionOptions};
use crate::types::DataSet;

/// Every output of one invocation. Names are unique within partitions and within tables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputCollection {
    partitions: Vec<Partition>,
    tables: Vec<AttributeTable>,
}

impl OutputCollection {
    /// Partitions in first-occurrence order of their group value.
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Attribute tables, grouped by partition, columns in ascending position.
    pub fn tables(&self) -> &[AttributeTable] {
        &self.tables
    }

    pub fn partition(&self, name: &str) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.name == name)
    }

    pub fn table(&self, name: &str) -> Option<&AttributeTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Attribute tables cut from the named partition.
    pub fn tables_for<'a>(&'a self, partition: &'a str) -> impl Iterator<Item = &'a AttributeTable> + 'a {
        self.tables.iter().filter(move |t| t.partition == partition)
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty() && self.tables.is_empty()
    }

    fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.dataset.row_count()).sum()
    }
}

/// Run the full transformation sequentially, without observers.
///
/// ```rust
/// use class_data_processor::config::PipelineConfig;
/// use class_data_processor::pipeline::run_pipeline;
/// use class_data_processor::types::{DataSet, Schema, Value};
///
/// let ds = DataSet::new(
///     Schema::from_names(["Name", "Class", "Math"]),
///     vec![vec!["Ada".into(), "JSS1".into(), Value::Int64(70)]],
/// );
/// let out = run_pipeline(&ds, &PipelineConfig::default().with_base_name("t2")).unwrap();
/// assert!(out.table("t2_JSS1_Math").is_some());
/// ```
pub fn run_pipeline(dataset: &DataSet, config: &PipelineConfig) -> ProcessingResult<OutputCollection> {
    Pipeline::new(config.clone()).run(dataset)
}

/// Configured pipeline with optional parallelism and observability.
pub struct Pipeline {
    config: PipelineConfig,
    engine: Option<ExecutionEngine>,
    observer: Option<Arc<dyn PipelineObserver>>,
    alert_at_or_above: Severity,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("engine_set", &self.engine.is_some())
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            engine: None,
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }

    /// Decompose partitions on `engine` instead of the calling thread.
    pub fn with_engine(mut self, engine: ExecutionEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Report stage outcomes and collision warnings to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Severity at or above which failures also trigger `on_alert`.
    pub fn with_alert_threshold(mut self, severity: Severity) -> Self {
        self.alert_at_or_above = severity;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn partition_options(&self) -> PartitionOptions {
        PartitionOptions {
            group_column: self.config.group_column.clone(),
            drop_positions: self.config.drop_positions.clone(),
            base_name: self.config.base_name.clone(),
            empty_group_placeholder: self.config.empty_group_placeholder.clone(),
        }
    }

    /// Partition and decompose `dataset`. Aborts on the first error.
    pub fn run(&self, dataset: &DataSet) -> ProcessingResult<OutputCollection> {
        self.config.validate()?;

        let ctx = StageContext::new(Stage::Partition, &self.config.base_name);
        let partitions = partition(dataset, &self.partition_options())
            .and_then(|parts| self.resolve_partitions(&ctx, parts));
        report(self.observer.as_ref(), self.alert_at_or_above, &ctx, &partitions, |parts| StageStats {
            outputs: parts.len(),
            rows: parts.iter().map(|p| p.dataset.row_count()).sum(),
        });
        let partitions = partitions?;

        let ctx = StageContext::new(Stage::Decompose, &self.config.base_name);
        let tables = match &self.engine {
            Some(engine) => engine.decompose_all(&partitions),
            None => decompose_sequential(&partitions),
        }
        .and_then(|tables| self.resolve_tables(&ctx, tables));
        report(self.observer.as_ref(), self.alert_at_or_above, &ctx, &tables, |tables| StageStats {
            outputs: tables.len(),
            rows: tables.iter().map(|t| t.dataset.row_count()).sum(),
        });

        Ok(OutputCollection {
            partitions,
            tables: tables?,
        })
    }

    /// Write `collection` under `dir` (see [`output::write_collection_to_dir`]).
    pub fn write_to_dir(
        &self,
        collection: &OutputCollection,
        dir: impl AsRef<Path>,
        include_partitions: bool,
    ) -> ProcessingResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let ctx = StageContext::new(Stage::Write, dir.display().to_string());
        let options = WriteOptions {
            format: self.config.output_format,
            include_partitions,
        };
        let result = output::write_collection_to_dir(collection, dir, &options);
        report(self.observer.as_ref(), self.alert_at_or_above, &ctx, &result, |paths| StageStats {
            outputs: paths.len(),
            rows: collection.total_rows(),
        });
        result
    }

    /// Bundle the attribute tables of `collection` into a zip archive.
    pub fn package(&self, collection: &OutputCollection) -> ProcessingResult<Vec<u8>> {
        let ctx = StageContext::new(Stage::Package, output::archive_name(&self.config.base_name));
        let result = output::package(collection, self.config.output_format);
        report(self.observer.as_ref(), self.alert_at_or_above, &ctx, &result, |_| StageStats {
            outputs: collection.tables().len(),
            rows: collection.total_rows(),
        });
        result
    }

    fn resolve_partitions(&self, ctx: &StageContext, parts: Vec<Partition>) -> ProcessingResult<Vec<Partition>> {
        let mut out: Vec<Partition> = Vec::with_capacity(parts.len());
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for p in parts {
            let Some(&idx) = by_name.get(&p.name) else {
                by_name.insert(p.name.clone(), out.len());
                out.push(p);
                continue;
            };
            match self.config.collision_policy {
                CollisionPolicy::Error => return Err(ProcessingError::NameCollision { name: p.name }),
                CollisionPolicy::Merge => {
                    self.warn(
                        ctx,
                        &format!(
                            "group values {:?} and {:?} both map to '{}'; rows merged",
                            out[idx].group_value, p.group_value, p.name
                        ),
                    );
                    out[idx].merge(p);
                }
                CollisionPolicy::Overwrite => {
                    self.warn(
                        ctx,
                        &format!(
                            "group value {:?} replaces {:?} as '{}'",
                            p.group_value, out[idx].group_value, p.name
                        ),
                    );
                    out[idx] = p;
                }
            }
        }

        Ok(out)
    }

    fn resolve_tables(
        &self,
        ctx: &StageContext,
        tables: Vec<AttributeTable>,
    ) -> ProcessingResult<Vec<AttributeTable>> {
        let mut out: Vec<AttributeTable> = Vec::with_capacity(tables.len());
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for t in tables {
            let Some(&idx) = by_name.get(&t.name) else {
                by_name.insert(t.name.clone(), out.len());
                out.push(t);
                continue;
            };
            // Two-column tables with different keys cannot be merged; Merge falls back to
            // last-write-wins here.
            match self.config.collision_policy {
                CollisionPolicy::Error => return Err(ProcessingError::NameCollision { name: t.name }),
                CollisionPolicy::Merge | CollisionPolicy::Overwrite => {
                    self.warn(ctx, &format!("table '{}' produced more than once; last one kept", t.name));
                    out[idx] = t;
                }
            }
        }

        Ok(out)
    }

    fn warn(&self, ctx: &StageContext, message: &str) {
        if let Some(obs) = &self.observer {
            obs.on_warning(ctx, message);
        }
    }
}

fn decompose_sequential(partitions: &[Partition]) -> ProcessingResult<Vec<AttributeTable>> {
    let mut out = Vec::new();
    for p in partitions {
        out.extend(decompose(p)?);
    }
    Ok(out)
}
