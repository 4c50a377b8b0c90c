//! class-data-processor CLI - split student-records spreadsheets into per-class and per-subject
//! tables
//!
//! ```bash
//! class-data-processor split "term2/*.xlsx" -o out --preset trailing --zip
//! class-data-processor split scores.csv --drop 0,2,-1 --format csv --manifest
//! class-data-processor inspect "jss1 second term.xlsx"
//! ```
//!
//! Set `RUST_LOG=info` (or `debug`) for progress output.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use class_data_processor::config::{CollisionPolicy, DropPreset, PipelineConfig};
use class_data_processor::execution::{ExecutionEngine, ExecutionOptions, LogExecutionObserver};
use class_data_processor::ingestion::{ingest_from_path, ExcelSheetSelection, IngestionOptions};
use class_data_processor::observability::{CompositeObserver, FileObserver, LogObserver, PipelineObserver};
use class_data_processor::output::{archive_name, base_name_from_path, OutputFormat, OutputManifest};
use class_data_processor::pipeline::Pipeline;
use class_data_processor::processing::{partition, DropPositions, PartitionOptions};
use class_data_processor::{ProcessingError, ProcessingResult};

#[derive(Parser)]
#[command(name = "class-data-processor")]
#[command(about = "Split student records into per-class and per-subject tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Partition, decompose and write every input file
    Split {
        /// Input files or glob patterns (.csv, .xlsx, .xls, .xlsm, .xlsb, .ods)
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Directory receiving class_data/, final_data/ and archives
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// JSON pipeline config; flags below override its fields. `base_name` is always replaced
        /// by each input's file stem
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Header of the grouping column
        #[arg(short, long)]
        group_column: Option<String>,

        /// Column positions to drop, comma-separated; negative counts from the end
        #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
        drop: Option<Vec<i64>>,

        /// Named drop-position set (ignored when --drop is given)
        #[arg(long, value_enum)]
        preset: Option<PresetArg>,

        /// Output file format
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Also write {input}_processed_files.zip with every subject table
        #[arg(long)]
        zip: bool,

        /// Also write one file per class under class_data/
        #[arg(long)]
        keep_partitions: bool,

        /// What to do when two outputs get the same name
        #[arg(long, value_enum)]
        on_collision: Option<CollisionArg>,

        /// Decompose classes on this many worker threads
        #[arg(short, long)]
        threads: Option<usize>,

        /// Write {input}_manifest.json describing the outputs
        #[arg(long)]
        manifest: bool,

        /// Append stage events to this file
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Workbook sheet to read (default: first sheet)
        #[arg(long, conflicts_with = "all_sheets")]
        sheet: Option<String>,

        /// Read every workbook sheet (all must share headers)
        #[arg(long)]
        all_sheets: bool,
    },

    /// Print headers and per-class row counts as JSON
    Inspect {
        /// Input file
        input: PathBuf,

        /// Header of the grouping column
        #[arg(short, long)]
        group_column: Option<String>,

        /// Workbook sheet to read (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresetArg {
    None,
    Fixed,
    Trailing,
}

impl From<PresetArg> for DropPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::None => DropPreset::None,
            PresetArg::Fixed => DropPreset::Fixed,
            PresetArg::Trailing => DropPreset::Trailing,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Xlsx,
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Xlsx => OutputFormat::Xlsx,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CollisionArg {
    Merge,
    Overwrite,
    Error,
}

impl From<CollisionArg> for CollisionPolicy {
    fn from(arg: CollisionArg) -> Self {
        match arg {
            CollisionArg::Merge => CollisionPolicy::Merge,
            CollisionArg::Overwrite => CollisionPolicy::Overwrite,
            CollisionArg::Error => CollisionPolicy::Error,
        }
    }
}

/// Everything `split` needs once flags are resolved.
struct SplitJob {
    config: PipelineConfig,
    output_dir: PathBuf,
    zip: bool,
    keep_partitions: bool,
    threads: Option<usize>,
    manifest: bool,
    sheet_selection: ExcelSheetSelection,
    observer: Arc<dyn PipelineObserver>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Split {
            inputs,
            output_dir,
            config,
            group_column,
            drop,
            preset,
            format,
            zip,
            keep_partitions,
            on_collision,
            threads,
            manifest,
            log_file,
            sheet,
            all_sheets,
        } => resolve_config(config.as_deref(), group_column, drop, preset, format, on_collision).and_then(
            |config| {
                let job = SplitJob {
                    config,
                    output_dir,
                    zip,
                    keep_partitions,
                    threads,
                    manifest,
                    sheet_selection: sheet_selection(sheet, all_sheets),
                    observer: build_observer(log_file.as_deref()),
                };
                cmd_split(&inputs, &job)
            },
        ),

        Commands::Inspect {
            input,
            group_column,
            sheet,
        } => cmd_inspect(&input, group_column, sheet),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn resolve_config(
    path: Option<&Path>,
    group_column: Option<String>,
    drop: Option<Vec<i64>>,
    preset: Option<PresetArg>,
    format: Option<FormatArg>,
    on_collision: Option<CollisionArg>,
) -> ProcessingResult<PipelineConfig> {
    let mut config = match path {
        Some(p) => PipelineConfig::from_json_path(p)?,
        None => PipelineConfig::default(),
    };

    if let Some(col) = group_column {
        config.group_column = col;
    }
    match (drop, preset) {
        (Some(positions), _) => config.drop_positions = DropPositions::new(positions),
        (None, Some(preset)) => config.drop_positions = DropPreset::from(preset).positions(),
        (None, None) => {}
    }
    if let Some(f) = format {
        config.output_format = f.into();
    }
    if let Some(c) = on_collision {
        config.collision_policy = c.into();
    }

    config.validate()?;
    Ok(config)
}

fn sheet_selection(sheet: Option<String>, all_sheets: bool) -> ExcelSheetSelection {
    match (sheet, all_sheets) {
        (_, true) => ExcelSheetSelection::AllSheets,
        (Some(name), false) => ExcelSheetSelection::Sheet(name),
        (None, false) => ExcelSheetSelection::First,
    }
}

fn build_observer(log_file: Option<&Path>) -> Arc<dyn PipelineObserver> {
    let log: Arc<dyn PipelineObserver> = Arc::new(LogObserver);
    match log_file {
        Some(path) => {
            let file: Arc<dyn PipelineObserver> = Arc::new(FileObserver::new(path));
            Arc::new(CompositeObserver::new(vec![log, file]))
        }
        None => log,
    }
}

/// Expand each pattern with `glob`; a pattern that matches nothing is kept as a literal path so
/// the missing file surfaces as an I/O error.
fn expand_inputs(patterns: &[String]) -> ProcessingResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    for pattern in patterns {
        let matches = glob::glob(pattern).map_err(|e| ProcessingError::InvalidConfig {
            message: format!("invalid input pattern '{pattern}': {e}"),
        })?;
        let before = out.len();
        for entry in matches {
            out.push(entry.map_err(|e| ProcessingError::Io(e.into()))?);
        }
        if out.len() == before {
            out.push(PathBuf::from(pattern));
        }
    }
    Ok(out)
}

/// Base name of every input, in input order.
///
/// Outputs are named after the file stem, so `a/jss1.xlsx` and `b/jss1.csv` would write the same
/// files. Under [`CollisionPolicy::Error`] that is rejected before anything is written; otherwise
/// it is logged and the later input's files replace the earlier ones.
fn base_names(inputs: &[PathBuf], policy: CollisionPolicy) -> ProcessingResult<Vec<String>> {
    let mut seen: HashMap<String, &Path> = HashMap::new();
    let mut out = Vec::with_capacity(inputs.len());
    for input in inputs {
        let base = base_name_from_path(input);
        if let Some(earlier) = seen.insert(base.clone(), input.as_path()) {
            if policy == CollisionPolicy::Error {
                return Err(ProcessingError::NameCollision { name: base });
            }
            log::warn!(
                "{} and {} share the base name '{base}'; outputs of the later one replace the earlier",
                earlier.display(),
                input.display()
            );
        }
        out.push(base);
    }
    Ok(out)
}

fn cmd_split(patterns: &[String], job: &SplitJob) -> ProcessingResult<()> {
    let inputs = expand_inputs(patterns)?;
    let bases = base_names(&inputs, job.config.collision_policy)?;
    fs::create_dir_all(&job.output_dir)?;

    for (input, base_name) in inputs.iter().zip(&bases) {
        split_one(input, base_name, job)?;
    }

    log::info!("processed {} file(s) into {}", inputs.len(), job.output_dir.display());
    Ok(())
}

fn split_one(input: &Path, base_name: &str, job: &SplitJob) -> ProcessingResult<()> {
    log::info!("processing {} as '{base_name}'", input.display());

    let ingest_options = IngestionOptions {
        excel_sheet_selection: job.sheet_selection.clone(),
        observer: Some(Arc::clone(&job.observer)),
        ..Default::default()
    };
    let dataset = ingest_from_path(input, &ingest_options)?;

    let config = job.config.clone().with_base_name(base_name);
    let mut pipeline = Pipeline::new(config).with_observer(Arc::clone(&job.observer));
    if let Some(n) = job.threads {
        let engine = ExecutionEngine::new(ExecutionOptions { num_threads: Some(n) })?
            .with_observer(Arc::new(LogExecutionObserver));
        pipeline = pipeline.with_engine(engine);
    }

    let outputs = pipeline.run(&dataset)?;
    let written = pipeline.write_to_dir(&outputs, &job.output_dir, job.keep_partitions)?;
    log::info!("wrote {} file(s) for '{base_name}'", written.len());

    let mut manifest = OutputManifest::from_collection(
        &outputs,
        base_name,
        &pipeline.config().group_column,
        pipeline.config().output_format,
    );
    if !job.keep_partitions {
        manifest.partitions.clear();
    }

    if job.zip {
        let archive = archive_name(base_name);
        fs::write(job.output_dir.join(&archive), pipeline.package(&outputs)?)?;
        log::info!("packaged {} table(s) into {archive}", outputs.tables().len());
        manifest = manifest.with_archive(archive);
    }

    if job.manifest {
        manifest.write_json(job.output_dir.join(format!("{base_name}_manifest.json")))?;
    }

    Ok(())
}

fn cmd_inspect(input: &Path, group_column: Option<String>, sheet: Option<String>) -> ProcessingResult<()> {
    let options = IngestionOptions {
        excel_sheet_selection: sheet_selection(sheet, false),
        ..Default::default()
    };
    let dataset = ingest_from_path(input, &options)?;

    let mut partition_options = PartitionOptions {
        base_name: base_name_from_path(input),
        ..Default::default()
    };
    if let Some(col) = group_column {
        partition_options.group_column = col;
    }
    let groups: Vec<_> = partition(&dataset, &partition_options)?
        .iter()
        .map(|p| {
            json!({
                "value": p.group_value,
                "name": p.name,
                "rows": p.dataset.row_count(),
            })
        })
        .collect();

    let report = json!({
        "file": input.display().to_string(),
        "rows": dataset.row_count(),
        "headers": dataset.schema.field_names().collect::<Vec<_>>(),
        "group_column": partition_options.group_column,
        "groups": groups,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
