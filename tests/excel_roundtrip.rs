#![cfg(feature = "excel")]

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use class_data_processor::config::PipelineConfig;
use class_data_processor::ingestion::excel::ingest_excel_from_path;
use class_data_processor::ingestion::{
    ingest_from_bytes, ingest_from_path, ExcelSheetSelection, IngestionFormat, IngestionOptions,
};
use class_data_processor::output::{base_name_from_path, OutputFormat};
use class_data_processor::pipeline::Pipeline;
use class_data_processor::processing::DropPositions;
use class_data_processor::types::Value;
use class_data_processor::ErrorKind;

fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("class-data-processor-{name}-{nanos}.xlsx"))
}

fn write_scores_xlsx(path: &Path) {
    use rust_xlsxwriter::Workbook;

    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("Second Term").unwrap();

    // header
    for (col, name) in ["S/N", "Name", "Class", "Math", "English"].iter().enumerate() {
        ws.write_string(0, col as u16, *name).unwrap();
    }

    let rows: [(f64, &str, &str, f64, f64); 3] = [
        (1.0, "Ada", "JSS1\n", 70.0, 80.0),
        (2.0, "Bo", "JSS1", 60.0, 90.0),
        (3.0, "Cy", "JSS2", 50.5, 55.0),
    ];
    for (i, (sn, name, class, math, english)) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        ws.write_number(r, 0, *sn).unwrap();
        ws.write_string(r, 1, *name).unwrap();
        ws.write_string(r, 2, *class).unwrap();
        ws.write_number(r, 3, *math).unwrap();
        ws.write_number(r, 4, *english).unwrap();
    }

    let notes = wb.add_worksheet();
    notes.set_name("Notes").unwrap();
    notes.write_string(0, 0, "Remarks").unwrap();
    notes.write_string(1, 0, "Mid-term results pending").unwrap();

    wb.save(path).unwrap();
}

#[test]
fn workbook_is_ingested_with_typed_cells() {
    let path = tmp_file("ingest");
    write_scores_xlsx(&path);

    let ds = ingest_excel_from_path(&path, &ExcelSheetSelection::First).unwrap();
    assert_eq!(
        ds.schema.field_names().collect::<Vec<_>>(),
        vec!["S/N", "Name", "Class", "Math", "English"]
    );
    assert_eq!(ds.row_count(), 3);
    assert_eq!(ds.rows[0][2], Value::from("JSS1\n"));
    assert_eq!(ds.rows[2][3], Value::Float64(50.5));

    let notes = ingest_excel_from_path(&path, &ExcelSheetSelection::Sheet("Notes".to_string())).unwrap();
    assert_eq!(notes.row_count(), 1);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn sheets_with_different_headers_cannot_be_combined() {
    let path = tmp_file("all-sheets");
    write_scores_xlsx(&path);

    let opts = IngestionOptions {
        excel_sheet_selection: ExcelSheetSelection::AllSheets,
        ..Default::default()
    };
    let err = ingest_from_path(&path, &opts).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert!(err.to_string().contains("sheet 'Notes'"));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn split_workbook_round_trips_through_xlsx_outputs() {
    let path = tmp_file("roundtrip");
    write_scores_xlsx(&path);
    let dir = tempfile::tempdir().unwrap();

    let ds = ingest_from_path(&path, &IngestionOptions::default()).unwrap();
    let base = base_name_from_path(&path);
    let config = PipelineConfig {
        output_format: OutputFormat::Xlsx,
        ..PipelineConfig::default()
            .with_base_name(&base)
            .with_drop_positions(DropPositions::new(vec![0, 2]))
    };
    let pipeline = Pipeline::new(config);
    let out = pipeline.run(&ds).unwrap();
    pipeline.write_to_dir(&out, dir.path(), true).unwrap();

    let math_name = format!("{base}_JSS1_Math");
    let written = dir.path().join("final_data").join(format!("{math_name}.xlsx"));
    let reread = ingest_from_path(&written, &IngestionOptions::default()).unwrap();
    let expected = &out.table(&math_name).unwrap().dataset;

    assert_eq!(reread.schema, expected.schema);
    let as_text = |rows: &Vec<Vec<Value>>| -> Vec<Vec<String>> {
        rows.iter().map(|r| r.iter().map(Value::to_text).collect()).collect()
    };
    assert_eq!(as_text(&reread.rows), as_text(&expected.rows));
    assert_eq!(as_text(&reread.rows), vec![vec!["Ada", "70"], vec!["Bo", "60"]]);

    let partition_file = dir.path().join("class_data").join(format!("{base}_JSS2.xlsx"));
    let bytes = std::fs::read(partition_file).unwrap();
    let jss2 = ingest_from_bytes("jss2", bytes, IngestionFormat::Excel, &IngestionOptions::default()).unwrap();
    assert_eq!(
        jss2.schema.field_names().collect::<Vec<_>>(),
        vec!["Name", "Math", "English"]
    );
    assert_eq!(jss2.rows[0][1], Value::Float64(50.5));

    let _ = std::fs::remove_file(&path);
}
