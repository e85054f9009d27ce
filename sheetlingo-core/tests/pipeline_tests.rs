use sheetlingo_core::staging::{staging_path, translate_file_staged};
use sheetlingo_core::{
    BatchOptions, CellValue, Column, ColumnAssignment, Direction, HeaderStyle, Pipeline,
    Placement, ProjectionOptions, Table, TranslateError, Translator, read_table, write_table,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// Dictionary-backed translator that records every request
#[derive(Clone, Default)]
struct DictTranslator {
    dict: Arc<HashMap<String, String>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl DictTranslator {
    fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            dict: Arc::new(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            calls: Arc::default(),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Translator for DictTranslator {
    fn name(&self) -> &str {
        "dict"
    }

    fn translate(&self, text: &str) -> Result<String, TranslateError> {
        self.calls.lock().unwrap().push(text.to_string());
        Ok(text
            .split(" ||| ")
            .map(|part| self.dict.get(part).map(String::as_str).unwrap_or(part))
            .collect::<Vec<_>>()
            .join(" ||| "))
    }
}

// Provider that is always down
struct DownTranslator;

impl Translator for DownTranslator {
    fn name(&self) -> &str {
        "down"
    }

    fn translate(&self, _text: &str) -> Result<String, TranslateError> {
        Err(TranslateError::Transport("connection refused".to_string()))
    }
}

fn options() -> BatchOptions {
    BatchOptions {
        delay: Duration::ZERO,
        ..Default::default()
    }
}

fn fruit_dict() -> DictTranslator {
    DictTranslator::new(&[
        ("苹果", "apple"),
        ("香蕉", "banana"),
        ("名称", "Name"),
        ("red", "红色"),
        ("yellow", "黄色"),
        ("colour", "颜色"),
    ])
}

fn fruit_table() -> Table {
    Table::new(
        "水果",
        vec![
            Column::new("名称", vec!["苹果".into(), "苹果".into(), "香蕉".into()]),
            Column::new("colour", vec!["red".into(), "red".into(), "yellow".into()]),
            Column::new("price", vec![3.0.into(), 3.0.into(), 2.5.into()]),
        ],
    )
}

fn write_fruit_workbook(path: &Path) -> anyhow::Result<()> {
    write_table(path, &fruit_table())
}

#[test]
fn test_end_to_end_single_call_per_string() -> anyhow::Result<()> {
    let dict = fruit_dict();
    let table = Table::new(
        "Sheet1",
        vec![Column::new(
            "名称",
            vec!["苹果".into(), "苹果".into(), "香蕉".into()],
        )],
    );
    let assignment = ColumnAssignment::all(1, Direction::ZhToEn);
    let pipeline = Pipeline::new(options(), ProjectionOptions::default())
        .with_translator(Direction::ZhToEn, Box::new(dict.clone()));

    let (projected, summaries) = pipeline.translate_table(&table, &assignment)?;

    let column = projected.get_column("名称_en").expect("translated column");
    assert_eq!(
        column.cells,
        vec![
            CellValue::from("apple"),
            CellValue::from("apple"),
            CellValue::from("banana")
        ]
    );

    let apple_calls = dict.calls().iter().filter(|c| c.contains("苹果")).count();
    assert_eq!(apple_calls, 1);
    assert_eq!(summaries[0].report.requested, 3);
    assert_eq!(summaries[0].report.unique, 2);
    Ok(())
}

#[test]
fn test_both_directions_in_one_run() -> anyhow::Result<()> {
    let zh = fruit_dict();
    let en = fruit_dict();
    let mut assignment = ColumnAssignment::new();
    assignment.assign_letters("A", Direction::ZhToEn)?;
    assignment.assign_letters("B", Direction::EnToZh)?;

    let pipeline = Pipeline::new(options(), ProjectionOptions::default())
        .with_translator(Direction::ZhToEn, Box::new(zh.clone()))
        .with_translator(Direction::EnToZh, Box::new(en.clone()));

    let (projected, summaries) = pipeline.translate_table(&fruit_table(), &assignment)?;

    assert_eq!(
        projected.headers(),
        vec!["名称", "名称_en", "colour", "colour_zh", "price"]
    );
    assert_eq!(projected.row_count(), 3);
    assert_eq!(projected.columns[3].cells[2], CellValue::from("黄色"));
    assert_eq!(summaries.len(), 2);
    // Each direction only sees its own columns
    assert!(zh.calls().iter().all(|c| !c.contains("red")));
    assert!(en.calls().iter().all(|c| !c.contains("苹果")));
    Ok(())
}

#[test]
fn test_provider_outage_keeps_original_text() -> anyhow::Result<()> {
    let assignment = ColumnAssignment::all(1, Direction::ZhToEn);
    let table = Table::new(
        "Sheet1",
        vec![Column::new("名称", vec!["苹果".into(), CellValue::Empty])],
    );
    let pipeline = Pipeline::new(options(), ProjectionOptions::default())
        .with_translator(Direction::ZhToEn, Box::new(DownTranslator));

    let (projected, summaries) = pipeline.translate_table(&table, &assignment)?;

    assert_eq!(
        projected.columns[1].cells,
        vec![CellValue::from("苹果"), CellValue::Empty]
    );
    assert_eq!(summaries[0].report.failed_items, 1);
    assert_eq!(summaries[0].report.degraded_batches, 1);
    Ok(())
}

#[test]
fn test_translate_xlsx_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("fruits.xlsx");
    let output = dir.path().join("fruits_translated.xlsx");
    write_fruit_workbook(&input)?;

    let mut assignment = ColumnAssignment::new();
    assignment.assign_letters("A", Direction::ZhToEn)?;
    let projection = ProjectionOptions {
        placement: Placement::Before,
        header: HeaderStyle::Translated,
    };
    let pipeline = Pipeline::new(options(), projection)
        .with_translator(Direction::ZhToEn, Box::new(fruit_dict()));

    let summary = pipeline.translate_file(&input, &output, None, &assignment)?;
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.output_columns, 4);
    assert!(!summary.staged);

    let written = read_table(&output, None)?;
    assert_eq!(written.sheet_name, "水果");
    assert_eq!(written.headers(), vec!["Name", "名称", "colour", "price"]);
    assert_eq!(written.columns[0].cells[2], CellValue::from("banana"));
    assert_eq!(written.columns[3].cells[0], CellValue::Number(3.0));
    Ok(())
}

#[test]
fn test_staged_matches_in_memory() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("fruits.xlsx");
    let in_memory = dir.path().join("memory.xlsx");
    let staged = dir.path().join("staged.xlsx");
    write_fruit_workbook(&input)?;

    let mut assignment = ColumnAssignment::new();
    assignment.assign_letters("A", Direction::ZhToEn)?;
    assignment.assign_letters("B", Direction::EnToZh)?;
    let pipeline = Pipeline::new(options(), ProjectionOptions::default())
        .with_translator(Direction::ZhToEn, Box::new(fruit_dict()))
        .with_translator(Direction::EnToZh, Box::new(fruit_dict()));

    let memory_summary = pipeline.translate_file(&input, &in_memory, None, &assignment)?;
    let staged_summary = translate_file_staged(&pipeline, &input, &staged, None, &assignment)?;

    assert!(staged_summary.staged);
    assert_eq!(staged_summary.rows, memory_summary.rows);
    assert_eq!(staged_summary.output_columns, memory_summary.output_columns);
    assert_eq!(
        read_table(&staged, None)?.columns,
        read_table(&in_memory, None)?.columns
    );
    // The intermediate CSV is cleaned up
    assert!(!staging_path(&input).exists());
    Ok(())
}

#[test]
fn test_staged_csv_input() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("fruits.csv");
    let output = dir.path().join("fruits_translated.csv");
    std::fs::write(&input, "名称,price\n苹果,3\n,4\n香蕉\n")?;

    let assignment = {
        let mut a = ColumnAssignment::new();
        a.assign_letters("A", Direction::ZhToEn)?;
        a
    };
    let pipeline = Pipeline::new(options(), ProjectionOptions::default())
        .with_translator(Direction::ZhToEn, Box::new(fruit_dict()));

    let summary = translate_file_staged(&pipeline, &input, &output, None, &assignment)?;
    assert_eq!(summary.rows, 3);

    let written = read_table(&output, None)?;
    assert_eq!(written.headers(), vec!["名称", "名称_en", "price"]);
    assert_eq!(
        written.columns[1].cells,
        vec![
            CellValue::from("apple"),
            CellValue::Empty,
            CellValue::from("banana")
        ]
    );
    assert_eq!(written.columns[2].cells[2], CellValue::Empty);
    Ok(())
}

#[test]
fn test_invalid_assignment_writes_nothing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("fruits.xlsx");
    let output = dir.path().join("out.xlsx");
    write_fruit_workbook(&input)?;

    let mut assignment = ColumnAssignment::new();
    assignment.assign_letters("E", Direction::ZhToEn)?;
    let pipeline = Pipeline::new(options(), ProjectionOptions::default())
        .with_translator(Direction::ZhToEn, Box::new(fruit_dict()));

    assert!(pipeline.translate_file(&input, &output, None, &assignment).is_err());
    assert!(translate_file_staged(&pipeline, &input, &output, None, &assignment).is_err());
    assert!(!output.exists());
    assert!(!staging_path(&input).exists());

    // Refuses to overwrite its own input
    let mut assignment = ColumnAssignment::new();
    assignment.assign_letters("A", Direction::ZhToEn)?;
    assert!(pipeline.translate_file(&input, &input, None, &assignment).is_err());
    Ok(())
}

#[test]
fn test_failed_header_translation_falls_back_to_suffix() -> anyhow::Result<()> {
    let table = Table::new("Sheet1", vec![Column::new("名称", vec!["苹果".into()])]);
    let assignment = ColumnAssignment::all(1, Direction::ZhToEn);
    let projection = ProjectionOptions {
        header: HeaderStyle::Translated,
        ..Default::default()
    };
    let pipeline = Pipeline::new(options(), projection)
        .with_translator(Direction::ZhToEn, Box::new(DownTranslator));

    let (projected, _) = pipeline.translate_table(&table, &assignment)?;
    assert_eq!(projected.headers(), vec!["名称", "名称_en"]);
    Ok(())
}

#[test]
fn test_csv_passthrough_cells_are_kept_verbatim() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("ids.csv");
    let in_memory = dir.path().join("memory.csv");
    let staged = dir.path().join("staged.csv");
    std::fs::write(
        &input,
        "名称,身份证,编号,价格\n苹果,110101199003071234,00123,1.50\n",
    )?;

    let assignment = ColumnAssignment::all(1, Direction::ZhToEn);
    let pipeline = Pipeline::new(options(), ProjectionOptions::default())
        .with_translator(Direction::ZhToEn, Box::new(fruit_dict()));

    pipeline.translate_file(&input, &in_memory, None, &assignment)?;
    translate_file_staged(&pipeline, &input, &staged, None, &assignment)?;

    for output in [&in_memory, &staged] {
        let written = std::fs::read_to_string(output)?;
        assert!(
            written.contains("苹果,apple,110101199003071234,00123,1.50"),
            "unexpected output: {written}"
        );
    }
    Ok(())
}

#[test]
fn test_numeric_text_is_not_sent_to_provider() -> anyhow::Result<()> {
    let dict = fruit_dict();
    let table = Table::new(
        "Sheet1",
        vec![Column::new("名称", vec!["苹果".into(), "00123".into()])],
    );
    let assignment = ColumnAssignment::all(1, Direction::ZhToEn);
    let pipeline = Pipeline::new(options(), ProjectionOptions::default())
        .with_translator(Direction::ZhToEn, Box::new(dict.clone()));

    let (projected, _) = pipeline.translate_table(&table, &assignment)?;
    assert_eq!(projected.columns[0].cells[1], CellValue::from("00123"));
    assert_eq!(projected.columns[1].cells[1], CellValue::Empty);
    assert!(dict.calls().iter().all(|c| !c.contains("00123")));
    Ok(())
}
