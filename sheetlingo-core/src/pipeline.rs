//! End-to-end translation of one sheet: read, collect, translate, project, write

use crate::assignment::{ColumnAssignment, index_to_column_letter};
use crate::config::Settings;
use crate::projector::{ColumnProjector, HeaderStyle, ProjectionOptions, TranslationMaps};
use crate::reader::{CellValue, Table, extension, read_table};
use crate::translate::providers::create_translator;
use crate::translate::{BatchOptions, BatchReport, BatchTranslator, Direction, Translator};
use crate::writer::write_table;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::info;

/// Outcome of one direction within a run
#[derive(Debug, Clone, Serialize)]
pub struct DirectionSummary {
    pub direction: Direction,
    pub provider: String,
    /// Source columns, as letters
    pub columns: Vec<String>,
    pub report: BatchReport,
}

/// Outcome of a whole run, printed by the CLI
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub sheet: String,
    pub rows: usize,
    pub input_columns: usize,
    pub output_columns: usize,
    pub staged: bool,
    pub directions: Vec<DirectionSummary>,
}

impl RunSummary {
    pub fn failed_items(&self) -> usize {
        self.directions.iter().map(|d| d.report.failed_items).sum()
    }
}

/// Distinct strings to translate per direction, gathered row by row
#[derive(Debug, Default)]
pub struct RequestSets {
    texts: BTreeMap<Direction, Vec<String>>,
    seen: HashMap<Direction, HashSet<String>>,
    requested: HashMap<Direction, usize>,
}

impl RequestSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, direction: Direction, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        *self.requested.entry(direction).or_default() += 1;
        if self.seen.entry(direction).or_default().insert(text.to_string()) {
            self.texts.entry(direction).or_default().push(text.to_string());
        }
    }

    /// Add the text cells of one data row that sit in directed columns
    pub fn add_row(&mut self, assignment: &ColumnAssignment, row: &[CellValue]) {
        for (index, direction) in assignment.iter() {
            if let Some(text) = row.get(index).and_then(CellValue::translatable_text) {
                self.add(direction, text);
            }
        }
    }

    /// Headers of directed columns, used when headers are translated too
    pub fn add_headers(&mut self, assignment: &ColumnAssignment, headers: &[String]) {
        for (index, direction) in assignment.iter() {
            if let Some(header) = headers.get(index) {
                self.add(direction, header);
            }
        }
    }

    /// Unique strings for `direction`, in first-occurrence order
    pub fn texts(&self, direction: Direction) -> &[String] {
        self.texts.get(&direction).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn requested(&self, direction: Direction) -> usize {
        self.requested.get(&direction).copied().unwrap_or(0)
    }
}

/// Translators per direction plus the batch and projection settings they run with
pub struct Pipeline {
    translators: BTreeMap<Direction, Box<dyn Translator>>,
    batch: BatchOptions,
    projection: ProjectionOptions,
}

impl Pipeline {
    pub fn new(batch: BatchOptions, projection: ProjectionOptions) -> Self {
        Self {
            translators: BTreeMap::new(),
            batch,
            projection,
        }
    }

    /// Build a pipeline with the configured provider for each needed direction
    pub fn from_settings(settings: &Settings, assignment: &ColumnAssignment) -> Result<Self> {
        let mut pipeline = Self::new(settings.batch.clone(), settings.projection);
        for direction in assignment.directions() {
            let translator = create_translator(settings.provider, direction, settings)
                .with_context(|| format!("Failed to set up {} provider", settings.provider))?;
            pipeline = pipeline.with_translator(direction, translator);
        }
        Ok(pipeline)
    }

    pub fn with_translator(mut self, direction: Direction, translator: Box<dyn Translator>) -> Self {
        self.translators.insert(direction, translator);
        self
    }

    pub fn projection(&self) -> ProjectionOptions {
        self.projection
    }

    /// Request sets for an in-memory table
    pub fn collect_requests(&self, table: &Table, assignment: &ColumnAssignment) -> RequestSets {
        let mut requests = RequestSets::new();
        if self.projection.header == HeaderStyle::Translated {
            requests.add_headers(assignment, &table.headers());
        }
        for row in table.rows() {
            requests.add_row(assignment, &row);
        }
        requests
    }

    /// Translate every request set into its direction's map
    pub fn translate_requests(
        &self,
        requests: &RequestSets,
        assignment: &ColumnAssignment,
    ) -> Result<(TranslationMaps, Vec<DirectionSummary>)> {
        let mut maps = TranslationMaps::new();
        let mut summaries = Vec::new();

        for direction in assignment.directions() {
            let translator = self
                .translators
                .get(&direction)
                .with_context(|| format!("No translator configured for {}", direction))?;

            let batch = BatchTranslator::new(&**translator, self.batch.clone());
            let (map, mut report) = batch.translate_unique(requests.texts(direction));
            report.requested = requests.requested(direction);

            info!(
                direction = %direction,
                unique = report.unique,
                failed = report.failed_items,
                "Direction translated"
            );

            maps.insert(direction, map);
            summaries.push(DirectionSummary {
                direction,
                provider: translator.name().to_string(),
                columns: assignment
                    .columns(direction)
                    .into_iter()
                    .map(index_to_column_letter)
                    .collect(),
                report,
            });
        }

        Ok((maps, summaries))
    }

    /// Translate a table in memory, returning the projected table
    pub fn translate_table(
        &self,
        table: &Table,
        assignment: &ColumnAssignment,
    ) -> Result<(Table, Vec<DirectionSummary>)> {
        assignment.validate(table.column_count())?;

        let requests = self.collect_requests(table, assignment);
        let (maps, summaries) = self.translate_requests(&requests, assignment)?;

        let projected = ColumnProjector::new(assignment, &maps, self.projection).project(table);
        Ok((projected, summaries))
    }

    /// Read `input`, translate the assigned columns and write `output`
    pub fn translate_file(
        &self,
        input: &Path,
        output: &Path,
        sheet: Option<&str>,
        assignment: &ColumnAssignment,
    ) -> Result<RunSummary> {
        ensure_distinct_paths(input, output)?;

        let table = read_table(input, sheet)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        info!(
            file = %input.display(),
            sheet = %table.sheet_name,
            rows = table.row_count(),
            columns = table.column_count(),
            "Loaded table"
        );

        let (projected, directions) = self.translate_table(&table, assignment)?;

        write_table(output, &projected)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        info!(file = %output.display(), "Saved translated table");

        Ok(RunSummary {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            sheet: table.sheet_name.clone(),
            rows: projected.row_count(),
            input_columns: table.column_count(),
            output_columns: projected.column_count(),
            staged: false,
            directions,
        })
    }
}

/// `<stem>_translated.<ext>` next to the input; workbook inputs are written as `.xlsx`
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = match extension(input).as_deref() {
        Some("csv") => "csv",
        _ => "xlsx",
    };
    input.with_file_name(format!("{}_translated.{}", stem, ext))
}

pub(crate) fn ensure_distinct_paths(input: &Path, output: &Path) -> Result<()> {
    let same = match (input.canonicalize(), output.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    };
    if same {
        anyhow::bail!(
            "Output path must differ from the input file: {}",
            output.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Column;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/data/fruits.xlsx")),
            PathBuf::from("/data/fruits_translated.xlsx")
        );
        assert_eq!(
            default_output_path(Path::new("report.CSV")),
            PathBuf::from("report_translated.csv")
        );
        assert_eq!(
            default_output_path(Path::new("legacy.xls")),
            PathBuf::from("legacy_translated.xlsx")
        );
    }

    #[test]
    fn test_request_sets_deduplicate_per_direction() {
        let table = Table::new(
            "S",
            vec![
                Column::new("a", vec!["x".into(), "y".into(), "x".into()]),
                Column::new("b", vec!["x".into(), "".into(), 1.0.into()]),
            ],
        );
        let mut assignment = ColumnAssignment::new();
        assignment.assign(0, Direction::ZhToEn).unwrap();
        assignment.assign(1, Direction::EnToZh).unwrap();

        let pipeline = Pipeline::new(BatchOptions::default(), ProjectionOptions::default());
        let requests = pipeline.collect_requests(&table, &assignment);

        assert_eq!(requests.texts(Direction::ZhToEn), ["x", "y"]);
        assert_eq!(requests.requested(Direction::ZhToEn), 3);
        assert_eq!(requests.texts(Direction::EnToZh), ["x"]);
        assert_eq!(requests.requested(Direction::EnToZh), 1);
    }

    #[test]
    fn test_translated_headers_join_the_request_set() {
        let table = Table::new("S", vec![Column::new("名称", vec!["苹果".into()])]);
        let assignment = ColumnAssignment::all(1, Direction::ZhToEn);
        let projection = ProjectionOptions {
            header: HeaderStyle::Translated,
            ..Default::default()
        };

        let pipeline = Pipeline::new(BatchOptions::default(), projection);
        let requests = pipeline.collect_requests(&table, &assignment);
        assert_eq!(requests.texts(Direction::ZhToEn), ["名称", "苹果"]);
    }

    #[test]
    fn test_missing_translator_is_an_error() {
        let table = Table::new("S", vec![Column::new("h", vec!["a".into()])]);
        let assignment = ColumnAssignment::all(1, Direction::EnToZh);
        let pipeline = Pipeline::new(BatchOptions::default(), ProjectionOptions::default());
        assert!(pipeline.translate_table(&table, &assignment).is_err());
    }
}
