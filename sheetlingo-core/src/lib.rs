//! sheetlingo-core: batch zh↔en translation of spreadsheet columns
//!
//! Text cells of selected columns are deduplicated, sent to a translation
//! provider in delimiter-joined batches, and written back as new columns
//! next to their sources.

pub mod assignment;
pub mod config;
pub mod pipeline;
pub mod projector;
pub mod reader;
pub mod staging;
pub mod translate;
pub mod writer;

use anyhow::Result;
use std::path::Path;

pub use assignment::ColumnAssignment;
pub use config::{CliOverrides, FileSettings, Settings};
pub use pipeline::{DirectionSummary, Pipeline, RunSummary, default_output_path};
pub use projector::{ColumnProjector, HeaderStyle, Placement, ProjectionOptions, TranslationMaps};
pub use reader::{CellValue, Column, Table, read_table};
pub use translate::providers::{ProviderKind, create_translator};
pub use translate::{
    BatchOptions, BatchPolicy, BatchReport, BatchTranslator, Direction, TranslateError,
    TranslationMap, Translator,
};
pub use writer::write_table;

/// Translate one file, in memory or through CSV staging
pub fn translate_path(
    pipeline: &Pipeline,
    input: &Path,
    output: &Path,
    sheet: Option<&str>,
    assignment: &ColumnAssignment,
    staged: bool,
) -> Result<RunSummary> {
    if staged {
        staging::translate_file_staged(pipeline, input, output, sheet, assignment)
    } else {
        pipeline.translate_file(input, output, sheet, assignment)
    }
}
