//! Two-pass CSV staging for sheets too large to project in memory
//!
//! Workbook inputs are first converted to `<stem>_temp.csv` next to the
//! input. The first pass streams that file to collect request sets, the
//! second streams it again through the projector straight into the output.
//! The temporary file is removed when the run ends, successful or not.

use crate::assignment::ColumnAssignment;
use crate::pipeline::{Pipeline, RequestSets, RunSummary, ensure_distinct_paths};
use crate::projector::{ColumnProjector, HeaderStyle};
use crate::reader::{CellValue, CsvRowReader, csv_sheet_name, extension, read_table};
use crate::writer::{RowWriter, write_table};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// `<stem>_temp.csv` next to the input
pub fn staging_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("staging");
    input.with_file_name(format!("{}_temp.csv", stem))
}

/// Removes the staged copy when dropped
struct StagedCopy {
    path: PathBuf,
}

impl Drop for StagedCopy {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(file = %self.path.display(), "Removed staging file"),
            Err(e) => warn!(
                file = %self.path.display(),
                error = %e,
                "Failed to remove staging file"
            ),
        }
    }
}

/// Same result as [`Pipeline::translate_file`], without holding the projected table in memory
pub fn translate_file_staged(
    pipeline: &Pipeline,
    input: &Path,
    output: &Path,
    sheet: Option<&str>,
    assignment: &ColumnAssignment,
) -> Result<RunSummary> {
    ensure_distinct_paths(input, output)?;

    let (source, sheet_name, _staged) = if extension(input).as_deref() == Some("csv") {
        (input.to_path_buf(), csv_sheet_name(input), None)
    } else {
        let path = staging_path(input);
        let table = read_table(input, sheet)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        write_table(&path, &table)
            .with_context(|| format!("Failed to stage {} as CSV", input.display()))?;
        info!(file = %path.display(), rows = table.row_count(), "Staged sheet as CSV");
        let staged = StagedCopy { path: path.clone() };
        (path, table.sheet_name, Some(staged))
    };

    // Pass 1: collect what needs translating
    let mut reader = CsvRowReader::open(&source)?;
    let headers = reader.headers().to_vec();
    let width = headers.len();
    assignment.validate(width)?;

    let mut requests = RequestSets::new();
    if pipeline.projection().header == HeaderStyle::Translated {
        requests.add_headers(assignment, &headers);
    }
    let mut rows = 0;
    for row in reader.rows() {
        requests.add_row(assignment, &row?);
        rows += 1;
    }
    info!(rows, "Collected translation requests");

    let (maps, directions) = pipeline.translate_requests(&requests, assignment)?;

    // Pass 2: project each row into the output
    let projector = ColumnProjector::new(assignment, &maps, pipeline.projection());
    let projected_headers = projector.project_headers(&headers);

    let mut writer = RowWriter::create(output, &sheet_name)?;
    writer.write_header(&projected_headers)?;

    let mut reader = CsvRowReader::open(&source)?;
    for row in reader.rows() {
        let mut row = row?;
        if row.len() < width {
            row.resize(width, CellValue::Empty);
        }
        writer.write_row(&projector.project_row(&row))?;
    }
    writer
        .finish()
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(file = %output.display(), "Saved translated table");

    Ok(RunSummary {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        sheet: sheet_name,
        rows,
        input_columns: width,
        output_columns: projected_headers.len(),
        staged: true,
        directions,
    })
}
