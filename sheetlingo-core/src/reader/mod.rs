//! Excel/ODS/CSV file reader using calamine and csv

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, open_workbook_auto};
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod table;

pub use table::{CellValue, Column, Table};

/// Read one sheet of a workbook (or a CSV file) into a table.
///
/// The first row is the header row. `sheet` selects a worksheet by name;
/// when absent the first sheet is used. CSV files ignore `sheet`.
pub fn read_table<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<Table> {
    let path = path.as_ref();
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    match extension(path).as_deref() {
        Some("csv") => read_csv_table(path),
        Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => {
            read_workbook_table(path, sheet)
        }
        _ => anyhow::bail!("Unsupported file format: {}", path.display()),
    }
}

/// Header row only; CSV files are not read past their first line
pub fn read_headers<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<Vec<String>> {
    let path = path.as_ref();
    if extension(path).as_deref() == Some("csv") && path.exists() {
        return Ok(CsvRowReader::open(path)?.headers().to_vec());
    }
    Ok(read_table(path, sheet)?.headers())
}

fn read_workbook_table(path: &Path, sheet: Option<&str>) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(name) => {
            if !sheet_names.iter().any(|s| s == name) {
                anyhow::bail!(
                    "Sheet '{}' not found in {} (available: {})",
                    name,
                    path.display(),
                    sheet_names.join(", ")
                );
            }
            name.to_string()
        }
        None => sheet_names
            .first()
            .cloned()
            .with_context(|| format!("Workbook has no sheets: {}", path.display()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read sheet '{}'", sheet_name))?;

    Ok(parse_range(&sheet_name, &range))
}

fn parse_range(sheet_name: &str, range: &Range<Data>) -> Table {
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|data| parse_cell_value(data).to_string())
            .collect(),
        None => Vec::new(),
    };

    let data_rows: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(parse_cell_value).collect())
        .collect();

    Table::from_rows(sheet_name, headers, data_rows)
}

fn parse_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Boolean(*b),
        // Error cells carry nothing translatable
        Data::Error(_) => CellValue::Empty,
        Data::Empty => CellValue::Empty,
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn read_csv_table(path: &Path) -> Result<Table> {
    let mut reader = CsvRowReader::open(path)?;
    let headers = reader.headers().to_vec();
    let rows = reader.rows().collect::<Result<Vec<_>>>()?;
    Ok(Table::from_rows(csv_sheet_name(path), headers, rows))
}

/// Streams the data rows of a CSV file without loading it whole
pub struct CsvRowReader {
    reader: csv::Reader<File>,
    headers: Vec<String>,
    path: PathBuf,
}

impl CsvRowReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        Ok(Self {
            reader,
            headers,
            path: path.to_path_buf(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&mut self) -> impl Iterator<Item = Result<Vec<CellValue>>> + '_ {
        let path = &self.path;
        self.reader.records().map(move |record| {
            let record =
                record.with_context(|| format!("Malformed CSV row in {}", path.display()))?;
            Ok(record.iter().map(CellValue::from_csv_field).collect())
        })
    }
}

/// Sheet name given to a CSV file: its sanitized stem
pub fn csv_sheet_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(sanitize_sheet_name)
        .unwrap_or_else(|| "Sheet1".to_string())
}

/// Lower-cased file extension
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

/// Make a string acceptable as a worksheet name (31 chars, no `[]:*?/\`)
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(31)
        .collect();

    if cleaned.trim().is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}
