//! Writer module for saving translated tables

mod csv_writer;
mod xlsx_writer;

pub use csv_writer::CsvRowWriter;
pub use xlsx_writer::XlsxRowWriter;

use crate::reader::{CellValue, Table, extension};
use anyhow::Result;
use std::path::Path;

/// Row-at-a-time output, chosen by file extension
pub enum RowWriter {
    Csv(CsvRowWriter),
    Xlsx(XlsxRowWriter),
}

impl RowWriter {
    pub fn create<P: AsRef<Path>>(path: P, sheet_name: &str) -> Result<Self> {
        let path = path.as_ref();

        // Determine file type by extension
        match extension(path).as_deref() {
            Some("xlsx") => Ok(RowWriter::Xlsx(XlsxRowWriter::create(path, sheet_name)?)),
            Some("csv") => Ok(RowWriter::Csv(CsvRowWriter::create(path)?)),
            Some("ods") | Some("xls") | Some("xlsm") | Some("xlsb") => {
                anyhow::bail!(
                    "Writing {} files is not supported; use .xlsx or .csv",
                    path.display()
                )
            }
            _ => anyhow::bail!("Unsupported output format: {}", path.display()),
        }
    }

    pub fn write_header(&mut self, headers: &[String]) -> Result<()> {
        match self {
            RowWriter::Csv(w) => w.write_header(headers),
            RowWriter::Xlsx(w) => w.write_header(headers),
        }
    }

    pub fn write_row(&mut self, cells: &[CellValue]) -> Result<()> {
        match self {
            RowWriter::Csv(w) => w.write_row(cells),
            RowWriter::Xlsx(w) => w.write_row(cells),
        }
    }

    /// Flush and close the file
    pub fn finish(self) -> Result<()> {
        match self {
            RowWriter::Csv(w) => w.finish(),
            RowWriter::Xlsx(w) => w.finish(),
        }
    }
}

/// Write a table to a new file, header row first
pub fn write_table<P: AsRef<Path>>(path: P, table: &Table) -> Result<()> {
    let mut writer = RowWriter::create(path, &table.sheet_name)?;
    writer.write_header(&table.headers())?;
    for row in table.rows() {
        writer.write_row(&row)?;
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{Column, read_table};

    fn sample() -> Table {
        Table::new(
            "水果",
            vec![
                Column::new("名称", vec!["苹果".into(), CellValue::Empty, "香蕉".into()]),
                Column::new(
                    "price",
                    vec![3.0.into(), 2.5.into(), CellValue::Boolean(true)],
                ),
            ],
        )
    }

    #[test]
    fn test_csv_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.csv");
        write_table(&path, &sample())?;

        let table = read_table(&path, None)?;
        assert_eq!(table.headers(), vec!["名称", "price"]);
        assert_eq!(table.columns, sample().columns);
        Ok(())
    }

    #[test]
    fn test_xlsx_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.xlsx");
        write_table(&path, &sample())?;

        let table = read_table(&path, Some("水果"))?;
        assert_eq!(table.sheet_name, "水果");
        assert_eq!(table.columns, sample().columns);
        Ok(())
    }

    #[test]
    fn test_unsupported_output() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert!(write_table(dir.path().join("out.ods"), &sample()).is_err());
        assert!(write_table(dir.path().join("out.txt"), &sample()).is_err());
        Ok(())
    }
}
