//! CSV writer used for plain output and for the staging path

use crate::reader::CellValue;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub struct CsvRowWriter {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl CsvRowWriter {
    /// Create the file with a UTF-8 byte order mark so Excel detects the encoding
    pub fn create(path: &Path) -> Result<Self> {
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        file.write_all(UTF8_BOM)
            .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;

        let writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
        Ok(Self {
            writer,
            path: path.to_path_buf(),
        })
    }

    pub fn write_header(&mut self, headers: &[String]) -> Result<()> {
        self.writer
            .write_record(headers)
            .with_context(|| format!("Failed to write CSV header: {}", self.path.display()))
    }

    pub fn write_row(&mut self, cells: &[CellValue]) -> Result<()> {
        self.writer
            .write_record(cells.iter().map(CellValue::to_string))
            .with_context(|| format!("Failed to write CSV row: {}", self.path.display()))
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush CSV file: {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_starts_with_bom() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.csv");
        let mut writer = CsvRowWriter::create(&path)?;
        writer.write_header(&["名称".to_string()])?;
        writer.write_row(&[CellValue::from("苹果")])?;
        writer.finish()?;

        let bytes = std::fs::read(&path)?;
        assert!(bytes.starts_with(UTF8_BOM));
        assert_eq!(&bytes[UTF8_BOM.len()..], "名称\n苹果\n".as_bytes());
        Ok(())
    }
}
