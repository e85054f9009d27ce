//! XLSX writer built on rust_xlsxwriter

use crate::reader::{CellValue, sanitize_sheet_name};
use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::path::{Path, PathBuf};

/// Single-sheet workbook filled one row at a time and saved on `finish`
pub struct XlsxRowWriter {
    worksheet: Worksheet,
    next_row: u32,
    path: PathBuf,
}

impl XlsxRowWriter {
    pub fn create(path: &Path, sheet_name: &str) -> Result<Self> {
        let mut worksheet = Worksheet::new();
        worksheet
            .set_name(sanitize_sheet_name(sheet_name))
            .with_context(|| format!("Invalid sheet name '{}'", sheet_name))?;

        Ok(Self {
            worksheet,
            next_row: 0,
            path: path.to_path_buf(),
        })
    }

    pub fn write_header(&mut self, headers: &[String]) -> Result<()> {
        let cells: Vec<CellValue> = headers
            .iter()
            .map(|h| {
                if h.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(h.clone())
                }
            })
            .collect();
        self.write_row(&cells)
    }

    pub fn write_row(&mut self, cells: &[CellValue]) -> Result<()> {
        let row = self.next_row;
        for (col_idx, cell) in cells.iter().enumerate() {
            let col = u16::try_from(col_idx)
                .with_context(|| format!("Too many columns for XLSX: {}", cells.len()))?;
            match cell {
                CellValue::Empty => {}
                CellValue::Number(n) => {
                    self.worksheet.write_number(row, col, *n)?;
                }
                CellValue::Text(s) => {
                    self.worksheet.write_string(row, col, s.as_str())?;
                }
                CellValue::Boolean(b) => {
                    self.worksheet.write_boolean(row, col, *b)?;
                }
            }
        }

        self.next_row = row
            .checked_add(1)
            .with_context(|| format!("Too many rows for XLSX: {}", self.path.display()))?;
        Ok(())
    }

    pub fn finish(self) -> Result<()> {
        let mut workbook = Workbook::new();
        workbook.push_worksheet(self.worksheet);
        workbook
            .save(&self.path)
            .with_context(|| format!("Failed to save XLSX file: {}", self.path.display()))?;
        Ok(())
    }
}
