//! Table data structures

use std::fmt;

/// A single sheet loaded as named columns
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub sheet_name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(sheet_name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            columns,
        }
    }

    /// Build a table from a header row and data rows, padding short rows with `Empty`
    pub fn from_rows(
        sheet_name: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    ) -> Self {
        let width = rows
            .iter()
            .map(|row| row.len())
            .max()
            .unwrap_or(0)
            .max(headers.len());

        let mut columns: Vec<Column> = (0..width)
            .map(|col| Column {
                header: headers.get(col).cloned().unwrap_or_default(),
                cells: Vec::with_capacity(rows.len()),
            })
            .collect();

        for row in rows {
            for (col, column) in columns.iter_mut().enumerate() {
                column
                    .cells
                    .push(row.get(col).cloned().unwrap_or(CellValue::Empty));
            }
        }

        Self::new(sheet_name, columns)
    }

    /// Number of data rows (header excluded)
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.cells.len()).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.header.clone()).collect()
    }

    /// Get a column by its header text
    pub fn get_column(&self, header: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.header == header)
    }

    /// Cells of one data row, left to right
    pub fn row(&self, index: usize) -> Vec<&CellValue> {
        self.columns
            .iter()
            .filter_map(|c| c.cells.get(index))
            .collect()
    }

    /// Iterate over data rows as owned cell vectors
    pub fn rows(&self) -> impl Iterator<Item = Vec<CellValue>> + '_ {
        (0..self.row_count()).map(move |row| {
            self.columns
                .iter()
                .map(|c| c.cells.get(row).cloned().unwrap_or(CellValue::Empty))
                .collect()
        })
    }
}

/// One column: header text plus its data cells
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub header: String,
    pub cells: Vec<CellValue>,
}

impl Column {
    pub fn new(header: impl Into<String>, cells: Vec<CellValue>) -> Self {
        Self {
            header: header.into(),
            cells,
        }
    }

    /// Non-blank text values in row order (duplicates kept)
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().filter_map(|c| c.translatable_text())
    }
}

/// Cell value types
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
}

impl CellValue {
    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text worth sending to a provider: text cells that are neither blank nor numeric
    pub fn translatable_text(&self) -> Option<&str> {
        self.as_text().filter(|s| {
            let s = s.trim();
            !s.is_empty() && !s.parse::<f64>().is_ok_and(f64::is_finite)
        })
    }

    /// Parse a raw CSV field.
    ///
    /// Numbers and booleans are recovered only when writing them back
    /// reproduces the field exactly; anything else (`00123`, 18-digit IDs,
    /// `1.50`) stays text.
    pub fn from_csv_field(field: &str) -> Self {
        if field.is_empty() {
            return CellValue::Empty;
        }
        if let Ok(n) = field.parse::<f64>() {
            let number = CellValue::Number(n);
            if n.is_finite() && number.to_string() == field {
                return number;
            }
        }
        match field {
            "TRUE" => CellValue::Boolean(true),
            "FALSE" => CellValue::Boolean(false),
            _ => CellValue::Text(field.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Boolean(true) => f.write_str("TRUE"),
            CellValue::Boolean(false) => f.write_str("FALSE"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}
