//! Merge translation maps back into a table as synthetic columns

use crate::assignment::ColumnAssignment;
use crate::reader::{CellValue, Column, Table};
use crate::translate::{Direction, TranslationMap};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Where the synthetic column goes relative to its source column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    #[default]
    After,
    Before,
}

/// How the synthetic column header is produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderStyle {
    /// `<header>_en` / `<header>_zh`
    #[default]
    Suffix,
    /// The header text itself translated, suffix form when unavailable
    Translated,
}

impl FromStr for Placement {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "after" => Ok(Placement::After),
            "before" => Ok(Placement::Before),
            _ => anyhow::bail!("Unknown placement '{}' (expected after or before)", s),
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::After => f.write_str("after"),
            Placement::Before => f.write_str("before"),
        }
    }
}

impl FromStr for HeaderStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "suffix" => Ok(HeaderStyle::Suffix),
            "translated" => Ok(HeaderStyle::Translated),
            _ => anyhow::bail!("Unknown header style '{}' (expected suffix or translated)", s),
        }
    }
}

impl fmt::Display for HeaderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderStyle::Suffix => f.write_str("suffix"),
            HeaderStyle::Translated => f.write_str("translated"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionOptions {
    pub placement: Placement,
    pub header: HeaderStyle,
}

/// One translation map per direction
#[derive(Debug, Clone, Default)]
pub struct TranslationMaps {
    maps: HashMap<Direction, TranslationMap>,
}

impl TranslationMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, direction: Direction, map: TranslationMap) {
        self.maps.insert(direction, map);
    }

    pub fn get(&self, direction: Direction) -> Option<&TranslationMap> {
        self.maps.get(&direction)
    }

    pub fn lookup(&self, direction: Direction, text: &str) -> Option<&str> {
        self.get(direction)
            .and_then(|map| map.get(text))
            .map(String::as_str)
    }
}

/// Emits every original column plus one translated column per directed column
pub struct ColumnProjector<'a> {
    assignment: &'a ColumnAssignment,
    maps: &'a TranslationMaps,
    options: ProjectionOptions,
    min_width: usize,
}

impl<'a> ColumnProjector<'a> {
    pub fn new(
        assignment: &'a ColumnAssignment,
        maps: &'a TranslationMaps,
        options: ProjectionOptions,
    ) -> Self {
        let min_width = assignment.iter().map(|(index, _)| index + 1).max().unwrap_or(0);
        Self {
            assignment,
            maps,
            options,
            min_width,
        }
    }

    pub fn project(&self, table: &Table) -> Table {
        let mut columns = Vec::with_capacity(table.column_count() + self.assignment.len());

        for (index, column) in table.columns.iter().enumerate() {
            let Some(direction) = self.assignment.direction(index) else {
                columns.push(column.clone());
                continue;
            };

            let synthetic = Column::new(
                self.header_for(&column.header, direction),
                column
                    .cells
                    .iter()
                    .map(|cell| self.translate_cell(cell, direction))
                    .collect(),
            );
            self.emit(&mut columns, column.clone(), synthetic);
        }

        Table::new(table.sheet_name.clone(), columns)
    }

    /// Header row of the projected table
    pub fn project_headers(&self, headers: &[String]) -> Vec<String> {
        let mut projected = Vec::with_capacity(headers.len() + self.assignment.len());
        let width = headers.len().max(self.min_width);

        for index in 0..width {
            let header = headers.get(index).cloned().unwrap_or_default();
            match self.assignment.direction(index) {
                Some(direction) => {
                    let synthetic = self.header_for(&header, direction);
                    self.emit(&mut projected, header, synthetic);
                }
                None => projected.push(header),
            }
        }
        projected
    }

    /// One data row of the projected table; short rows are read as padded with `Empty`
    pub fn project_row(&self, row: &[CellValue]) -> Vec<CellValue> {
        let mut projected = Vec::with_capacity(row.len() + self.assignment.len());
        let width = row.len().max(self.min_width);

        for index in 0..width {
            let cell = row.get(index).cloned().unwrap_or(CellValue::Empty);
            match self.assignment.direction(index) {
                Some(direction) => {
                    let synthetic = self.translate_cell(&cell, direction);
                    self.emit(&mut projected, cell, synthetic);
                }
                None => projected.push(cell),
            }
        }
        projected
    }

    fn emit<T>(&self, out: &mut Vec<T>, original: T, synthetic: T) {
        match self.options.placement {
            Placement::After => {
                out.push(original);
                out.push(synthetic);
            }
            Placement::Before => {
                out.push(synthetic);
                out.push(original);
            }
        }
    }

    fn header_for(&self, header: &str, direction: Direction) -> String {
        if self.options.header == HeaderStyle::Translated && !header.trim().is_empty() {
            // A header mapped to itself failed to translate
            if let Some(translated) = self
                .maps
                .lookup(direction, header)
                .filter(|t| t.trim() != header.trim() && !t.trim().is_empty())
            {
                return translated.to_string();
            }
        }
        format!("{}{}", header, direction.header_suffix())
    }

    fn translate_cell(&self, cell: &CellValue, direction: Direction) -> CellValue {
        cell.translatable_text()
            .and_then(|text| self.maps.lookup(direction, text))
            .map(|translated| CellValue::Text(translated.to_string()))
            .unwrap_or(CellValue::Empty)
    }
}
