//! Column direction assignment

use crate::translate::Direction;
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Which columns are translated, and in which direction.
///
/// A column carries at most one direction; assigning a second one is an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnAssignment {
    directions: BTreeMap<usize, Direction>,
}

impl ColumnAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every column in `0..width` gets `direction`
    pub fn all(width: usize, direction: Direction) -> Self {
        Self {
            directions: (0..width).map(|index| (index, direction)).collect(),
        }
    }

    pub fn assign(&mut self, index: usize, direction: Direction) -> Result<()> {
        match self.directions.get(&index) {
            Some(existing) if *existing != direction => anyhow::bail!(
                "Column {} is assigned both {} and {}",
                index_to_column_letter(index),
                existing,
                direction
            ),
            _ => {
                self.directions.insert(index, direction);
                Ok(())
            }
        }
    }

    /// Assign every column named in a letter list such as `"A,C"` or `"A、D"`
    pub fn assign_letters(&mut self, letters: &str, direction: Direction) -> Result<()> {
        for index in parse_column_letters(letters)? {
            self.assign(index, direction)?;
        }
        Ok(())
    }

    pub fn direction(&self, index: usize) -> Option<Direction> {
        self.directions.get(&index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Direction)> + '_ {
        self.directions.iter().map(|(index, direction)| (*index, *direction))
    }

    /// Column indices assigned `direction`, left to right
    pub fn columns(&self, direction: Direction) -> Vec<usize> {
        self.iter()
            .filter(|(_, d)| *d == direction)
            .map(|(index, _)| index)
            .collect()
    }

    /// Directions that have at least one column
    pub fn directions(&self) -> BTreeSet<Direction> {
        self.directions.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    /// Every assigned column must exist in a table `width` columns wide
    pub fn validate(&self, width: usize) -> Result<()> {
        if self.is_empty() {
            anyhow::bail!("No columns selected for translation");
        }

        let out_of_range: Vec<String> = self
            .directions
            .keys()
            .filter(|index| **index >= width)
            .map(|index| index_to_column_letter(*index))
            .collect();

        if !out_of_range.is_empty() {
            anyhow::bail!(
                "Column(s) {} out of range: the sheet has {} column(s) (A-{})",
                out_of_range.join(", "),
                width,
                index_to_column_letter(width.saturating_sub(1))
            );
        }
        Ok(())
    }
}

/// Every ASCII letter is one column; anything else is a separator
pub fn parse_column_letters(input: &str) -> Result<Vec<usize>> {
    let letter = Regex::new("[A-Za-z]").context("Invalid column letter pattern")?;
    let indices: Vec<usize> = letter
        .find_iter(input)
        .filter_map(|m| m.as_str().chars().next())
        .filter_map(column_letter_to_index)
        .collect();

    if indices.is_empty() {
        anyhow::bail!("No column letters found in '{}'", input);
    }
    Ok(indices)
}

/// `A` -> 0 ... `Z` -> 25, case-insensitive
pub fn column_letter_to_index(letter: char) -> Option<usize> {
    let upper = letter.to_ascii_uppercase();
    upper
        .is_ascii_uppercase()
        .then(|| (upper as u8 - b'A') as usize)
}

/// Spreadsheet-style column name: 0 -> `A`, 25 -> `Z`, 26 -> `AA`
pub fn index_to_column_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column_letters() {
        assert_eq!(parse_column_letters("A,C").unwrap(), vec![0, 2]);
        assert_eq!(parse_column_letters("a、d").unwrap(), vec![0, 3]);
        assert_eq!(parse_column_letters("AB").unwrap(), vec![0, 1]);
        assert_eq!(parse_column_letters(" B ; Z ").unwrap(), vec![1, 25]);
        assert!(parse_column_letters("1,2").is_err());
        assert!(parse_column_letters("").is_err());
    }

    #[test]
    fn test_letter_conversions() {
        assert_eq!(column_letter_to_index('A'), Some(0));
        assert_eq!(column_letter_to_index('z'), Some(25));
        assert_eq!(column_letter_to_index('中'), None);
        assert_eq!(index_to_column_letter(0), "A");
        assert_eq!(index_to_column_letter(25), "Z");
        assert_eq!(index_to_column_letter(26), "AA");
        assert_eq!(index_to_column_letter(701), "ZZ");
    }

    #[test]
    fn test_conflicting_directions_are_rejected() {
        let mut assignment = ColumnAssignment::new();
        assignment.assign_letters("A,B", Direction::ZhToEn).unwrap();
        // Same direction twice is harmless
        assignment.assign_letters("A", Direction::ZhToEn).unwrap();

        let err = assignment.assign_letters("B", Direction::EnToZh).unwrap_err();
        assert!(err.to_string().contains("Column B"));
        assert_eq!(assignment.direction(1), Some(Direction::ZhToEn));
    }

    #[test]
    fn test_columns_by_direction() {
        let mut assignment = ColumnAssignment::new();
        assignment.assign_letters("C,A", Direction::ZhToEn).unwrap();
        assignment.assign_letters("B", Direction::EnToZh).unwrap();

        assert_eq!(assignment.columns(Direction::ZhToEn), vec![0, 2]);
        assert_eq!(assignment.columns(Direction::EnToZh), vec![1]);
        assert_eq!(assignment.directions().len(), 2);
        assert_eq!(assignment.direction(3), None);
    }

    #[test]
    fn test_validate_width() {
        let mut assignment = ColumnAssignment::new();
        assert!(assignment.validate(3).is_err());

        assignment.assign_letters("A,D", Direction::ZhToEn).unwrap();
        let err = assignment.validate(3).unwrap_err();
        assert!(err.to_string().contains("D"));
        assert!(assignment.validate(4).is_ok());

        assert_eq!(ColumnAssignment::all(3, Direction::EnToZh).len(), 3);
    }
}
