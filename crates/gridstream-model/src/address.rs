use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cell::{EXCEL_MAX_COLS, EXCEL_MAX_ROWS};

/// A reference to a single cell within a worksheet.
///
/// Rows and columns are **1-indexed**:
/// - `row = 1` is Excel row `1`
/// - `col = 1` is Excel column `A`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    /// 1-indexed row.
    pub row: u32,
    /// 1-indexed column.
    pub col: u32,
}

/// Errors produced when parsing A1-style references.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum A1ParseError {
    #[error("empty reference")]
    Empty,
    #[error("reference is missing a column name")]
    MissingColumn,
    #[error("reference is missing a row number")]
    MissingRow,
    #[error("trailing characters after the row number")]
    TrailingCharacters,
    #[error("column is out of range")]
    InvalidColumn,
    #[error("row is out of range")]
    InvalidRow,
}

impl CellRef {
    /// Construct a new [`CellRef`].
    #[inline]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Convert to Excel A1 notation (e.g. `A1`, `BC32`).
    pub fn to_a1(self) -> String {
        format!("{}{}", col_to_name(self.col), self.row)
    }

    /// Parse an Excel A1-style reference (e.g. `A1`, `$B$2`).
    pub fn from_a1(a1: &str) -> Result<Self, A1ParseError> {
        let s = a1.trim();
        if s.is_empty() {
            return Err(A1ParseError::Empty);
        }

        // Accept optional `$` markers.
        let mut idx = 0usize;
        let bytes = s.as_bytes();
        if bytes.get(idx) == Some(&b'$') {
            idx += 1;
        }

        let col_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_alphabetic() {
            idx += 1;
        }

        if idx == col_start {
            return Err(A1ParseError::MissingColumn);
        }

        let col_str = &s[col_start..idx];
        if bytes.get(idx) == Some(&b'$') {
            idx += 1;
        }

        let row_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }

        if idx == row_start {
            return Err(A1ParseError::MissingRow);
        }
        if idx != bytes.len() {
            return Err(A1ParseError::TrailingCharacters);
        }

        let col = name_to_col(col_str)?;
        if col > EXCEL_MAX_COLS {
            return Err(A1ParseError::InvalidColumn);
        }
        let row: u32 = s[row_start..idx]
            .parse()
            .map_err(|_| A1ParseError::InvalidRow)?;
        if row == 0 || row > EXCEL_MAX_ROWS {
            return Err(A1ParseError::InvalidRow);
        }

        Ok(Self { row, col })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// A rectangular region within a worksheet.
///
/// The range is inclusive and always normalized such that:
/// - `start.row <= end.row`
/// - `start.col <= end.col`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: CellRef,
    pub end: CellRef,
}

impl Range {
    /// Construct a new range, normalizing coordinates if needed.
    pub const fn new(a: CellRef, b: CellRef) -> Self {
        let start_row = if a.row <= b.row { a.row } else { b.row };
        let end_row = if a.row <= b.row { b.row } else { a.row };
        let start_col = if a.col <= b.col { a.col } else { b.col };
        let end_col = if a.col <= b.col { b.col } else { a.col };
        Self {
            start: CellRef::new(start_row, start_col),
            end: CellRef::new(end_row, end_col),
        }
    }

    /// Range covering a single cell.
    pub const fn single(cell: CellRef) -> Self {
        Self {
            start: cell,
            end: cell,
        }
    }

    /// Returns true if `cell` lies within this range.
    #[inline]
    pub const fn contains(&self, cell: CellRef) -> bool {
        cell.row >= self.start.row
            && cell.row <= self.end.row
            && cell.col >= self.start.col
            && cell.col <= self.end.col
    }

    /// Returns true if the two ranges share at least one cell.
    ///
    /// The test is edge-inclusive over both the row and column intervals.
    #[inline]
    pub const fn intersects(&self, other: &Range) -> bool {
        self.start.row <= other.end.row
            && self.end.row >= other.start.row
            && self.start.col <= other.end.col
            && self.end.col >= other.start.col
    }

    /// Grow the range to cover `cell`.
    pub fn expand_to(&mut self, cell: CellRef) {
        if cell.row < self.start.row {
            self.start.row = cell.row;
        }
        if cell.col < self.start.col {
            self.start.col = cell.col;
        }
        if cell.row > self.end.row {
            self.end.row = cell.row;
        }
        if cell.col > self.end.col {
            self.end.col = cell.col;
        }
    }

    /// Number of columns in the range.
    #[inline]
    pub const fn width(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Number of rows in the range.
    #[inline]
    pub const fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Returns true if the range is exactly one cell.
    #[inline]
    pub const fn is_single_cell(&self) -> bool {
        self.start.row == self.end.row && self.start.col == self.end.col
    }

    /// Parse an Excel A1-style range like `A1:B2` or a single-cell reference like `C3`.
    pub fn from_a1(a1: &str) -> Result<Self, A1ParseError> {
        let s = a1.trim();
        match s.split_once(':') {
            Some((a, b)) => Ok(Self::new(CellRef::from_a1(a)?, CellRef::from_a1(b)?)),
            None => {
                let cell = CellRef::from_a1(s)?;
                Ok(Self::single(cell))
            }
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl From<CellRef> for Range {
    fn from(cell: CellRef) -> Self {
        Range::single(cell)
    }
}

/// Convert a 1-indexed column number to its Excel name (`1` -> `A`, `28` -> `AB`).
pub fn col_to_name(col: u32) -> String {
    debug_assert!(col >= 1);
    let mut out = [0u8; 8];
    let mut len = 0usize;
    let mut n = col;
    while n > 0 {
        n -= 1;
        out[len] = b'A' + (n % 26) as u8;
        len += 1;
        n /= 26;
    }
    out[..len].reverse();
    // Only ASCII uppercase letters were written.
    String::from_utf8_lossy(&out[..len]).into_owned()
}

/// Convert an Excel column name to its 1-indexed number (`A` -> `1`, `AB` -> `28`).
pub fn name_to_col(name: &str) -> Result<u32, A1ParseError> {
    if name.is_empty() {
        return Err(A1ParseError::MissingColumn);
    }
    let mut col: u32 = 0;
    for ch in name.chars() {
        if !ch.is_ascii_alphabetic() {
            return Err(A1ParseError::InvalidColumn);
        }
        let digit = ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add(digit))
            .ok_or(A1ParseError::InvalidColumn)?;
    }
    Ok(col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cell_ref_a1_round_trip() {
        for (a1, row, col) in [("A1", 1, 1), ("B2", 2, 2), ("Z9", 9, 26), ("AA10", 10, 27)] {
            let cell = CellRef::from_a1(a1).unwrap();
            assert_eq!(cell, CellRef::new(row, col));
            assert_eq!(cell.to_a1(), a1);
        }
    }

    #[test]
    fn cell_ref_accepts_absolute_markers() {
        assert_eq!(CellRef::from_a1("$B$2").unwrap(), CellRef::new(2, 2));
    }

    #[test]
    fn cell_ref_rejects_garbage() {
        assert_eq!(CellRef::from_a1(""), Err(A1ParseError::Empty));
        assert_eq!(CellRef::from_a1("12"), Err(A1ParseError::MissingColumn));
        assert_eq!(CellRef::from_a1("A"), Err(A1ParseError::MissingRow));
        assert_eq!(CellRef::from_a1("A0"), Err(A1ParseError::InvalidRow));
        assert_eq!(CellRef::from_a1("A1x"), Err(A1ParseError::TrailingCharacters));
    }

    #[test]
    fn range_normalizes_and_prints() {
        let range = Range::new(CellRef::new(3, 4), CellRef::new(1, 2));
        assert_eq!(range.to_string(), "B1:D3");
        assert_eq!(Range::from_a1("C3").unwrap().to_string(), "C3");
    }

    #[test]
    fn range_intersection_is_edge_inclusive() {
        let a = Range::from_a1("A1:B2").unwrap();
        let b = Range::from_a1("B2:C3").unwrap();
        let c = Range::from_a1("C3:D4").unwrap();
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn column_names() {
        assert_eq!(col_to_name(1), "A");
        assert_eq!(col_to_name(26), "Z");
        assert_eq!(col_to_name(27), "AA");
        assert_eq!(col_to_name(702), "ZZ");
        assert_eq!(col_to_name(703), "AAA");
        assert_eq!(name_to_col("aa").unwrap(), 27);
    }
}
