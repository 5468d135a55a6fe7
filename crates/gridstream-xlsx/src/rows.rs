//! Bounded row window.
//!
//! Rows live only inside the window `[first_uncommitted, first_uncommitted
//! + buffered)`. The buffer is a deque of optional row slots indexed by
//! `row_number - first_uncommitted`; addressing a row creates that row only
//! (gap slots in between stay unmaterialized), and committing a row frees
//! its slot and advances the cursor, after which the row number can never
//! be addressed again.

use std::collections::VecDeque;

use gridstream_model::{Cell, CellValue, EXCEL_MAX_COLS, EXCEL_MAX_ROWS};

use crate::error::SheetWriteError;

/// One buffered worksheet row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    number: u32,
    cells: Vec<Option<Cell>>,
    height: Option<f64>,
}

impl Row {
    pub(crate) fn new(number: u32) -> Self {
        Self {
            number,
            cells: Vec::new(),
            height: None,
        }
    }

    /// 1-based row number.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// The cell at 1-based `col`, created empty if absent.
    ///
    /// # Panics
    ///
    /// Panics if `col` is 0 or greater than [`EXCEL_MAX_COLS`].
    pub fn cell_mut(&mut self, col: u32) -> &mut Cell {
        assert!(
            col >= 1 && col <= EXCEL_MAX_COLS,
            "column {col} out of range"
        );
        let idx = (col - 1) as usize;
        if self.cells.len() <= idx {
            self.cells.resize(idx + 1, None);
        }
        self.cells[idx].get_or_insert_with(Cell::default)
    }

    /// The cell at 1-based `col`, if it was ever touched.
    pub fn cell(&self, col: u32) -> Option<&Cell> {
        let idx = col.checked_sub(1)? as usize;
        self.cells.get(idx)?.as_ref()
    }

    /// Assign `value` to the cell at `col`.
    pub fn set_cell(&mut self, col: u32, value: impl Into<CellValue>) -> &mut Cell {
        let cell = self.cell_mut(col);
        cell.value = value.into();
        cell
    }

    /// Assign `values` to consecutive cells starting at column 1.
    pub fn set_values(&mut self, values: impl IntoIterator<Item = CellValue>) {
        for (i, value) in values.into_iter().enumerate() {
            self.set_cell(i as u32 + 1, value);
        }
    }

    /// Explicit row height in points.
    pub fn set_height(&mut self, height: f64) {
        self.height = Some(height);
    }

    pub fn height(&self) -> Option<f64> {
        self.height
    }

    /// True when any cell carries something worth serializing.
    pub fn has_content(&self) -> bool {
        self.cells
            .iter()
            .any(|slot| slot.as_ref().is_some_and(|cell| !cell.is_blank()))
    }

    /// First occupied 1-based column.
    pub fn min_col(&self) -> Option<u32> {
        self.iter_cells().next().map(|(col, _)| col)
    }

    /// Last occupied 1-based column.
    pub fn max_col(&self) -> Option<u32> {
        self.iter_cells().last().map(|(col, _)| col)
    }

    /// Occupied cells in ascending column order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, &Cell)> {
        self.cells.iter().enumerate().filter_map(|(idx, slot)| {
            let cell = slot.as_ref()?;
            if cell.is_blank() {
                return None;
            }
            Some((idx as u32 + 1, cell))
        })
    }
}

/// The bounded window of uncommitted rows.
#[derive(Debug)]
pub struct RowBuffer {
    first_uncommitted: u32,
    slots: VecDeque<Option<Row>>,
}

impl Default for RowBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RowBuffer {
    pub fn new() -> Self {
        Self {
            first_uncommitted: 1,
            slots: VecDeque::new(),
        }
    }

    /// The commit cursor: lowest row number that has not been rendered.
    pub fn first_uncommitted(&self) -> u32 {
        self.first_uncommitted
    }

    /// Row number [`RowBuffer::append`]-style creation would target next.
    pub fn next_row_number(&self) -> u32 {
        self.first_uncommitted + self.slots.len() as u32
    }

    /// Highest buffered row number, if the window is non-empty.
    pub fn last_buffered(&self) -> Option<u32> {
        let len = self.slots.len() as u32;
        (len > 0).then(|| self.first_uncommitted + len - 1)
    }

    /// The row at `number`, created if absent.
    ///
    /// Creation materializes only the addressed row; any implied gap rows
    /// stay empty slots. Addressing a row below the cursor fails: that row
    /// has already been committed and freed.
    pub fn get(&mut self, number: u32) -> Result<&mut Row, SheetWriteError> {
        if number < self.first_uncommitted {
            return Err(SheetWriteError::RowCommitted {
                row: number,
                first_uncommitted: self.first_uncommitted,
            });
        }
        if number == 0 || number > EXCEL_MAX_ROWS {
            return Err(SheetWriteError::InvalidOperation("row number out of range"));
        }
        let idx = (number - self.first_uncommitted) as usize;
        while self.slots.len() <= idx {
            self.slots.push_back(None);
        }
        Ok(self.slots[idx].get_or_insert_with(|| Row::new(number)))
    }

    /// The row at `number` if it is buffered and was materialized.
    pub fn find(&self, number: u32) -> Option<&Row> {
        let idx = number.checked_sub(self.first_uncommitted)? as usize;
        self.slots.get(idx)?.as_ref()
    }

    /// Materialized rows in ascending order.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    /// Every row number in the window, materialized or not, in ascending
    /// order.
    pub fn rows_with_empty(&self) -> impl Iterator<Item = (u32, Option<&Row>)> {
        let first = self.first_uncommitted;
        self.slots
            .iter()
            .enumerate()
            .map(move |(idx, slot)| (first + idx as u32, slot.as_ref()))
    }

    /// Pop the next materialized row with number `<= through`, advancing the
    /// cursor past every slot it passes (and past `through` itself once the
    /// window is exhausted). Returns rows in strictly ascending order.
    pub fn pop_next(&mut self, through: u32) -> Option<Row> {
        loop {
            if self.first_uncommitted > through {
                return None;
            }
            if self.slots.is_empty() {
                self.first_uncommitted = through.saturating_add(1);
                return None;
            }
            self.first_uncommitted += 1;
            if let Some(row) = self.slots.pop_front().flatten() {
                return Some(row);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn get_materializes_only_the_addressed_row() {
        let mut rows = RowBuffer::new();
        rows.get(5).unwrap().set_cell(1, "x");

        assert!(rows.find(5).is_some());
        for gap in 1..5 {
            assert!(rows.find(gap).is_none(), "row {gap} should be a gap slot");
        }
        assert_eq!(rows.next_row_number(), 6);
    }

    #[test]
    fn addressing_a_committed_row_fails() {
        let mut rows = RowBuffer::new();
        rows.get(1).unwrap().set_cell(1, 1.0);
        rows.get(2).unwrap().set_cell(1, 2.0);

        let drained = rows.pop_next(1).unwrap();
        assert_eq!(drained.number(), 1);

        match rows.get(1) {
            Err(SheetWriteError::RowCommitted {
                row,
                first_uncommitted,
            }) => {
                assert_eq!(row, 1);
                assert_eq!(first_uncommitted, 2);
            }
            other => panic!("expected RowCommitted, got {other:?}"),
        }
    }

    #[test]
    fn pop_next_is_ascending_and_skips_gaps() {
        let mut rows = RowBuffer::new();
        rows.get(2).unwrap().set_cell(1, "b");
        rows.get(4).unwrap().set_cell(1, "d");

        let mut numbers = Vec::new();
        while let Some(row) = rows.pop_next(10) {
            numbers.push(row.number());
        }
        assert_eq!(numbers, vec![2, 4]);
        // Cursor advanced past the requested bound.
        assert_eq!(rows.first_uncommitted(), 11);
    }

    #[test]
    fn rows_with_empty_walks_the_whole_window() {
        let mut rows = RowBuffer::new();
        rows.get(3).unwrap();

        let window: Vec<(u32, bool)> = rows
            .rows_with_empty()
            .map(|(n, row)| (n, row.is_some()))
            .collect();
        assert_eq!(window, vec![(1, false), (2, false), (3, true)]);
    }

    #[test]
    fn row_content_and_bounds() {
        let mut row = Row::new(1);
        assert!(!row.has_content());
        row.set_cell(3, "c");
        row.set_cell(7, 1.0);
        assert!(row.has_content());
        assert_eq!(row.min_col(), Some(3));
        assert_eq!(row.max_col(), Some(7));
        assert_eq!(row.iter_cells().count(), 2);
        assert!(row.cell(4).is_none());
    }
}
