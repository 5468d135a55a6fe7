use serde::{Deserialize, Serialize};

use crate::{CellRef, CellValue};

/// Largest 1-indexed row a worksheet may address.
pub const EXCEL_MAX_ROWS: u32 = 1_048_576;
/// Largest 1-indexed column a worksheet may address (`XFD`).
pub const EXCEL_MAX_COLS: u32 = 16_384;

/// A single cell: value plus per-cell metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// The cell value.
    pub value: CellValue,
    /// Workbook style id; `0` means unstyled.
    pub style_id: u32,
    /// Legacy note attached to the cell, if any.
    pub note: Option<String>,
    /// When the cell is a subordinate member of a merge region, the region's
    /// top-left master cell. Subordinate cells defer identity and formatting
    /// to the master and serialize as empty styled cells.
    pub merge_master: Option<CellRef>,
}

impl Cell {
    /// Construct a cell holding `value` with no styling or metadata.
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// True when the cell carries nothing worth serializing.
    pub fn is_blank(&self) -> bool {
        self.value.is_empty()
            && self.style_id == 0
            && self.note.is_none()
            && self.merge_master.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection() {
        assert!(Cell::default().is_blank());
        assert!(!Cell::new(1.0).is_blank());

        let mut styled = Cell::default();
        styled.style_id = 3;
        assert!(!styled.is_blank());
    }
}
