//! In-memory data model for gridstream worksheets.
//!
//! This crate holds the types shared between the streaming serializer
//! (`gridstream-xlsx`) and its callers: cell references and ranges in A1
//! notation, cell values, cells, comments, hyperlinks, and the sheet-level
//! configuration blocks (columns, views, page setup, protection, filters,
//! validations, conditional formatting).
//!
//! Rows and columns are **1-based** throughout, matching the row numbers
//! that appear on disk in SpreadsheetML (`<row r="1">` is the first row).

mod address;
mod cell;
mod comment;
mod sheet;
mod value;

pub use address::{col_to_name, name_to_col, A1ParseError, CellRef, Range};
pub use cell::{Cell, EXCEL_MAX_COLS, EXCEL_MAX_ROWS};
pub use comment::Comment;
pub use sheet::{
    AutoFilter, CfRule, CfRuleKind, Column, ConditionalFormatting, DataValidation,
    DataValidationKind, DataValidationOperator, Hyperlink, HyperlinkTarget, Orientation,
    PageMargins, PageSetup, SheetProtection, SheetView, SheetVisibility,
};
pub use value::{CellValue, ErrorValue, Formula};
