//! Sheet-level configuration blocks.
//!
//! These are the static (non-row) sections a worksheet serializes: column
//! definitions, views, page setup, protection, the auto-filter, data
//! validations, and conditional formatting. They intentionally model only
//! the attributes the streaming writer emits.

use serde::{Deserialize, Serialize};

use crate::{CellRef, Range};

/// Worksheet visibility, as recorded at the workbook level.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SheetVisibility {
    #[default]
    Visible,
    Hidden,
    VeryHidden,
}

/// A column definition covering the 1-indexed span `min..=max`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub min: u32,
    pub max: u32,
    /// Width in character units; `None` uses the sheet default.
    pub width: Option<f64>,
    /// Workbook style id applied to the whole column; `0` means unstyled.
    pub style_id: u32,
    pub hidden: bool,
}

impl Column {
    pub fn new(min: u32, max: u32) -> Self {
        Self {
            min,
            max,
            width: None,
            style_id: 0,
            hidden: false,
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }
}

/// A sheet view. Only pane freezing and tab selection are modeled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetView {
    /// Number of frozen rows at the top.
    pub frozen_rows: u32,
    /// Number of frozen columns on the left.
    pub frozen_cols: u32,
    pub tab_selected: bool,
}

impl SheetView {
    pub fn has_frozen_panes(&self) -> bool {
        self.frozen_rows > 0 || self.frozen_cols > 0
    }

    /// Top-left cell of the scrollable (bottom-right) pane.
    pub fn pane_top_left(&self) -> CellRef {
        CellRef::new(self.frozen_rows + 1, self.frozen_cols + 1)
    }
}

/// Page orientation for printing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// Print page setup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    pub orientation: Orientation,
    /// Paper size code (1 = Letter, 9 = A4).
    pub paper_size: Option<u32>,
    /// Scale percentage (10-400).
    pub scale: Option<u32>,
    pub fit_to_width: Option<u32>,
    pub fit_to_height: Option<u32>,
}

/// Print margins in inches. Defaults match Excel's "Normal" margins.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageMargins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub header: f64,
    pub footer: f64,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            left: 0.7,
            right: 0.7,
            top: 0.75,
            bottom: 0.75,
            header: 0.3,
            footer: 0.3,
        }
    }
}

/// Sheet protection flags. `true` means the action is *allowed* while the
/// sheet is protected, mirroring the sense of the on-disk attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetProtection {
    /// Legacy 16-bit password hash, uppercase hex.
    pub password_hash: Option<String>,
    pub select_locked_cells: bool,
    pub select_unlocked_cells: bool,
    pub format_cells: bool,
    pub insert_rows: bool,
    pub delete_rows: bool,
    pub sort: bool,
    pub auto_filter: bool,
}

impl Default for SheetProtection {
    fn default() -> Self {
        Self {
            password_hash: None,
            select_locked_cells: true,
            select_unlocked_cells: true,
            format_cells: false,
            insert_rows: false,
            delete_rows: false,
            sort: false,
            auto_filter: false,
        }
    }
}

/// Auto-filter over a rectangular range.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoFilter {
    pub range: Range,
}

/// Data validation rule kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataValidationKind {
    List,
    Whole,
    Decimal,
    Date,
    TextLength,
    Custom,
}

impl DataValidationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            DataValidationKind::List => "list",
            DataValidationKind::Whole => "whole",
            DataValidationKind::Decimal => "decimal",
            DataValidationKind::Date => "date",
            DataValidationKind::TextLength => "textLength",
            DataValidationKind::Custom => "custom",
        }
    }
}

/// Comparison operators for bounded validation kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataValidationOperator {
    Between,
    NotBetween,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl DataValidationOperator {
    pub const fn as_str(self) -> &'static str {
        match self {
            DataValidationOperator::Between => "between",
            DataValidationOperator::NotBetween => "notBetween",
            DataValidationOperator::Equal => "equal",
            DataValidationOperator::NotEqual => "notEqual",
            DataValidationOperator::GreaterThan => "greaterThan",
            DataValidationOperator::LessThan => "lessThan",
            DataValidationOperator::GreaterThanOrEqual => "greaterThanOrEqual",
            DataValidationOperator::LessThanOrEqual => "lessThanOrEqual",
        }
    }
}

/// A data validation rule applied to `sqref`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataValidation {
    pub sqref: Range,
    pub kind: DataValidationKind,
    pub operator: Option<DataValidationOperator>,
    /// One or two formulas depending on kind/operator.
    pub formulas: Vec<String>,
    pub allow_blank: bool,
}

/// Conditional formatting rule kinds. Only the two rule shapes the writer
/// emits are modeled; both carry a single formula.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CfRuleKind {
    /// Cell value comparison (`cellIs` with an operator attribute).
    CellIs,
    /// Formula returning TRUE/FALSE (`expression`).
    Expression,
}

impl CfRuleKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            CfRuleKind::CellIs => "cellIs",
            CfRuleKind::Expression => "expression",
        }
    }
}

/// One conditional formatting rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CfRule {
    pub kind: CfRuleKind,
    /// Operator for [`CfRuleKind::CellIs`] rules (e.g. `greaterThan`).
    pub operator: Option<String>,
    pub formula: String,
    /// Lower numbers win.
    pub priority: u32,
    /// Differential style id in the workbook styles part.
    pub dxf_id: Option<u32>,
}

/// A conditional formatting block: one range, one or more rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionalFormatting {
    pub sqref: Range,
    pub rules: Vec<CfRule>,
}

/// A cell hyperlink.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    pub cell: CellRef,
    pub target: HyperlinkTarget,
    pub tooltip: Option<String>,
}

/// Where a hyperlink points.
///
/// External targets are stored as relationships with `TargetMode="External"`;
/// internal targets are stored inline as a `location` attribute and need no
/// relationship.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum HyperlinkTarget {
    /// External URI (http, mailto, file, ...).
    External(String),
    /// In-workbook location, e.g. `Sheet2!A1`.
    Internal(String),
}
