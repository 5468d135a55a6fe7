//! Row rendering.
//!
//! Serializing a row into `<row>`/`<c>` markup is a collaborator seam: the
//! sheet writer hands a buffered row to a [`RowRenderer`] and forwards
//! whatever comments the renderer extracts. [`MarkupRowRenderer`] is the
//! stock implementation; a [`CellResolver`] decides how strings and style
//! ids map onto workbook-level tables (shared strings, `cellXfs`) without
//! this crate owning those tables.

use std::collections::HashMap;
use std::fmt::Write as _;

use gridstream_model::{Cell, CellRef, CellValue, Comment, Formula};

use crate::rows::Row;
use crate::xml::escape_xml;

/// Maps cell-level references onto workbook-level tables.
pub trait CellResolver {
    /// The `s` attribute value for a cell's style id, or `None` to omit it.
    fn xf_index(&mut self, style_id: u32) -> Option<u32>;

    /// Intern `text` in the workbook shared-string table, returning its
    /// index, or `None` to write the string inline.
    fn shared_string(&mut self, text: &str) -> Option<u32>;
}

/// Resolver used when no workbook tables exist: strings are written inline
/// and style ids pass through as `cellXfs` indices.
#[derive(Debug, Default)]
pub struct InlineStrings;

impl CellResolver for InlineStrings {
    fn xf_index(&mut self, style_id: u32) -> Option<u32> {
        (style_id != 0).then_some(style_id)
    }

    fn shared_string(&mut self, _text: &str) -> Option<u32> {
        None
    }
}

/// The sheet's shared-formula table: formula text to integer index.
///
/// The first cell using a given text becomes the master and writes the text
/// once; later identical formulas reference the master's index.
#[derive(Debug, Default)]
pub struct SharedFormulas {
    indexes: HashMap<String, u32>,
    next: u32,
}

impl SharedFormulas {
    pub fn new() -> Self {
        Self::default()
    }

    /// The index for `text`, plus whether this call made it the master.
    pub fn index_for(&mut self, text: &str) -> (u32, bool) {
        if let Some(&index) = self.indexes.get(text) {
            return (index, false);
        }
        let index = self.next;
        self.next += 1;
        self.indexes.insert(text.to_string(), index);
        (index, true)
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

/// Turns one buffered row into serialized markup plus extracted comments.
pub trait RowRenderer {
    /// Append the row's markup to `out` and return any comments its cells
    /// carry, in ascending column order.
    fn render_row(&mut self, row: &Row, shared: &mut SharedFormulas, out: &mut String)
        -> Vec<Comment>;
}

/// Stock SpreadsheetML row renderer.
#[derive(Debug, Default)]
pub struct MarkupRowRenderer<C: CellResolver> {
    resolver: C,
}

impl<C: CellResolver> MarkupRowRenderer<C> {
    pub fn new(resolver: C) -> Self {
        Self { resolver }
    }
}

impl<C: CellResolver> RowRenderer for MarkupRowRenderer<C> {
    fn render_row(
        &mut self,
        row: &Row,
        shared: &mut SharedFormulas,
        out: &mut String,
    ) -> Vec<Comment> {
        let mut comments = Vec::new();

        let _ = write!(out, r#"<row r="{}""#, row.number());
        if let (Some(min), Some(max)) = (row.min_col(), row.max_col()) {
            let _ = write!(out, r#" spans="{min}:{max}""#);
        }
        if let Some(height) = row.height() {
            let _ = write!(out, r#" ht="{height}" customHeight="1""#);
        }

        if !row.has_content() {
            out.push_str("/>");
            return comments;
        }

        out.push('>');
        for (col, cell) in row.iter_cells() {
            let at = CellRef::new(row.number(), col);
            if let Some(note) = &cell.note {
                comments.push(Comment::new(at, note.clone()));
            }
            self.render_cell(at, cell, shared, out);
        }
        out.push_str("</row>");
        comments
    }
}

impl<C: CellResolver> MarkupRowRenderer<C> {
    fn render_cell(&mut self, at: CellRef, cell: &Cell, shared: &mut SharedFormulas, out: &mut String) {
        let mut attrs = format!(r#" r="{}""#, at.to_a1());
        if let Some(xf) = self.resolver.xf_index(cell.style_id) {
            let _ = write!(attrs, r#" s="{xf}""#);
        }

        // Subordinate merge members defer to their master: empty styled cell.
        if cell.merge_master.is_some() && cell.value.is_empty() {
            let _ = write!(out, "<c{attrs}/>");
            return;
        }

        let mut body = String::new();
        match &cell.value {
            CellValue::Empty => {
                let _ = write!(out, "<c{attrs}/>");
                return;
            }
            CellValue::Number(n) => {
                let _ = write!(body, "<v>{n}</v>");
            }
            CellValue::Boolean(b) => {
                attrs.push_str(r#" t="b""#);
                let _ = write!(body, "<v>{}</v>", u8::from(*b));
            }
            CellValue::Text(text) => match self.resolver.shared_string(text) {
                Some(index) => {
                    attrs.push_str(r#" t="s""#);
                    let _ = write!(body, "<v>{index}</v>");
                }
                None => {
                    attrs.push_str(r#" t="inlineStr""#);
                    let _ = write!(
                        body,
                        r#"<is><t xml:space="preserve">{}</t></is>"#,
                        escape_xml(text)
                    );
                }
            },
            CellValue::Error(e) => {
                attrs.push_str(r#" t="e""#);
                let _ = write!(body, "<v>{}</v>", e.as_str());
            }
            CellValue::Formula(formula) => {
                self.render_formula(at, formula, shared, &mut attrs, &mut body);
            }
        }

        let _ = write!(out, "<c{attrs}>{body}</c>");
    }

    fn render_formula(
        &mut self,
        at: CellRef,
        formula: &Formula,
        shared: &mut SharedFormulas,
        attrs: &mut String,
        body: &mut String,
    ) {
        if formula.shared {
            let (index, master) = shared.index_for(&formula.text);
            if master {
                let _ = write!(
                    body,
                    r#"<f t="shared" ref="{}" si="{index}">{}</f>"#,
                    at.to_a1(),
                    escape_xml(&formula.text)
                );
            } else {
                let _ = write!(body, r#"<f t="shared" si="{index}"/>"#);
            }
        } else {
            let _ = write!(body, "<f>{}</f>", escape_xml(&formula.text));
        }

        match formula.result.as_deref() {
            None | Some(CellValue::Empty) => {}
            Some(CellValue::Number(n)) => {
                let _ = write!(body, "<v>{n}</v>");
            }
            Some(CellValue::Boolean(b)) => {
                attrs.push_str(r#" t="b""#);
                let _ = write!(body, "<v>{}</v>", u8::from(*b));
            }
            Some(CellValue::Text(text)) => {
                attrs.push_str(r#" t="str""#);
                let _ = write!(body, "<v>{}</v>", escape_xml(text));
            }
            Some(CellValue::Error(e)) => {
                attrs.push_str(r#" t="e""#);
                let _ = write!(body, "<v>{}</v>", e.as_str());
            }
            // Nested formula results make no sense; write nothing.
            Some(CellValue::Formula(_)) => {}
        }
    }
}
