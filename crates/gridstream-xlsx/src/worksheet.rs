//! The streaming worksheet writer.
//!
//! [`SheetWriter`] serializes one worksheet front to back: a static header
//! at construction, row data in ascending order as rows are committed, then
//! the trailing configuration sections and the coordinated side artifacts at
//! [`SheetWriter::commit`]. Committed rows are gone; there is no random
//! access and no rollback. Peak memory is the window of uncommitted rows.

use std::fmt::Write as _;

use gridstream_model::{
    AutoFilter, Cell, CellRef, CellValue, Column, ConditionalFormatting, DataValidation,
    Hyperlink, HyperlinkTarget, PageMargins, PageSetup, Range, SheetProtection, SheetView,
    SheetVisibility,
};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::comments::CommentWriter;
use crate::error::SheetWriteError;
use crate::merges::MergeRegistry;
use crate::relationships::{RelId, RelationshipRegistry, TargetMode, REL_TYPE_HYPERLINK, REL_TYPE_IMAGE};
use crate::render::{InlineStrings, MarkupRowRenderer, RowRenderer, SharedFormulas};
use crate::rows::{Row, RowBuffer};
use crate::sink::PartSink;
use crate::store::{worksheet_part, worksheet_rels_part, PartStore};
use crate::xml::escape_xml;

const NS_SPREADSHEETML: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_DOC_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Static configuration for one sheet, fixed at construction.
#[derive(Clone, Debug)]
pub struct SheetOptions {
    pub id: u32,
    pub name: String,
    pub visibility: SheetVisibility,
    /// Default row height in points.
    pub default_row_height: f64,
    /// Default column width in character units.
    pub default_col_width: Option<f64>,
    /// Tab color as ARGB hex, e.g. `FFFF0000`.
    pub tab_color: Option<String>,
    pub view: SheetView,
}

impl SheetOptions {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            visibility: SheetVisibility::Visible,
            default_row_height: 15.0,
            default_col_width: None,
            tab_color: None,
            view: SheetView::default(),
        }
    }
}

/// Writer lifecycle. Commit is one-shot and irreversible.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WriterState {
    Open,
    Committing,
    Committed,
}

/// Streams one worksheet and its side artifacts into a [`PartStore`].
pub struct SheetWriter<P: PartStore, R: RowRenderer = MarkupRowRenderer<InlineStrings>> {
    store: P,
    renderer: R,
    options: SheetOptions,
    sink: P::Sink,
    rels: RelationshipRegistry<P::Sink>,
    comments: CommentWriter<P::Sink>,
    merges: MergeRegistry,
    rows: RowBuffer,
    shared: SharedFormulas,
    columns: Vec<Column>,
    hyperlinks: Vec<(Hyperlink, Option<RelId>)>,
    validations: Vec<DataValidation>,
    conditionals: Vec<ConditionalFormatting>,
    protection: Option<SheetProtection>,
    auto_filter: Option<AutoFilter>,
    page_setup: Option<PageSetup>,
    page_margins: PageMargins,
    background: Option<u32>,
    data_open: bool,
    dimensions: Option<Range>,
    state: WriterState,
}

impl<P: PartStore> SheetWriter<P> {
    /// Open the worksheet part and stream the static header.
    ///
    /// Construction already writes through the back-pressure path, so a
    /// saturated or failing sink surfaces here rather than later.
    pub fn new(store: P, options: SheetOptions) -> Result<Self, SheetWriteError> {
        Self::with_renderer(store, options, MarkupRowRenderer::default())
    }
}

impl<P: PartStore, R: RowRenderer> SheetWriter<P, R> {
    pub fn with_renderer(
        mut store: P,
        options: SheetOptions,
        renderer: R,
    ) -> Result<Self, SheetWriteError> {
        let mut sink = store.open_part(&worksheet_part(options.id))?;
        sink.push_str(&render_header(&options))?;

        let rels = RelationshipRegistry::new(worksheet_rels_part(options.id));
        let comments = CommentWriter::new(options.id);
        Ok(Self {
            store,
            renderer,
            options,
            sink,
            rels,
            comments,
            merges: MergeRegistry::new(),
            rows: RowBuffer::new(),
            shared: SharedFormulas::new(),
            columns: Vec::new(),
            hyperlinks: Vec::new(),
            validations: Vec::new(),
            conditionals: Vec::new(),
            protection: None,
            auto_filter: None,
            page_setup: None,
            page_margins: PageMargins::default(),
            background: None,
            data_open: false,
            dimensions: None,
            state: WriterState::Open,
        })
    }

    pub fn id(&self) -> u32 {
        self.options.id
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn visibility(&self) -> SheetVisibility {
        self.options.visibility
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Bounding box of every rendered cell so far. Tracked for workbook-level
    /// callers; the streamed part itself never carries a dimension element.
    pub fn dimensions(&self) -> Option<Range> {
        self.dimensions
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    /// Consume the writer and hand the store back, e.g. for packaging.
    pub fn into_store(self) -> P {
        self.store
    }

    fn ensure_open(&self) -> Result<(), SheetWriteError> {
        match self.state {
            WriterState::Open => Ok(()),
            WriterState::Committing => {
                Err(SheetWriteError::InvalidOperation("commit is in progress"))
            }
            WriterState::Committed => Err(SheetWriteError::InvalidOperation(
                "sheet has already been committed",
            )),
        }
    }

    /// The row at 1-based `number`, created if absent.
    pub fn row(&mut self, number: u32) -> Result<&mut Row, SheetWriteError> {
        self.ensure_open()?;
        self.rows.get(number)
    }

    /// The row at `number`, if it is still buffered and was ever touched.
    pub fn find_row(&self, number: u32) -> Option<&Row> {
        self.rows.find(number)
    }

    /// Buffered rows with explicit content, in ascending order.
    pub fn buffered_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.rows()
    }

    /// Every row number in the uncommitted window, populated or not.
    pub fn buffered_rows_with_empty(&self) -> impl Iterator<Item = (u32, Option<&Row>)> {
        self.rows.rows_with_empty()
    }

    /// Create the next row after the current window and fill it from
    /// column 1. Returns the new row's number.
    pub fn append_row(
        &mut self,
        values: impl IntoIterator<Item = CellValue>,
    ) -> Result<u32, SheetWriteError> {
        self.ensure_open()?;
        let number = self.rows.next_row_number();
        self.rows.get(number)?.set_values(values);
        Ok(number)
    }

    /// The cell at `at`, created if absent.
    pub fn cell(&mut self, at: CellRef) -> Result<&mut Cell, SheetWriteError> {
        self.ensure_open()?;
        Ok(self.rows.get(at.row)?.cell_mut(at.col))
    }

    /// Record a merge region and mark its subordinate cells.
    ///
    /// Conflict detection runs before any cell is touched; a rejected merge
    /// leaves both the registry and the row window unchanged.
    pub fn merge_cells(&mut self, range: Range) -> Result<(), SheetWriteError> {
        self.ensure_open()?;
        if range.start.row < self.rows.first_uncommitted() {
            return Err(SheetWriteError::RowCommitted {
                row: range.start.row,
                first_uncommitted: self.rows.first_uncommitted(),
            });
        }
        self.merges.add(range)?;

        let master = range.start;
        for row_number in range.start.row..=range.end.row {
            let row = self.rows.get(row_number)?;
            for col in range.start.col..=range.end.col {
                if row_number == master.row && col == master.col {
                    continue;
                }
                row.cell_mut(col).merge_master = Some(master);
            }
        }
        Ok(())
    }

    /// Attach a hyperlink. External targets allocate their relationship id
    /// immediately, so ids interleave with other registrations in call
    /// order.
    pub fn add_hyperlink(&mut self, link: Hyperlink) -> Result<(), SheetWriteError> {
        self.ensure_open()?;
        let rel = match &link.target {
            HyperlinkTarget::External(uri) => Some(self.rels.register(
                &mut self.store,
                REL_TYPE_HYPERLINK,
                uri,
                Some(TargetMode::External),
            )?),
            HyperlinkTarget::Internal(_) => None,
        };
        self.hyperlinks.push((link, rel));
        Ok(())
    }

    /// Column definitions. Must be set before the first row is rendered:
    /// `<cols>` precedes `<sheetData>` in the stream.
    pub fn set_columns(&mut self, columns: Vec<Column>) -> Result<(), SheetWriteError> {
        self.ensure_open()?;
        if self.data_open {
            return Err(SheetWriteError::InvalidOperation(
                "column definitions must precede row data",
            ));
        }
        self.columns = columns;
        Ok(())
    }

    pub fn set_auto_filter(&mut self, filter: AutoFilter) -> Result<(), SheetWriteError> {
        self.ensure_open()?;
        self.auto_filter = Some(filter);
        Ok(())
    }

    pub fn set_page_setup(&mut self, setup: PageSetup) -> Result<(), SheetWriteError> {
        self.ensure_open()?;
        self.page_setup = Some(setup);
        Ok(())
    }

    pub fn set_page_margins(&mut self, margins: PageMargins) -> Result<(), SheetWriteError> {
        self.ensure_open()?;
        self.page_margins = margins;
        Ok(())
    }

    pub fn set_protection(&mut self, protection: SheetProtection) -> Result<(), SheetWriteError> {
        self.ensure_open()?;
        self.protection = Some(protection);
        Ok(())
    }

    /// Use a workbook-level media id as the sheet background picture. The id
    /// is resolved against the store at commit time.
    pub fn set_background(&mut self, media_id: u32) -> Result<(), SheetWriteError> {
        self.ensure_open()?;
        self.background = Some(media_id);
        Ok(())
    }

    pub fn add_data_validation(
        &mut self,
        validation: DataValidation,
    ) -> Result<(), SheetWriteError> {
        self.ensure_open()?;
        self.validations.push(validation);
        Ok(())
    }

    pub fn add_conditional_formatting(
        &mut self,
        formatting: ConditionalFormatting,
    ) -> Result<(), SheetWriteError> {
        self.ensure_open()?;
        self.conditionals.push(formatting);
        Ok(())
    }

    /// Render and release every buffered row numbered `<= through`, in
    /// ascending order. Released rows can never be addressed again.
    pub fn commit_rows_through(&mut self, through: u32) -> Result<(), SheetWriteError> {
        self.ensure_open()?;
        while let Some(row) = self.rows.pop_next(through) {
            self.write_row(&row)?;
        }
        Ok(())
    }

    /// Drain the window, stream the trailing sections, and close every
    /// artifact. One-shot: the writer only accepts accessor calls afterwards.
    pub fn commit(&mut self) -> Result<(), SheetWriteError> {
        self.ensure_open()?;
        self.state = WriterState::Committing;

        if let Some(last) = self.rows.last_buffered() {
            while let Some(row) = self.rows.pop_next(last) {
                self.write_row(&row)?;
            }
        }
        // A sheet with no rendered rows still gets its (empty) data section.
        self.open_data_section()?;
        self.sink.push_str("</sheetData>")?;

        let trailer = self.render_trailer()?;
        self.sink.push_str(&trailer)?;
        if self.comments.count() > 0 {
            // Opened alongside the first comment.
            if let Some(rel) = self.comments.legacy_drawing_rel() {
                self.sink
                    .push_str(&format!(r#"<legacyDrawing r:id="{rel}"/>"#))?;
            }
        }
        self.sink.push_str("</worksheet>")?;
        self.sink.end()?;

        self.comments.commit()?;
        self.rels.commit()?;
        self.state = WriterState::Committed;
        Ok(())
    }

    /// A streamed sheet cannot be rolled back: bytes are already gone to the
    /// sinks. Fails in every state.
    pub fn discard(&mut self) -> Result<(), SheetWriteError> {
        Err(SheetWriteError::InvalidOperation(
            "a streamed sheet cannot be discarded",
        ))
    }

    fn open_data_section(&mut self) -> Result<(), SheetWriteError> {
        if self.data_open {
            return Ok(());
        }
        let mut header = String::new();
        if !self.columns.is_empty() {
            header.push_str(&render_cols(&self.columns));
        }
        header.push_str("<sheetData>");
        self.sink.push_str(&header)?;
        self.data_open = true;
        Ok(())
    }

    fn write_row(&mut self, row: &Row) -> Result<(), SheetWriteError> {
        if !row.has_content() && row.height().is_none() {
            return Ok(());
        }
        self.open_data_section()?;

        let mut markup = String::new();
        let batch = self.renderer.render_row(row, &mut self.shared, &mut markup);
        self.sink.push_str(&markup)?;

        if let (Some(min), Some(max)) = (row.min_col(), row.max_col()) {
            let lo = CellRef::new(row.number(), min);
            let hi = CellRef::new(row.number(), max);
            match self.dimensions.as_mut() {
                Some(dims) => {
                    dims.expand_to(lo);
                    dims.expand_to(hi);
                }
                None => self.dimensions = Some(Range::new(lo, hi)),
            }
        }

        self.comments.add_batch(&mut self.store, &mut self.rels, &batch)
    }

    /// The fixed-order configuration sections between `</sheetData>` and
    /// `<legacyDrawing>`: background `<picture>` comes last because it may
    /// register an image relationship.
    fn render_trailer(&mut self) -> Result<String, SheetWriteError> {
        let mut out = String::new();

        if let Some(filter) = &self.auto_filter {
            let _ = write!(out, r#"<autoFilter ref="{}"/>"#, filter.range);
        }
        out.push_str(&self.merges.render_block()?);
        out.push_str(&render_hyperlinks(&self.hyperlinks)?);
        out.push_str(&render_conditional_formatting(&self.conditionals)?);
        out.push_str(&render_data_validations(&self.validations)?);
        if let Some(protection) = &self.protection {
            out.push_str(&render_protection(protection));
        }

        let m = &self.page_margins;
        let _ = write!(
            out,
            r#"<pageMargins left="{}" right="{}" top="{}" bottom="{}" header="{}" footer="{}"/>"#,
            m.left, m.right, m.top, m.bottom, m.header, m.footer,
        );
        if let Some(setup) = &self.page_setup {
            out.push_str(&render_page_setup(setup));
        }

        if let Some(media_id) = self.background {
            let file_name = self
                .store
                .media_target(media_id)
                .ok_or(SheetWriteError::UnknownMedia(media_id))?;
            let rel = self.rels.register(
                &mut self.store,
                REL_TYPE_IMAGE,
                &format!("../media/{file_name}"),
                None,
            )?;
            let _ = write!(out, r#"<picture r:id="{rel}"/>"#);
        }
        Ok(out)
    }
}

fn render_header(options: &SheetOptions) -> String {
    let mut header = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\n",
    ));
    let _ = write!(
        header,
        r#"<worksheet xmlns="{NS_SPREADSHEETML}" xmlns:r="{NS_DOC_RELATIONSHIPS}">"#
    );

    if let Some(color) = &options.tab_color {
        let _ = write!(
            header,
            r#"<sheetPr><tabColor rgb="{}"/></sheetPr>"#,
            escape_xml(color)
        );
    }

    header.push_str("<sheetViews><sheetView");
    if options.view.tab_selected {
        header.push_str(r#" tabSelected="1""#);
    }
    header.push_str(r#" workbookViewId="0""#);
    if options.view.has_frozen_panes() {
        header.push('>');
        let _ = write!(
            header,
            r#"<pane xSplit="{}" ySplit="{}" topLeftCell="{}" activePane="bottomRight" state="frozen"/>"#,
            options.view.frozen_cols,
            options.view.frozen_rows,
            options.view.pane_top_left().to_a1(),
        );
        header.push_str("</sheetView>");
    } else {
        header.push_str("/>");
    }
    header.push_str("</sheetViews>");

    let _ = write!(
        header,
        r#"<sheetFormatPr defaultRowHeight="{}""#,
        options.default_row_height
    );
    if let Some(width) = options.default_col_width {
        let _ = write!(header, r#" defaultColWidth="{width}""#);
    }
    header.push_str("/>");
    header
}

fn render_cols(columns: &[Column]) -> String {
    let mut out = String::from("<cols>");
    for col in columns {
        let _ = write!(out, r#"<col min="{}" max="{}""#, col.min, col.max);
        if let Some(width) = col.width {
            let _ = write!(out, r#" width="{width}" customWidth="1""#);
        }
        if col.style_id != 0 {
            let _ = write!(out, r#" style="{}""#, col.style_id);
        }
        if col.hidden {
            out.push_str(r#" hidden="1""#);
        }
        out.push_str("/>");
    }
    out.push_str("</cols>");
    out
}

fn render_hyperlinks(
    links: &[(Hyperlink, Option<RelId>)],
) -> Result<String, SheetWriteError> {
    if links.is_empty() {
        return Ok(String::new());
    }
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Start(BytesStart::new("hyperlinks")))?;
    for (link, rel) in links {
        let cell = link.cell.to_a1();
        let id = rel.map(|r| r.to_string());
        let mut elem = BytesStart::new("hyperlink");
        elem.push_attribute(("ref", cell.as_str()));
        match &link.target {
            HyperlinkTarget::External(_) => match &id {
                Some(id) => elem.push_attribute(("r:id", id.as_str())),
                // External link whose registration was lost: unreachable by
                // construction, skip rather than emit a dangling r:id.
                None => continue,
            },
            HyperlinkTarget::Internal(location) => {
                elem.push_attribute(("location", location.as_str()));
            }
        }
        // The tooltip is independent of target mode.
        if let Some(tooltip) = &link.tooltip {
            elem.push_attribute(("tooltip", tooltip.as_str()));
        }
        writer.write_event(Event::Empty(elem))?;
    }
    writer.write_event(Event::End(BytesEnd::new("hyperlinks")))?;
    Ok(String::from_utf8(writer.into_inner())?)
}

fn render_conditional_formatting(
    blocks: &[ConditionalFormatting],
) -> Result<String, SheetWriteError> {
    let mut writer = Writer::new(Vec::new());
    for block in blocks {
        let sqref = block.sqref.to_string();
        let mut start = BytesStart::new("conditionalFormatting");
        start.push_attribute(("sqref", sqref.as_str()));
        writer.write_event(Event::Start(start))?;

        for rule in &block.rules {
            let mut elem = BytesStart::new("cfRule");
            elem.push_attribute(("type", rule.kind.as_str()));
            if let Some(dxf_id) = rule.dxf_id {
                let dxf = dxf_id.to_string();
                elem.push_attribute(("dxfId", dxf.as_str()));
            }
            let priority = rule.priority.to_string();
            elem.push_attribute(("priority", priority.as_str()));
            if let Some(operator) = &rule.operator {
                elem.push_attribute(("operator", operator.as_str()));
            }
            writer.write_event(Event::Start(elem))?;
            writer.write_event(Event::Start(BytesStart::new("formula")))?;
            writer.write_event(Event::Text(BytesText::new(&rule.formula)))?;
            writer.write_event(Event::End(BytesEnd::new("formula")))?;
            writer.write_event(Event::End(BytesEnd::new("cfRule")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("conditionalFormatting")))?;
    }
    Ok(String::from_utf8(writer.into_inner())?)
}

fn render_data_validations(
    validations: &[DataValidation],
) -> Result<String, SheetWriteError> {
    if validations.is_empty() {
        return Ok(String::new());
    }
    let mut writer = Writer::new(Vec::new());
    let count = validations.len().to_string();
    let mut start = BytesStart::new("dataValidations");
    start.push_attribute(("count", count.as_str()));
    writer.write_event(Event::Start(start))?;

    for validation in validations {
        let mut elem = BytesStart::new("dataValidation");
        elem.push_attribute(("type", validation.kind.as_str()));
        if let Some(operator) = validation.operator {
            elem.push_attribute(("operator", operator.as_str()));
        }
        if validation.allow_blank {
            elem.push_attribute(("allowBlank", "1"));
        }
        let sqref = validation.sqref.to_string();
        elem.push_attribute(("sqref", sqref.as_str()));
        writer.write_event(Event::Start(elem))?;
        for (i, formula) in validation.formulas.iter().take(2).enumerate() {
            let name = if i == 0 { "formula1" } else { "formula2" };
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            writer.write_event(Event::Text(BytesText::new(formula)))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        writer.write_event(Event::End(BytesEnd::new("dataValidation")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("dataValidations")))?;
    Ok(String::from_utf8(writer.into_inner())?)
}

// On-disk attribute sense is inverted from the model: the file records
// which actions stay blocked while protected.
fn render_protection(protection: &SheetProtection) -> String {
    let mut out = String::from(r#"<sheetProtection sheet="1""#);
    if let Some(hash) = &protection.password_hash {
        let _ = write!(out, r#" password="{}""#, escape_xml(hash));
    }
    if !protection.select_locked_cells {
        out.push_str(r#" selectLockedCells="1""#);
    }
    if !protection.select_unlocked_cells {
        out.push_str(r#" selectUnlockedCells="1""#);
    }
    if protection.format_cells {
        out.push_str(r#" formatCells="0""#);
    }
    if protection.insert_rows {
        out.push_str(r#" insertRows="0""#);
    }
    if protection.delete_rows {
        out.push_str(r#" deleteRows="0""#);
    }
    if protection.sort {
        out.push_str(r#" sort="0""#);
    }
    if protection.auto_filter {
        out.push_str(r#" autoFilter="0""#);
    }
    out.push_str("/>");
    out
}

fn render_page_setup(setup: &PageSetup) -> String {
    let mut out = String::from("<pageSetup");
    if let Some(size) = setup.paper_size {
        let _ = write!(out, r#" paperSize="{size}""#);
    }
    let _ = write!(out, r#" orientation="{}""#, setup.orientation.as_str());
    if let Some(scale) = setup.scale {
        let _ = write!(out, r#" scale="{scale}""#);
    }
    if let Some(width) = setup.fit_to_width {
        let _ = write!(out, r#" fitToWidth="{width}""#);
    }
    if let Some(height) = setup.fit_to_height {
        let _ = write!(out, r#" fitToHeight="{height}""#);
    }
    out.push_str("/>");
    out
}
