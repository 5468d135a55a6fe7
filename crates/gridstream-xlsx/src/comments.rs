//! Cell comment artifacts.
//!
//! Comments produce two coordinated side artifacts: the comment body part
//! (`xl/comments{N}.xml`) and the legacy VML drawing that anchors one note
//! shape per comment (`xl/drawings/vmlDrawing{N}.vml`). Both parts open
//! lazily on the first comment; a sheet without comments produces neither.
//! Body entry and shape are written as a pair before the next comment is
//! touched, so the two artifacts hold the same comments in the same order
//! at every suspension point.

use std::fmt::Write as _;

use gridstream_model::Comment;

use crate::error::SheetWriteError;
use crate::relationships::{RelId, RelationshipRegistry, REL_TYPE_COMMENTS, REL_TYPE_VML_DRAWING};
use crate::sink::PartSink;
use crate::store::{comments_part, vml_drawing_part, PartStore};
use crate::xml::escape_xml;

const COMMENTS_HEADER: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<comments xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    "<authors><author>Author</author></authors>",
    "<commentList>",
);

const VML_HEADER: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<xml xmlns:v="urn:schemas-microsoft-com:vml""#,
    r#" xmlns:o="urn:schemas-microsoft-com:office:office""#,
    r#" xmlns:x="urn:schemas-microsoft-com:office:excel">"#,
    r#"<o:shapelayout v:ext="edit"><o:idmap v:ext="edit" data="1"/></o:shapelayout>"#,
    r#"<v:shapetype id="_x0000_t202" coordsize="21600,21600" o:spt="202""#,
    r#" path="m,l,21600r21600,l21600,xe">"#,
    r#"<v:stroke joinstyle="miter"/>"#,
    r#"<v:path gradientshapeok="t" o:connecttype="rect"/>"#,
    "</v:shapetype>",
);

// VML shape ids conventionally start at 1025 within the first id block.
const SHAPE_ID_BASE: u32 = 1025;

/// Streams a sheet's comment body and legacy shape artifacts in lockstep.
#[derive(Debug)]
pub struct CommentWriter<S: PartSink> {
    sheet_id: u32,
    body_path: String,
    shape_path: String,
    body: Option<S>,
    shapes: Option<S>,
    count: u32,
    shape_rel: Option<RelId>,
}

impl<S: PartSink> CommentWriter<S> {
    pub fn new(sheet_id: u32) -> Self {
        Self {
            sheet_id,
            body_path: comments_part(sheet_id),
            shape_path: vml_drawing_part(sheet_id),
            body: None,
            shapes: None,
            count: 0,
            shape_rel: None,
        }
    }

    /// Number of comments written so far.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The relationship id of the VML drawing, present once any comment has
    /// been written. The worksheet's `<legacyDrawing>` element points at it.
    pub fn legacy_drawing_rel(&self) -> Option<RelId> {
        self.shape_rel
    }

    fn ensure_open<P: PartStore<Sink = S>>(
        &mut self,
        store: &mut P,
        rels: &mut RelationshipRegistry<S>,
    ) -> Result<(), SheetWriteError> {
        if self.body.is_some() {
            return Ok(());
        }

        let mut body = store.open_part(&self.body_path)?;
        body.push_str(COMMENTS_HEADER)?;
        let mut shapes = store.open_part(&self.shape_path)?;
        shapes.push_str(VML_HEADER)?;

        rels.register(
            store,
            REL_TYPE_COMMENTS,
            &format!("../comments{}.xml", self.sheet_id),
            None,
        )?;
        let shape_rel = rels.register(
            store,
            REL_TYPE_VML_DRAWING,
            &format!("../drawings/vmlDrawing{}.vml", self.sheet_id),
            None,
        )?;

        store.register_comment_parts(self.sheet_id);
        self.body = Some(body);
        self.shapes = Some(shapes);
        self.shape_rel = Some(shape_rel);
        Ok(())
    }

    /// Append a batch of comments, body entry and anchor shape paired per
    /// comment. Opens both artifacts on the first non-empty batch.
    pub fn add_batch<P: PartStore<Sink = S>>(
        &mut self,
        store: &mut P,
        rels: &mut RelationshipRegistry<S>,
        comments: &[Comment],
    ) -> Result<(), SheetWriteError> {
        if comments.is_empty() {
            return Ok(());
        }
        self.ensure_open(store, rels)?;

        for comment in comments {
            let index = self.count;
            self.count += 1;

            let mut entry = String::new();
            let _ = write!(
                entry,
                concat!(
                    r#"<comment ref="{}" authorId="0">"#,
                    r#"<text><r><t xml:space="preserve">{}</t></r></text>"#,
                    "</comment>",
                ),
                comment.cell.to_a1(),
                escape_xml(&comment.content),
            );

            let shape = render_shape(index, comment);

            // Pair the writes: both artifacts agree at every pause point.
            if let (Some(body), Some(shapes)) = (self.body.as_mut(), self.shapes.as_mut()) {
                body.push_str(&entry)?;
                shapes.push_str(&shape)?;
            }
        }
        Ok(())
    }

    /// Close both artifacts. No-op when no comment was ever written.
    pub fn commit(&mut self) -> Result<(), SheetWriteError> {
        if let Some(body) = self.body.as_mut() {
            body.push_str("</commentList></comments>")?;
            body.end()?;
        }
        if let Some(shapes) = self.shapes.as_mut() {
            shapes.push_str("</xml>")?;
            shapes.end()?;
        }
        Ok(())
    }
}

fn render_shape(index: u32, comment: &Comment) -> String {
    let mut shape = String::new();
    let _ = write!(
        shape,
        concat!(
            r##"<v:shape id="_x0000_s{id}" type="#_x0000_t202""##,
            r#" style="position:absolute;margin-left:105pt;margin-top:10pt;"#,
            r#"width:108pt;height:59pt;z-index:{z};visibility:hidden""#,
            r##" fillcolor="#ffffe1" o:insetmode="auto">"##,
            r##"<v:fill color2="#ffffe1"/>"##,
            r#"<v:shadow on="t" color="black" obscured="t"/>"#,
            r#"<v:path o:connecttype="none"/>"#,
            r#"<v:textbox style="mso-direction-alt:auto">"#,
            r#"<div style="text-align:left"></div>"#,
            "</v:textbox>",
            r#"<x:ClientData ObjectType="Note">"#,
            "<x:MoveWithCells/>",
            "<x:SizeWithCells/>",
            "<x:AutoFill>False</x:AutoFill>",
            "<x:Row>{row}</x:Row>",
            "<x:Column>{col}</x:Column>",
            "</x:ClientData>",
            "</v:shape>",
        ),
        id = SHAPE_ID_BASE + index,
        z = index + 1,
        // ClientData anchors are 0-based.
        row = comment.cell.row - 1,
        col = comment.cell.col - 1,
    );
    shape
}
