//! Streaming serializer for single-worksheet SpreadsheetML parts.
//!
//! The writer streams a worksheet front to back with a bounded window of
//! uncommitted rows: rows are addressable until committed, rendered in
//! ascending order exactly once, then gone. Side artifacts (the relationship
//! manifest, the comment body, the legacy VML shapes) open lazily and stay
//! coordinated with the main part through a shared relationship id space.
//!
//! ```no_run
//! use gridstream_xlsx::{MemoryStore, SheetOptions, SheetWriter};
//!
//! # fn main() -> Result<(), gridstream_xlsx::SheetWriteError> {
//! let mut sheet = SheetWriter::new(MemoryStore::new(), SheetOptions::new(1, "Data"))?;
//! sheet.append_row(vec!["name".into(), "count".into()])?;
//! sheet.append_row(vec!["widgets".into(), 42.0.into()])?;
//! sheet.commit_rows_through(1)?;
//! sheet.commit()?;
//! # Ok(())
//! # }
//! ```

mod comments;
mod error;
mod merges;
mod relationships;
mod render;
mod rows;
mod sink;
mod store;
mod worksheet;
mod xml;

pub use comments::CommentWriter;
pub use error::SheetWriteError;
pub use merges::MergeRegistry;
pub use relationships::{
    RelId, RelationshipRegistry, TargetMode, NS_RELATIONSHIPS, REL_TYPE_COMMENTS,
    REL_TYPE_HYPERLINK, REL_TYPE_IMAGE, REL_TYPE_VML_DRAWING,
};
pub use render::{CellResolver, InlineStrings, MarkupRowRenderer, RowRenderer, SharedFormulas};
pub use rows::{Row, RowBuffer};
pub use sink::{IoSink, MemorySink, PartSink, SinkStatus};
pub use store::{
    comments_part, vml_drawing_part, worksheet_part, worksheet_rels_part, MemoryStore, PartStore,
};
pub use worksheet::{SheetOptions, SheetWriter, WriterState};
