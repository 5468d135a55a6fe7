//! Per-sheet relationship registry.
//!
//! One registry instance owns a sheet's entire relationship identifier
//! space. Hyperlinks, media, and comment parts all allocate from the same
//! monotonic `rIdN` sequence, strictly in call order, so identifiers are
//! provably single-owner and never reused. The manifest part is opened
//! lazily on the first registration; if nothing is ever registered, no
//! manifest artifact exists at all.

use core::fmt;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Writer;

use crate::error::SheetWriteError;
use crate::sink::PartSink;
use crate::store::PartStore;

pub const NS_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

pub const REL_TYPE_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
pub const REL_TYPE_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub const REL_TYPE_COMMENTS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";
pub const REL_TYPE_VML_DRAWING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/vmlDrawing";

/// An allocated relationship identifier, displayed as `rIdN`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RelId(u32);

impl RelId {
    /// The 1-based position in the sheet's identifier sequence.
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rId{}", self.0)
    }
}

/// `TargetMode` attribute for relationship records that carry one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TargetMode {
    External,
}

/// Allocates identifiers and streams the relationship manifest.
#[derive(Debug)]
pub struct RelationshipRegistry<S: PartSink> {
    part_path: String,
    sink: Option<S>,
    count: u32,
}

impl<S: PartSink> RelationshipRegistry<S> {
    pub fn new(part_path: String) -> Self {
        Self {
            part_path,
            sink: None,
            count: 0,
        }
    }

    /// Allocate the next identifier and append one manifest record.
    ///
    /// Identifiers are assigned strictly in call order regardless of the
    /// relationship type, and are never reordered or renumbered.
    pub fn register<P: PartStore<Sink = S>>(
        &mut self,
        store: &mut P,
        type_uri: &str,
        target: &str,
        mode: Option<TargetMode>,
    ) -> Result<RelId, SheetWriteError> {
        if self.sink.is_none() {
            let mut sink = store.open_part(&self.part_path)?;
            sink.push_str(&format!(
                concat!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                    "\n",
                    r#"<Relationships xmlns="{}">"#,
                ),
                NS_RELATIONSHIPS,
            ))?;
            self.sink = Some(sink);
        }

        self.count += 1;
        let id = RelId(self.count);

        let mut writer = Writer::new(Vec::new());
        let id_attr = id.to_string();
        let mut elem = BytesStart::new("Relationship");
        elem.push_attribute(("Id", id_attr.as_str()));
        elem.push_attribute(("Type", type_uri));
        elem.push_attribute(("Target", target));
        if let Some(TargetMode::External) = mode {
            elem.push_attribute(("TargetMode", "External"));
        }
        writer.write_event(Event::Empty(elem))?;
        let record = writer.into_inner();

        // Opened above, on this call or an earlier one.
        if let Some(sink) = self.sink.as_mut() {
            sink.push(&record)?;
        }
        Ok(id)
    }

    /// Number of relationships registered so far.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Close the manifest. A registry that never registered anything has no
    /// artifact to close and this is a no-op.
    pub fn commit(&mut self) -> Result<(), SheetWriteError> {
        if let Some(sink) = self.sink.as_mut() {
            sink.push_str("</Relationships>")?;
            sink.end()?;
        }
        Ok(())
    }
}
