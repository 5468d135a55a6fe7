//! Part stores: where a sheet's output artifacts live.
//!
//! A [`PartStore`] is the packaging-side collaborator. The writer asks it to
//! open parts lazily (so unused artifacts are never created), to resolve
//! workbook-level media ids, and to note that a sheet grew comment parts so
//! an external content-manifest step can pick them up. The ZIP/OPC container
//! itself is out of scope here; [`MemoryStore`] keeps parts as named byte
//! buffers that a packager (or a test) can read back.

use std::cell::{Cell as StdCell, RefCell};
use std::collections::BTreeMap;
use std::io;
use std::rc::Rc;

use crate::sink::{MemorySink, PartSink};

/// Part path for a worksheet, e.g. `xl/worksheets/sheet1.xml`.
pub fn worksheet_part(sheet_id: u32) -> String {
    format!("xl/worksheets/sheet{sheet_id}.xml")
}

/// Part path for a worksheet's relationship manifest.
pub fn worksheet_rels_part(sheet_id: u32) -> String {
    format!("xl/worksheets/_rels/sheet{sheet_id}.xml.rels")
}

/// Part path for a sheet's comment body.
pub fn comments_part(sheet_id: u32) -> String {
    format!("xl/comments{sheet_id}.xml")
}

/// Part path for a sheet's legacy VML shapes.
pub fn vml_drawing_part(sheet_id: u32) -> String {
    format!("xl/drawings/vmlDrawing{sheet_id}.vml")
}

/// The packaging collaborator consumed by the streaming writer.
pub trait PartStore {
    type Sink: PartSink;

    /// Create the named part and return its sink. Called at most once per
    /// part; a second open for the same path is a caller bug and should
    /// fail rather than silently interleave two producers.
    fn open_part(&mut self, path: &str) -> io::Result<Self::Sink>;

    /// Resolve a workbook-level media id to its stored file name
    /// (e.g. `image1.png`). Used for the sheet background picture.
    fn media_target(&self, _media_id: u32) -> Option<String> {
        None
    }

    /// Hook invoked when a sheet opens its comment parts, so the packaging
    /// side can record the content-type overrides those parts need.
    fn register_comment_parts(&mut self, _sheet_id: u32) {}
}

/// An in-memory [`PartStore`] keeping each part as a shared byte buffer.
#[derive(Debug, Default)]
pub struct MemoryStore {
    parts: BTreeMap<String, Rc<RefCell<Vec<u8>>>>,
    media: BTreeMap<u32, String>,
    high_water: Option<usize>,
    drain_waits: Rc<StdCell<u64>>,
    comment_sheets: Vec<u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out sinks that saturate past `bytes` unflushed bytes, forcing
    /// the writer through its back-pressure path.
    pub fn with_high_water(bytes: usize) -> Self {
        Self {
            high_water: Some(bytes),
            ..Self::default()
        }
    }

    /// Register a media file so [`PartStore::media_target`] can resolve it.
    pub fn add_media(&mut self, media_id: u32, file_name: impl Into<String>) {
        self.media.insert(media_id, file_name.into());
    }

    /// Finished bytes of a part, if it was ever opened.
    pub fn part(&self, path: &str) -> Option<Vec<u8>> {
        self.parts.get(path).map(|buf| buf.borrow().clone())
    }

    pub fn has_part(&self, path: &str) -> bool {
        self.parts.contains_key(path)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    /// Total number of times any sink blocked waiting for a drain.
    pub fn drain_waits(&self) -> u64 {
        self.drain_waits.get()
    }

    /// Sheets that registered comment parts, in registration order.
    pub fn comment_part_registrations(&self) -> &[u32] {
        &self.comment_sheets
    }
}

impl PartStore for MemoryStore {
    type Sink = MemorySink;

    fn open_part(&mut self, path: &str) -> io::Result<MemorySink> {
        if self.parts.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("part {path} is already open"),
            ));
        }
        let buf = Rc::new(RefCell::new(Vec::new()));
        self.parts.insert(path.to_string(), Rc::clone(&buf));
        let mut sink = MemorySink::new(buf).with_drain_counter(Rc::clone(&self.drain_waits));
        if let Some(mark) = self.high_water {
            sink = sink.with_high_water(mark);
        }
        Ok(sink)
    }

    fn media_target(&self, media_id: u32) -> Option<String> {
        self.media.get(&media_id).cloned()
    }

    fn register_comment_parts(&mut self, sheet_id: u32) {
        self.comment_sheets.push(sheet_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_remain_readable_after_sink_moves() {
        let mut store = MemoryStore::new();
        let mut sink = store.open_part("xl/worksheets/sheet1.xml").unwrap();
        sink.push(b"<worksheet/>").unwrap();
        sink.end().unwrap();

        assert_eq!(
            store.part("xl/worksheets/sheet1.xml").unwrap(),
            b"<worksheet/>"
        );
        assert!(!store.has_part("xl/worksheets/sheet2.xml"));
    }

    #[test]
    fn double_open_is_rejected() {
        let mut store = MemoryStore::new();
        let _sink = store.open_part("xl/comments1.xml").unwrap();
        assert!(store.open_part("xl/comments1.xml").is_err());
    }

    #[test]
    fn part_paths() {
        assert_eq!(worksheet_part(3), "xl/worksheets/sheet3.xml");
        assert_eq!(worksheet_rels_part(3), "xl/worksheets/_rels/sheet3.xml.rels");
        assert_eq!(comments_part(3), "xl/comments3.xml");
        assert_eq!(vml_drawing_part(3), "xl/drawings/vmlDrawing3.vml");
    }
}
