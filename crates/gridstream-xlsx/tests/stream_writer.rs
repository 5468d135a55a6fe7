//! End-to-end tests over the streaming sheet writer and its artifacts.

use std::io;

use gridstream_model::{CellRef, Hyperlink, HyperlinkTarget, Range};
use gridstream_xlsx::{
    MemoryStore, PartSink, PartStore, SheetOptions, SheetWriteError, SheetWriter, SinkStatus,
    WriterState,
};
use pretty_assertions::assert_eq;

fn new_sheet(store: MemoryStore) -> SheetWriter<MemoryStore> {
    SheetWriter::new(store, SheetOptions::new(1, "Data")).unwrap()
}

fn sheet_xml(store: &MemoryStore) -> String {
    String::from_utf8(store.part("xl/worksheets/sheet1.xml").unwrap()).unwrap()
}

#[test]
fn two_row_round_trip() {
    let mut sheet = new_sheet(MemoryStore::new());
    sheet
        .append_row(vec!["name".into(), "count".into()])
        .unwrap();
    sheet
        .append_row(vec!["widgets".into(), 42.0.into()])
        .unwrap();
    sheet.commit().unwrap();

    assert_eq!(sheet.state(), WriterState::Committed);
    assert_eq!(sheet.dimensions(), Some(Range::from_a1("A1:B2").unwrap()));

    let xml = sheet_xml(sheet.store());
    let first = xml.find(r#"<row r="1" spans="1:2">"#).unwrap();
    let second = xml.find(r#"<row r="2" spans="1:2">"#).unwrap();
    assert!(first < second);
    assert_eq!(xml.matches("<row ").count(), 2);
    assert_eq!(xml.matches("<c ").count(), 4);
    assert!(xml.contains(r#"<c r="B2"><v>42</v></c>"#));
}

#[test]
fn committed_rows_are_gone_for_good() {
    let mut sheet = new_sheet(MemoryStore::new());
    sheet.row(1).unwrap().set_cell(1, 1.0);
    sheet.row(2).unwrap().set_cell(1, 2.0);
    sheet.commit_rows_through(1).unwrap();

    match sheet.row(1) {
        Err(SheetWriteError::RowCommitted {
            row,
            first_uncommitted,
        }) => {
            assert_eq!(row, 1);
            assert_eq!(first_uncommitted, 2);
        }
        other => panic!("expected RowCommitted, got {other:?}"),
    }

    // Row 2 is still in the window and stays mutable.
    sheet.row(2).unwrap().set_cell(2, "late");
    sheet.commit().unwrap();

    let xml = sheet_xml(sheet.store());
    assert_eq!(xml.matches(r#"<row r="1""#).count(), 1);
    assert!(xml.contains(r#"<c r="B2""#));
}

#[test]
fn unused_artifacts_are_never_created() {
    let mut sheet = new_sheet(MemoryStore::new());
    sheet.append_row(vec![1.0.into()]).unwrap();
    sheet.commit().unwrap();

    let store = sheet.into_store();
    let names: Vec<&str> = store.part_names().collect();
    assert_eq!(names, vec!["xl/worksheets/sheet1.xml"]);
}

#[test]
fn relationship_ids_interleave_in_call_order() {
    let mut store = MemoryStore::new();
    store.add_media(7, "image1.png");
    let mut sheet = new_sheet(store);

    sheet
        .add_hyperlink(Hyperlink {
            cell: CellRef::new(1, 1),
            target: HyperlinkTarget::External("https://example.com/a".to_string()),
            tooltip: Some("docs".to_string()),
        })
        .unwrap();
    sheet.set_background(7).unwrap();
    sheet.commit().unwrap();

    let xml = sheet_xml(sheet.store());
    assert!(xml.contains(r#"<hyperlink ref="A1" r:id="rId1" tooltip="docs"/>"#));
    assert!(xml.contains(r#"<picture r:id="rId2"/>"#));

    let manifest = String::from_utf8(
        sheet
            .store()
            .part("xl/worksheets/_rels/sheet1.xml.rels")
            .unwrap(),
    )
    .unwrap();
    assert!(manifest.contains(
        r#"Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/a" TargetMode="External""#
    ));
    assert!(manifest.contains(r#"Id="rId2""#));
    assert!(manifest.contains(r#"Target="../media/image1.png""#));
}

#[test]
fn internal_links_need_no_relationship() {
    let mut sheet = new_sheet(MemoryStore::new());
    sheet
        .add_hyperlink(Hyperlink {
            cell: CellRef::new(2, 1),
            target: HyperlinkTarget::Internal("Sheet2!A1".to_string()),
            tooltip: Some("jump".to_string()),
        })
        .unwrap();
    sheet.commit().unwrap();

    let xml = sheet_xml(sheet.store());
    assert!(xml.contains(r#"<hyperlink ref="A2" location="Sheet2!A1" tooltip="jump"/>"#));
    assert!(!sheet
        .store()
        .has_part("xl/worksheets/_rels/sheet1.xml.rels"));
}

#[test]
fn overlapping_merge_is_rejected_without_side_effects() {
    let mut sheet = new_sheet(MemoryStore::new());
    sheet.merge_cells(Range::from_a1("A1:B2").unwrap()).unwrap();

    match sheet.merge_cells(Range::from_a1("B2:C3").unwrap()) {
        Err(SheetWriteError::MergeConflict { new, existing }) => {
            assert_eq!(new, Range::from_a1("B2:C3").unwrap());
            assert_eq!(existing, Range::from_a1("A1:B2").unwrap());
        }
        other => panic!("expected MergeConflict, got {other:?}"),
    }

    // C3 was part of the rejected merge only; it must not be marked.
    assert!(sheet
        .cell(CellRef::new(3, 3))
        .unwrap()
        .merge_master
        .is_none());
    sheet.commit().unwrap();

    let xml = sheet_xml(sheet.store());
    assert!(xml.contains(r#"<mergeCells count="1"><mergeCell ref="A1:B2"/></mergeCells>"#));
}

#[test]
fn merged_subordinates_render_empty_under_their_master() {
    let mut sheet = new_sheet(MemoryStore::new());
    sheet.row(1).unwrap().set_cell(1, "title");
    sheet.merge_cells(Range::from_a1("A1:B1").unwrap()).unwrap();
    sheet.commit().unwrap();

    let xml = sheet_xml(sheet.store());
    assert!(xml.contains(r#"<c r="A1" t="inlineStr">"#));
    assert!(xml.contains(r#"<c r="B1"/>"#));
}

#[test]
fn comment_artifacts_stay_index_aligned() {
    let mut sheet = new_sheet(MemoryStore::new());
    sheet.row(1).unwrap().set_cell(1, "a").note = Some("first note".to_string());
    sheet.row(3).unwrap().set_cell(2, "b").note = Some("second note".to_string());
    sheet.commit().unwrap();

    let store = sheet.store();
    let body = String::from_utf8(store.part("xl/comments1.xml").unwrap()).unwrap();
    let shapes = String::from_utf8(store.part("xl/drawings/vmlDrawing1.vml").unwrap()).unwrap();

    assert_eq!(body.matches("<comment ").count(), 2);
    assert_eq!(shapes.matches("<v:shape ").count(), 2);
    assert!(body.contains(r#"<comment ref="A1""#));
    assert!(body.contains(r#"<comment ref="B3""#));
    assert!(shapes.contains(r#"id="_x0000_s1025""#));
    assert!(shapes.contains(r#"id="_x0000_s1026""#));
    assert!(shapes.contains("<x:Row>2</x:Row><x:Column>1</x:Column>"));

    // The worksheet points back at the VML drawing.
    let xml = sheet_xml(store);
    assert!(xml.contains(r#"<legacyDrawing r:id="rId2"/>"#));
    assert_eq!(store.comment_part_registrations(), &[1]);
}

#[test]
fn worksheet_is_well_formed_with_sections_in_order() {
    let mut store = MemoryStore::new();
    store.add_media(1, "bg.png");
    let mut sheet = new_sheet(store);

    sheet.row(1).unwrap().set_cell(1, "x").note = Some("note".to_string());
    sheet
        .set_auto_filter(gridstream_model::AutoFilter {
            range: Range::from_a1("A1:A4").unwrap(),
        })
        .unwrap();
    sheet.merge_cells(Range::from_a1("C1:D1").unwrap()).unwrap();
    sheet
        .add_hyperlink(Hyperlink {
            cell: CellRef::new(1, 1),
            target: HyperlinkTarget::External("https://example.com".to_string()),
            tooltip: None,
        })
        .unwrap();
    sheet
        .set_protection(gridstream_model::SheetProtection::default())
        .unwrap();
    sheet
        .set_page_setup(gridstream_model::PageSetup::default())
        .unwrap();
    sheet.set_background(1).unwrap();
    sheet.commit().unwrap();

    let xml = sheet_xml(sheet.store());
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let children: Vec<&str> = doc
        .root_element()
        .children()
        .filter(|n| n.is_element())
        .map(|n| n.tag_name().name())
        .collect();
    assert_eq!(
        children,
        vec![
            "sheetViews",
            "sheetFormatPr",
            "sheetData",
            "autoFilter",
            "mergeCells",
            "hyperlinks",
            "sheetProtection",
            "pageMargins",
            "pageSetup",
            "picture",
            "legacyDrawing",
        ]
    );
}

#[test]
fn empty_sheet_is_still_well_formed() {
    let mut sheet = new_sheet(MemoryStore::new());
    sheet.commit().unwrap();

    let xml = sheet_xml(sheet.store());
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let data = doc
        .descendants()
        .find(|n| n.has_tag_name("sheetData"))
        .unwrap();
    assert_eq!(data.children().count(), 0);
    assert!(sheet.dimensions().is_none());
}

#[test]
fn saturated_sinks_produce_identical_bytes() {
    let run = |store: MemoryStore| -> (Vec<u8>, u64) {
        let mut sheet = new_sheet(store);
        for i in 0..20u32 {
            let row = sheet.append_row(vec![format!("value {i}").into()]).unwrap();
            sheet.commit_rows_through(row).unwrap();
        }
        sheet.row(21).unwrap().set_cell(1, "end").note = Some("done".to_string());
        sheet.commit().unwrap();
        let store = sheet.into_store();
        let waits = store.drain_waits();
        (store.part("xl/worksheets/sheet1.xml").unwrap(), waits)
    };

    let (plain, plain_waits) = run(MemoryStore::new());
    let (squeezed, squeezed_waits) = run(MemoryStore::with_high_water(16));

    assert_eq!(plain, squeezed);
    assert_eq!(plain_waits, 0);
    assert!(squeezed_waits > 0);
}

#[test]
fn mutation_after_commit_is_rejected() {
    let mut sheet = new_sheet(MemoryStore::new());
    sheet.commit().unwrap();

    assert!(matches!(
        sheet.row(1),
        Err(SheetWriteError::InvalidOperation(_))
    ));
    assert!(matches!(
        sheet.append_row(vec![1.0.into()]),
        Err(SheetWriteError::InvalidOperation(_))
    ));
    assert!(matches!(
        sheet.merge_cells(Range::from_a1("A1:B2").unwrap()),
        Err(SheetWriteError::InvalidOperation(_))
    ));
    assert!(matches!(
        sheet.commit(),
        Err(SheetWriteError::InvalidOperation(_))
    ));
}

/// A sink that fails once a byte budget is exhausted.
struct FailingSink {
    remaining: usize,
}

impl PartSink for FailingSink {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<SinkStatus> {
        if chunk.len() > self.remaining {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "sink gave out"));
        }
        self.remaining -= chunk.len();
        Ok(SinkStatus::Ready)
    }

    fn wait_drained(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn end(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct FailingStore {
    budget: usize,
}

impl PartStore for FailingStore {
    type Sink = FailingSink;

    fn open_part(&mut self, _path: &str) -> io::Result<FailingSink> {
        Ok(FailingSink {
            remaining: self.budget,
        })
    }
}

#[test]
fn sink_failure_aborts_the_commit() {
    let mut sheet = SheetWriter::new(
        FailingStore { budget: 4096 },
        SheetOptions::new(1, "Flaky"),
    )
    .unwrap();

    let result = (0..10_000u32).try_for_each(|_| {
        let row = sheet.append_row(vec!["some moderately long text".into()])?;
        sheet.commit_rows_through(row)
    });

    match result {
        Err(SheetWriteError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::WriteZero),
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn construction_fails_when_the_part_cannot_open() {
    struct ClosedStore;
    impl PartStore for ClosedStore {
        type Sink = FailingSink;
        fn open_part(&mut self, _path: &str) -> io::Result<FailingSink> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    match SheetWriter::new(ClosedStore, SheetOptions::new(1, "Nope")) {
        Err(SheetWriteError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
        other => panic!("expected Io error, got {:?}", other.map(|_| ())),
    }
}
