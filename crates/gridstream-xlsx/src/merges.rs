//! Merge region registry.
//!
//! Tracks the rectangular merge regions of one sheet and guarantees that no
//! two regions ever overlap. Recording a region and marking its subordinate
//! cells are deliberately separate operations: the registry only records;
//! the sheet writer marks cells after conflict detection has run to
//! completion, so a rejected merge never leaves partial cell state behind.

use gridstream_model::Range;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::error::SheetWriteError;

#[derive(Debug, Default)]
pub struct MergeRegistry {
    regions: Vec<Range>,
}

impl MergeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new merge region.
    ///
    /// The new rectangle is checked against every recorded region with an
    /// edge-inclusive intersection test before anything is mutated; on
    /// conflict the registry is left exactly as it was.
    pub fn add(&mut self, range: Range) -> Result<(), SheetWriteError> {
        for existing in &self.regions {
            if existing.intersects(&range) {
                return Err(SheetWriteError::MergeConflict {
                    new: range,
                    existing: *existing,
                });
            }
        }
        self.regions.push(range);
        Ok(())
    }

    pub fn regions(&self) -> &[Range] {
        &self.regions
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Render the `<mergeCells>` block, or an empty string when there are no
    /// regions.
    pub fn render_block(&self) -> Result<String, SheetWriteError> {
        if self.regions.is_empty() {
            return Ok(String::new());
        }

        let mut writer = Writer::new(Vec::new());
        let count = self.regions.len().to_string();
        let mut start = BytesStart::new("mergeCells");
        start.push_attribute(("count", count.as_str()));
        writer.write_event(Event::Start(start))?;

        for merge in &self.regions {
            let range = merge.to_string();
            let mut elem = BytesStart::new("mergeCell");
            elem.push_attribute(("ref", range.as_str()));
            writer.write_event(Event::Empty(elem))?;
        }

        writer.write_event(Event::End(BytesEnd::new("mergeCells")))?;
        Ok(String::from_utf8(writer.into_inner())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn overlap_is_rejected_and_registry_unchanged() {
        let mut merges = MergeRegistry::new();
        merges.add(Range::from_a1("A1:B2").unwrap()).unwrap();

        let overlapping = Range::from_a1("B2:C3").unwrap();
        match merges.add(overlapping) {
            Err(SheetWriteError::MergeConflict { new, existing }) => {
                assert_eq!(new, overlapping);
                assert_eq!(existing, Range::from_a1("A1:B2").unwrap());
            }
            other => panic!("expected MergeConflict, got {other:?}"),
        }

        assert_eq!(merges.regions(), &[Range::from_a1("A1:B2").unwrap()]);
    }

    #[test]
    fn disjoint_regions_accumulate() {
        let mut merges = MergeRegistry::new();
        merges.add(Range::from_a1("A1:B2").unwrap()).unwrap();
        merges.add(Range::from_a1("C3:D4").unwrap()).unwrap();
        assert_eq!(merges.regions().len(), 2);
    }

    #[test]
    fn render_block_lists_regions_in_insertion_order() {
        let mut merges = MergeRegistry::new();
        merges.add(Range::from_a1("A1:B2").unwrap()).unwrap();
        merges.add(Range::from_a1("D1:E1").unwrap()).unwrap();

        let block = merges.render_block().unwrap();
        assert_eq!(
            block,
            r#"<mergeCells count="2"><mergeCell ref="A1:B2"/><mergeCell ref="D1:E1"/></mergeCells>"#
        );
        assert_eq!(MergeRegistry::new().render_block().unwrap(), "");
    }

    fn arb_range() -> impl Strategy<Value = Range> {
        (1u32..40, 1u32..40, 1u32..10, 1u32..10).prop_map(|(row, col, h, w)| {
            Range::new(
                gridstream_model::CellRef::new(row, col),
                gridstream_model::CellRef::new(row + h - 1, col + w - 1),
            )
        })
    }

    proptest! {
        #[test]
        fn second_add_succeeds_iff_disjoint(a in arb_range(), b in arb_range()) {
            let mut merges = MergeRegistry::new();
            merges.add(a).unwrap();
            let result = merges.add(b);
            prop_assert_eq!(result.is_ok(), !a.intersects(&b));
            // Rejection never disturbs recorded state.
            prop_assert_eq!(merges.regions()[0], a);
        }
    }
}
