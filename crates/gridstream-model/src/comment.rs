use serde::{Deserialize, Serialize};

use crate::CellRef;

/// A legacy cell note (Excel "comment").
///
/// The serializer assigns each comment a 0-based sequence index in arrival
/// order; that index pairs the comment body with its legacy VML shape.
/// Notes carry no author: the body artifact's author table is written
/// before any note arrives, so a forward-only stream can only offer one
/// shared author entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// The cell the note is anchored to.
    pub cell: CellRef,
    /// Plain-text note content.
    pub content: String,
}

impl Comment {
    pub fn new(cell: CellRef, content: impl Into<String>) -> Self {
        Self {
            cell,
            content: content.into(),
        }
    }
}
