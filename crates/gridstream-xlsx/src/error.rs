use gridstream_model::Range;
use thiserror::Error;

/// Errors surfaced by the streaming worksheet writer.
///
/// All variants propagate synchronously to the caller of the triggering
/// operation; nothing is retried internally. An [`SheetWriteError::Io`]
/// during commit aborts the sheet with no partial-artifact cleanup: bytes
/// already flushed to any sink stay as they are.
#[derive(Debug, Error)]
pub enum SheetWriteError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
    #[error("row {row} has already been committed (first uncommitted row is {first_uncommitted})")]
    RowCommitted { row: u32, first_uncommitted: u32 },
    #[error("merge {new} overlaps existing merge {existing}")]
    MergeConflict { new: Range, existing: Range },
    #[error("unknown background media id {0}")]
    UnknownMedia(u32),
}
