//! The output sink contract.
//!
//! Every artifact (worksheet, relationship manifest, comment body, legacy
//! shapes) streams through a [`PartSink`]. A sink accepts chunks in program
//! order and may report saturation after any write; the producer then blocks
//! in [`PartSink::wait_drained`] until capacity is available. This is the
//! writer's only suspension point: writes are never retried, and a failed
//! write or drain aborts the in-progress commit.

use std::cell::{Cell as StdCell, RefCell};
use std::io::{self, Write};
use std::rc::Rc;

/// Result of handing one chunk to a sink.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SinkStatus {
    /// The sink can accept more data immediately.
    Ready,
    /// The sink accepted the chunk but is saturated; the producer must wait
    /// for it to drain before writing again.
    Saturated,
}

/// A byte sink for one output artifact.
pub trait PartSink {
    /// Hand one chunk to the sink. The chunk is accepted in full; the status
    /// only signals whether the producer should pause.
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<SinkStatus>;

    /// Block until previously accepted chunks have drained.
    fn wait_drained(&mut self) -> io::Result<()>;

    /// Signal that no further chunks will be written.
    fn end(&mut self) -> io::Result<()>;

    /// Write one chunk, honoring back-pressure before returning.
    fn push(&mut self, chunk: &[u8]) -> io::Result<()> {
        if let SinkStatus::Saturated = self.write_chunk(chunk)? {
            self.wait_drained()?;
        }
        Ok(())
    }

    /// [`PartSink::push`] for string fragments.
    fn push_str(&mut self, chunk: &str) -> io::Result<()> {
        self.push(chunk.as_bytes())
    }
}

/// An in-memory sink over a shared buffer.
///
/// The buffer is reference-counted so a part store can keep reading the
/// artifact after the sink has been moved into a writer. An optional
/// high-water mark makes the sink report saturation once that many bytes
/// have accumulated since the last drain, which lets tests exercise the
/// back-pressure path deterministically.
#[derive(Debug)]
pub struct MemorySink {
    buf: Rc<RefCell<Vec<u8>>>,
    high_water: Option<usize>,
    unflushed: usize,
    drain_waits: Rc<StdCell<u64>>,
    ended: bool,
}

impl MemorySink {
    pub fn new(buf: Rc<RefCell<Vec<u8>>>) -> Self {
        Self {
            buf,
            high_water: None,
            unflushed: 0,
            drain_waits: Rc::new(StdCell::new(0)),
            ended: false,
        }
    }

    /// Report saturation whenever more than `bytes` have accumulated since
    /// the last drain.
    pub fn with_high_water(mut self, bytes: usize) -> Self {
        self.high_water = Some(bytes);
        self
    }

    /// Share a drain-wait counter with the creator (typically a store).
    pub fn with_drain_counter(mut self, counter: Rc<StdCell<u64>>) -> Self {
        self.drain_waits = counter;
        self
    }

    /// Number of times a producer blocked on [`PartSink::wait_drained`].
    pub fn drain_waits(&self) -> u64 {
        self.drain_waits.get()
    }
}

impl PartSink for MemorySink {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<SinkStatus> {
        if self.ended {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "sink has already been ended",
            ));
        }
        self.buf.borrow_mut().extend_from_slice(chunk);
        self.unflushed += chunk.len();
        match self.high_water {
            Some(mark) if self.unflushed > mark => Ok(SinkStatus::Saturated),
            _ => Ok(SinkStatus::Ready),
        }
    }

    fn wait_drained(&mut self) -> io::Result<()> {
        self.unflushed = 0;
        self.drain_waits.set(self.drain_waits.get() + 1);
        Ok(())
    }

    fn end(&mut self) -> io::Result<()> {
        self.ended = true;
        Ok(())
    }
}

/// Adapter for any [`std::io::Write`].
///
/// Blocking `write_all` is itself the back-pressure: the call does not
/// return until the OS (or wrapped buffer) has accepted the bytes, so the
/// sink never reports saturation.
#[derive(Debug)]
pub struct IoSink<W: Write> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> PartSink for IoSink<W> {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<SinkStatus> {
        self.inner.write_all(chunk)?;
        Ok(SinkStatus::Ready)
    }

    fn wait_drained(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    fn end(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
