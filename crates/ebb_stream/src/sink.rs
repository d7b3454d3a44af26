//! Sink-side contracts and the callback operation table.
//!
//! A sink is the caller-owned destination for generated bytes: a file, a
//! growable buffer, a socket. Sinks implement [`ForwardSink`] (append +
//! optional flush) or [`RandomAccessSink`] (adds patch + optional
//! reposition). [`SinkCallbacks`] assembles a sink from individual
//! closures, so a caller can wire the operations to anything without
//! defining a type.

use std::fmt;
use std::io;

/// Destination for forward-only output.
pub trait ForwardSink {
    /// Append `buf` at the sink's current logical end.
    fn append(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Commit buffered state. Invoked at most once, at end of stream life.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Destination for random-access output.
///
/// The sink must present a logically contiguous, growable byte store: a
/// patch whose `offset + len` exceeds the current extent grows the store
/// and zero-fills the gap, so unwritten intermediate bytes later read as
/// zero rather than garbage.
pub trait RandomAccessSink: ForwardSink {
    /// Write `buf` at absolute `offset`, growing the store as needed.
    fn patch(&mut self, buf: &[u8], offset: u64) -> io::Result<()>;

    /// Realign the sink's notion of the append cursor.
    fn reposition(&mut self, offset: u64) -> io::Result<()> {
        let _ = offset;
        Ok(())
    }
}

type AppendFn<'a> = Box<dyn FnMut(&[u8]) -> io::Result<()> + 'a>;
type PatchFn<'a> = Box<dyn FnMut(&[u8], u64) -> io::Result<()> + 'a>;
type RepositionFn<'a> = Box<dyn FnMut(u64) -> io::Result<()> + 'a>;
type FlushFn<'a> = Box<dyn FnMut() -> io::Result<()> + 'a>;

/// A sink assembled from individual closures.
///
/// This is the operation table the emission entry points accept: append
/// and patch are required there, reposition and flush are optional. A
/// missing optional operation succeeds as a no-op; a missing required one
/// reports failure when invoked, which latches the stream driving it. The
/// closures own whatever context they capture; the table is borrowed by
/// one stream for the duration of one emission.
///
/// ```
/// use ebb_stream::{ForwardSink, SinkCallbacks};
///
/// let mut seen = Vec::new();
/// let mut sink = SinkCallbacks::new().on_append(|buf| {
///     seen.extend_from_slice(buf);
///     Ok(())
/// });
/// sink.append(b"hi").unwrap();
/// drop(sink);
/// assert_eq!(seen, b"hi");
/// ```
#[derive(Default)]
pub struct SinkCallbacks<'a> {
    append: Option<AppendFn<'a>>,
    patch: Option<PatchFn<'a>>,
    reposition: Option<RepositionFn<'a>>,
    flush: Option<FlushFn<'a>>,
}

impl<'a> SinkCallbacks<'a> {
    /// Create an empty table; every operation is absent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the append operation (builder pattern).
    #[must_use]
    pub fn on_append(mut self, f: impl FnMut(&[u8]) -> io::Result<()> + 'a) -> Self {
        self.append = Some(Box::new(f));
        self
    }

    /// Set the patch operation (builder pattern).
    #[must_use]
    pub fn on_patch(mut self, f: impl FnMut(&[u8], u64) -> io::Result<()> + 'a) -> Self {
        self.patch = Some(Box::new(f));
        self
    }

    /// Set the reposition operation (builder pattern).
    #[must_use]
    pub fn on_reposition(mut self, f: impl FnMut(u64) -> io::Result<()> + 'a) -> Self {
        self.reposition = Some(Box::new(f));
        self
    }

    /// Set the flush operation (builder pattern).
    #[must_use]
    pub fn on_flush(mut self, f: impl FnMut() -> io::Result<()> + 'a) -> Self {
        self.flush = Some(Box::new(f));
        self
    }

    /// Whether an append operation is present.
    #[must_use]
    pub fn has_append(&self) -> bool {
        self.append.is_some()
    }

    /// Whether a patch operation is present.
    #[must_use]
    pub fn has_patch(&self) -> bool {
        self.patch.is_some()
    }

    /// Whether a reposition operation is present.
    #[must_use]
    pub fn has_reposition(&self) -> bool {
        self.reposition.is_some()
    }

    /// Whether a flush operation is present.
    #[must_use]
    pub fn has_flush(&self) -> bool {
        self.flush.is_some()
    }
}

fn absent(op: &'static str) -> io::Error {
    io::Error::other(format!("sink has no {op} operation"))
}

impl ForwardSink for SinkCallbacks<'_> {
    fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        match self.append.as_mut() {
            Some(f) => f(buf),
            None => Err(absent("append")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.flush.as_mut() {
            Some(f) => f(),
            None => Ok(()),
        }
    }
}

impl RandomAccessSink for SinkCallbacks<'_> {
    fn patch(&mut self, buf: &[u8], offset: u64) -> io::Result<()> {
        match self.patch.as_mut() {
            Some(f) => f(buf, offset),
            None => Err(absent("patch")),
        }
    }

    fn reposition(&mut self, offset: u64) -> io::Result<()> {
        match self.reposition.as_mut() {
            Some(f) => f(offset),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for SinkCallbacks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Closures are opaque; show which operations are wired.
        f.debug_struct("SinkCallbacks")
            .field("append", &self.append.is_some())
            .field("patch", &self.patch.is_some())
            .field("reposition", &self.reposition.is_some())
            .field("flush", &self.flush.is_some())
            .finish()
    }
}
