//! The stream adapters.
//!
//! Both adapters hold no buffer of their own: every write is forwarded to
//! the sink immediately, one call per producer write, so the producer's
//! write granularity is visible to the sink one-for-one and a sink can
//! stream without building a full in-memory copy.
//!
//! Both share the same failure discipline: the first sink operation that
//! fails (or is absent when required) latches the adapter, and every later
//! write on that instance is silently skipped. The producer keeps running;
//! the operation that owns the adapter checks [`has_error`] once at the
//! end.
//!
//! [`has_error`]: RandomAccessStream::has_error

use tracing::trace;

use crate::output::{Output, PwriteOutput};
use crate::sink::{ForwardSink, RandomAccessSink};

/// Append-only adapter for forward streaming (bitcode, IR text).
///
/// Tracks the logical append position and forwards every write to the
/// sink. On drop, the sink's flush runs once, best-effort, unless an
/// explicit [`flush`](ForwardStream::flush) already happened or the
/// adapter is latched.
pub struct ForwardStream<'a> {
    sink: &'a mut dyn ForwardSink,
    pos: u64,
    failed: bool,
    flushed: bool,
}

impl<'a> ForwardStream<'a> {
    /// Create an adapter over `sink`. Position starts at zero.
    pub fn new(sink: &'a mut dyn ForwardSink) -> Self {
        Self {
            sink,
            pos: 0,
            failed: false,
            flushed: false,
        }
    }

    /// Append `buf`, advancing the position on success.
    ///
    /// Zero-length writes never reach the sink.
    pub fn write(&mut self, buf: &[u8]) {
        if self.failed || buf.is_empty() {
            return;
        }
        if self.sink.append(buf).is_err() {
            self.failed = true;
            return;
        }
        self.pos = self.pos.saturating_add(buf.len() as u64);
        trace!(len = buf.len(), pos = self.pos, "append");
    }

    /// The logical append position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Whether any sink operation has failed.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.failed
    }

    /// Forward the terminal flush to the sink.
    ///
    /// Runs at most once per adapter; drop performs it only if no explicit
    /// flush happened. Skipped entirely on a latched adapter, so a failed
    /// emission never flushes partial state.
    pub fn flush(&mut self) {
        if self.flushed || self.failed {
            return;
        }
        self.flushed = true;
        if self.sink.flush().is_err() {
            self.failed = true;
        }
    }
}

impl Output for ForwardStream<'_> {
    fn write(&mut self, buf: &[u8]) {
        ForwardStream::write(self, buf);
    }

    fn position(&self) -> u64 {
        self.pos
    }
}

impl Drop for ForwardStream<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Append/patch adapter for object and assembly emission.
///
/// Sequential writes go to the sink's append operation and advance the
/// position; patch writes go to its patch operation at an absolute offset
/// and leave the position untouched. The position thereby always marks the
/// logical end of stream, which is exactly what a backend needs while it
/// backpatches fields it has already streamed past.
pub struct RandomAccessStream<'a> {
    sink: &'a mut dyn RandomAccessSink,
    pos: u64,
    failed: bool,
    flushed: bool,
}

impl<'a> RandomAccessStream<'a> {
    /// Create an adapter over `sink`. Position starts at zero.
    pub fn new(sink: &'a mut dyn RandomAccessSink) -> Self {
        Self {
            sink,
            pos: 0,
            failed: false,
            flushed: false,
        }
    }

    /// Append `buf`, advancing the position on success.
    ///
    /// Zero-length writes never reach the sink.
    pub fn write(&mut self, buf: &[u8]) {
        if self.failed || buf.is_empty() {
            return;
        }
        if self.sink.append(buf).is_err() {
            self.failed = true;
            return;
        }
        self.pos = self.pos.saturating_add(buf.len() as u64);
        trace!(len = buf.len(), pos = self.pos, "append");
    }

    /// Write `buf` at absolute `offset`.
    ///
    /// The append position is never touched, whatever the offset. The sink
    /// grows and zero-fills if `offset + len` exceeds its current extent;
    /// the adapter has no notion of the store's true size.
    pub fn pwrite(&mut self, buf: &[u8], offset: u64) {
        if self.failed || buf.is_empty() {
            return;
        }
        if self.sink.patch(buf, offset).is_err() {
            self.failed = true;
            return;
        }
        trace!(len = buf.len(), offset, "patch");
    }

    /// Set the logical append position and forward it to the sink's
    /// reposition operation, if it has one.
    ///
    /// Emission pipelines never call this; it exists for callers that want
    /// to realign the append cursor with an external notion of current
    /// size. Returns whether the sink accepted the new position; a
    /// rejection also latches the adapter.
    pub fn seek(&mut self, new_pos: u64) -> bool {
        self.pos = new_pos;
        if self.sink.reposition(new_pos).is_err() {
            self.failed = true;
            return false;
        }
        true
    }

    /// The logical append position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Whether any sink operation has failed.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.failed
    }

    /// Forward the terminal flush to the sink.
    ///
    /// Runs at most once per adapter; drop performs it only if no explicit
    /// flush happened. Skipped entirely on a latched adapter.
    pub fn flush(&mut self) {
        if self.flushed || self.failed {
            return;
        }
        self.flushed = true;
        if self.sink.flush().is_err() {
            self.failed = true;
        }
    }
}

impl Output for RandomAccessStream<'_> {
    fn write(&mut self, buf: &[u8]) {
        RandomAccessStream::write(self, buf);
    }

    fn position(&self) -> u64 {
        self.pos
    }
}

impl PwriteOutput for RandomAccessStream<'_> {
    fn pwrite(&mut self, buf: &[u8], offset: u64) {
        RandomAccessStream::pwrite(self, buf, offset);
    }
}

impl Drop for RandomAccessStream<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}
