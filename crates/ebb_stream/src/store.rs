//! Ready-made sinks over `std::io` writers and owned memory.

use std::io::{self, Seek, SeekFrom, Write};

use crate::sink::{ForwardSink, RandomAccessSink};

/// Forward-only sink over any [`Write`] destination.
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    /// Wrap `writer` as a forward sink.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ForwardSink for WriterSink<W> {
    fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        self.writer.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Random-access sink over a seekable writer.
///
/// Keeps the logical append cursor separate from the writer's file cursor:
/// `append` seeks to the logical end before writing, `patch` seeks to its
/// offset and then restores the cursor so a later append continues where
/// it left off. Files and [`io::Cursor`]`<Vec<u8>>` both zero-fill the gap
/// when a patch writes past the end of the store, which satisfies the
/// random-access sink contract.
pub struct SeekSink<W> {
    writer: W,
    pos: u64,
}

impl<W: Write + Seek> SeekSink<W> {
    /// Wrap `writer`, starting the append cursor at its current position
    /// so streaming can continue an existing store.
    pub fn new(mut writer: W) -> io::Result<Self> {
        let pos = writer.stream_position()?;
        Ok(Self { writer, pos })
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Seek> ForwardSink for SeekSink<W> {
    fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        self.writer.seek(SeekFrom::Start(self.pos))?;
        self.writer.write_all(buf)?;
        self.pos = self.pos.saturating_add(buf.len() as u64);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl<W: Write + Seek> RandomAccessSink for SeekSink<W> {
    fn patch(&mut self, buf: &[u8], offset: u64) -> io::Result<()> {
        self.writer.seek(SeekFrom::Start(offset))?;
        self.writer.write_all(buf)?;
        // Restore so the next append lands at the logical end.
        self.writer.seek(SeekFrom::Start(self.pos))?;
        Ok(())
    }

    fn reposition(&mut self, offset: u64) -> io::Result<()> {
        self.pos = offset;
        self.writer.seek(SeekFrom::Start(offset)).map(|_| ())
    }
}

/// Growable in-memory sink implementing the zero-fill patch contract
/// directly.
///
/// Appends land at the store's physical end; a reposition is accepted and
/// ignored. A patch past the current extent grows the store and zero-fills
/// the gap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySink {
    bytes: Vec<u8>,
}

impl MemorySink {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulated bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Current store extent in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hand the accumulated artifact back.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl ForwardSink for MemorySink {
    fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        self.bytes.extend_from_slice(buf);
        Ok(())
    }
}

impl RandomAccessSink for MemorySink {
    fn patch(&mut self, buf: &[u8], offset: u64) -> io::Result<()> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::other("patch offset exceeds addressable memory"))?;
        let end = start
            .checked_add(buf.len())
            .ok_or_else(|| io::Error::other("patch extent overflows the store"))?;
        if end > self.bytes.len() {
            self.bytes.resize(end, 0);
        }
        self.bytes[start..end].copy_from_slice(buf);
        Ok(())
    }
}
