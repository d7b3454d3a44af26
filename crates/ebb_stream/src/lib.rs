//! Output Streaming for Code Generation Backends
//!
//! A code generation backend produces its artifacts (bitcode, IR text,
//! object or assembly bytes) as one logical output stream, but object
//! emission must go back and patch fixups at offsets the append cursor has
//! long passed. This crate provides the adapters that preserve the
//! illusion of a single contiguous output while every byte is delegated,
//! copy-free, to a caller-owned sink:
//!
//! ```text
//! ┌──────────┐  write/pwrite  ┌────────────────────┐  append/patch  ┌──────┐
//! │ producer │───────────────▶│ RandomAccessStream │───────────────▶│ sink │
//! │ (backend)│                │ position + latch   │                │      │
//! └──────────┘                └────────────────────┘                └──────┘
//! ```
//!
//! # Key Types
//!
//! - [`ForwardStream`]: append-only adapter for forward streaming (bitcode,
//!   IR text)
//! - [`RandomAccessStream`]: append/patch adapter for object and assembly
//!   emission
//! - [`Output`] / [`PwriteOutput`]: the capabilities a producer writes
//!   through
//! - [`ForwardSink`] / [`RandomAccessSink`]: the contract a destination
//!   implements
//! - [`SinkCallbacks`]: a sink assembled from individual closures
//! - [`WriterSink`] / [`SeekSink`] / [`MemorySink`]: ready-made sinks over
//!   `std::io` writers and owned memory
//!
//! # Example
//!
//! ```
//! use ebb_stream::{MemorySink, RandomAccessStream};
//!
//! let mut sink = MemorySink::new();
//! {
//!     let mut out = RandomAccessStream::new(&mut sink);
//!     out.write(b"AB");
//!     out.write(b"CD");
//!     // Backpatch the first byte; the append position stays at 4.
//!     out.pwrite(b"X", 0);
//!     assert_eq!(out.position(), 4);
//!     out.flush();
//!     assert!(!out.has_error());
//! }
//! assert_eq!(sink.bytes(), b"XBCD");
//! ```
//!
//! # Error Model
//!
//! Sink operations return `io::Result`, but producers write through
//! infallible methods: the first failure latches the adapter, all later
//! writes are silently swallowed, and the owning operation reports a single
//! failure after the producer finishes. This keeps backends free of
//! mid-pass write error handling at the cost of wasted producer work after
//! the first failure.
//!
//! # Debugging
//!
//! Enable trace-level records of every forwarded write with
//! `RUST_LOG=ebb_stream=trace` (the driving crate installs the
//! subscriber).

pub mod output;
pub mod sink;
pub mod store;
pub mod stream;

pub use output::{Output, PwriteOutput};
pub use sink::{ForwardSink, RandomAccessSink, SinkCallbacks};
pub use store::{MemorySink, SeekSink, WriterSink};
pub use stream::{ForwardStream, RandomAccessStream};
