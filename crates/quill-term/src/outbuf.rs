#![forbid(unsafe_code)]

//! The output byte buffer.
//!
//! Escape expansion and cell payloads accumulate here and reach the
//! device in large writes. The buffer keeps a *reserved tail*: space for
//! the cursor-restore suffix appended at flush time, so that suffix can
//! never force a flush in the middle of an escape sequence.
//!
//! # Contract
//!
//! - `write` flushes the pending bytes first whenever the new chunk
//!   would cross the usable limit; a single chunk larger than the whole
//!   buffer is passed through directly.
//! - `reserve_tail`/`release_tail` bracket the suffix append; the
//!   content length never exceeds `capacity - reserved`.
//! - Write errors are swallowed here. A dying tty is discovered by the
//!   owner of the stream, not by the paint path.

use std::io::Write;

/// Total buffer capacity.
pub const OUTBUF_SIZE: usize = 0xffff;

/// Reserved tail for the "cursor normal" suffix. No terminal needs more
/// than 32 bytes to show its cursor.
pub const CURSOR_TAIL_RESERVE: usize = 32;

/// Buffered escape/payload accumulator.
#[derive(Debug)]
pub struct OutBuf {
    data: Vec<u8>,
    reserved: usize,
}

impl Default for OutBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl OutBuf {
    /// An empty buffer with the cursor tail reserved.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(OUTBUF_SIZE),
            reserved: CURSOR_TAIL_RESERVE,
        }
    }

    /// Usable bytes before a flush becomes necessary.
    #[inline]
    #[must_use]
    pub fn limit(&self) -> usize {
        OUTBUF_SIZE - self.reserved
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append bytes, flushing pending content to `sink` first when the
    /// chunk would cross the usable limit.
    pub fn write(&mut self, bytes: &[u8], sink: &mut dyn Write) {
        if self.data.len() + bytes.len() > self.limit() {
            self.flush_to(sink);
        }
        if bytes.len() > self.limit() {
            // Oversized chunk: hand it to the device directly.
            let _ = sink.write_all(bytes);
            return;
        }
        self.data.extend_from_slice(bytes);
    }

    /// Hand all pending bytes to `sink` and empty the buffer. Errors are
    /// ignored; the stream owner notices a dead device on its own.
    pub fn flush_to(&mut self, sink: &mut dyn Write) {
        if !self.data.is_empty() {
            let _ = sink.write_all(&self.data);
            self.data.clear();
        }
        let _ = sink.flush();
    }

    /// Temporarily release `n` bytes of the reserved tail so a suffix
    /// can be appended without triggering a flush.
    pub fn release_tail(&mut self, n: usize) {
        debug_assert!(n <= self.reserved, "tail release exceeds reservation");
        self.reserved -= n.min(self.reserved);
    }

    /// Restore the reservation after the suffix is in place.
    pub fn reserve_tail(&mut self, n: usize) {
        self.reserved += n;
        debug_assert!(self.reserved <= OUTBUF_SIZE);
        debug_assert!(
            self.data.len() <= self.limit(),
            "buffered content intrudes into the reserved tail"
        );
    }
}
