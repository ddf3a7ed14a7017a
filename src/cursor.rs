//! Bounded input and output cursors.
//!
//! Every codec call either moves a cursor by exactly the bytes it
//! consumed or produced, or leaves it where it was. The cursors enforce the
//! bounds, so a codec can never run past the end of a buffer.

use crate::error::CesError;

/// Read position within a borrowed input buffer.
#[derive(Debug, Clone)]
pub struct InputCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> InputCursor<'a> {
    /// Cursor positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Number of bytes not yet consumed.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True when every byte has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Consume `n` bytes. `n` is clamped to what remains.
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos += n.min(self.len());
    }

    /// Current position, for a later [`InputCursor::reset`].
    #[inline]
    pub fn mark(&self) -> usize {
        self.pos
    }

    /// Move back to a position returned by [`InputCursor::mark`].
    #[inline]
    pub fn reset(&mut self, mark: usize) {
        debug_assert!(mark <= self.buf.len());
        self.pos = mark.min(self.buf.len());
    }
}

/// Destination of encoded bytes.
///
/// A `put` either stores all of `bytes` or none of them.
pub trait ByteSink {
    /// Bytes that can still be written.
    fn space(&self) -> usize;

    /// Append `bytes`, failing with [`CesError::NoSpace`] if they do not fit.
    fn put(&mut self, bytes: &[u8]) -> Result<(), CesError>;

    /// Total bytes accepted so far.
    fn written(&self) -> usize;
}

/// Write position within a borrowed output buffer.
#[derive(Debug)]
pub struct OutputCursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> OutputCursor<'a> {
    /// Cursor positioned at the start of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// The bytes produced so far.
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    /// Current position, for a later [`OutputCursor::reset`].
    pub fn mark(&self) -> usize {
        self.pos
    }

    /// Drop everything written after `mark`.
    pub fn reset(&mut self, mark: usize) {
        self.pos = mark.min(self.pos);
    }
}

impl ByteSink for OutputCursor<'_> {
    #[inline]
    fn space(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    fn put(&mut self, bytes: &[u8]) -> Result<(), CesError> {
        if bytes.len() > self.space() {
            return Err(CesError::NoSpace);
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    #[inline]
    fn written(&self) -> usize {
        self.pos
    }
}

/// Sink that only counts, used for dry runs and validation.
#[derive(Debug, Clone, Default)]
pub struct DiscardSink {
    capacity: Option<usize>,
    written: usize,
}

impl DiscardSink {
    /// A sink that accepts any amount of output.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A sink that reports no space after `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            written: 0,
        }
    }
}

impl ByteSink for DiscardSink {
    fn space(&self) -> usize {
        match self.capacity {
            Some(cap) => cap - self.written,
            None => usize::MAX - self.written,
        }
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), CesError> {
        if bytes.len() > self.space() {
            return Err(CesError::NoSpace);
        }
        self.written += bytes.len();
        Ok(())
    }

    fn written(&self) -> usize {
        self.written
    }
}

/// Sink that appends to a growable vector.
impl ByteSink for Vec<u8> {
    fn space(&self) -> usize {
        usize::MAX - self.len()
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), CesError> {
        self.extend_from_slice(bytes);
        Ok(())
    }

    fn written(&self) -> usize {
        self.len()
    }
}
