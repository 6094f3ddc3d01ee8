//! Span resolution rules

use super::cursor::ByteCursor;
use crate::error::{Error, Result};

/// Resolved `(offset, length)` window into caller storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// First byte of the window
    pub offset: usize,
    /// Number of bytes in the window
    pub len: usize,
}

impl Span {
    /// Create a span
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// One past the last byte of the window
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Returns true if the window holds no bytes
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Shorten the window to at most `max` bytes
    pub fn clamp(self, max: usize) -> Self {
        if self.len > max {
            log::debug!("clamping {} byte transfer to {} bytes", self.len, max);
        }
        Self {
            offset: self.offset,
            len: self.len.min(max),
        }
    }

    /// Borrow the window from `storage`
    pub fn slice(self, storage: &[u8]) -> &[u8] {
        &storage[self.offset..self.end()]
    }

    /// Mutably borrow the window from `storage`
    pub fn slice_mut(self, storage: &mut [u8]) -> &mut [u8] {
        &mut storage[self.offset..self.end()]
    }
}

/// Whole storage: `(storage)` becomes `(storage, 0, capacity)`
pub const fn resolve_whole(capacity: usize) -> Span {
    Span::new(0, capacity)
}

/// Prefix: `(storage, length)` becomes `(storage, 0, length)`, clamped
pub fn resolve_prefix(capacity: usize, length: usize) -> Span {
    Span::new(0, length.min(capacity))
}

/// Explicit offset and length against fixed-capacity storage
///
/// `length` is silently clamped to `capacity - offset`. An offset past the
/// end of the storage cannot be clamped and is a `BadParam`.
pub fn resolve_explicit(capacity: usize, offset: usize, length: usize) -> Result<Span> {
    if offset > capacity {
        log::debug!("offset {} is past the end of {} byte storage", offset, capacity);
        return Err(Error::BadParam);
    }

    let available = capacity - offset;
    if length > available {
        log::debug!(
            "requested {} bytes at offset {}, only {} available",
            length,
            offset,
            available
        );
    }

    Ok(Span::new(offset, length.min(available)))
}

/// Cursor shape, write path
///
/// If the cursor is exhausted (`position == limit`) it is flipped so the
/// data between 0 and the limit is sent. The window starts at the
/// position and covers `requested` bytes, or everything remaining,
/// whichever is smaller. The cursor is not advanced.
pub fn resolve_cursor_write<B: AsRef<[u8]>>(
    cursor: &mut ByteCursor<B>,
    requested: Option<usize>,
) -> Span {
    if cursor.position() == cursor.limit() {
        cursor.flip();
    }
    cursor_window(cursor, requested)
}

/// Cursor shape, read path
///
/// If the cursor is exhausted (`position == limit`) it is rewound so the
/// response lands between 0 and the limit. Otherwise identical to
/// [`resolve_cursor_write`].
pub fn resolve_cursor_read<B: AsRef<[u8]>>(
    cursor: &mut ByteCursor<B>,
    requested: Option<usize>,
) -> Span {
    if cursor.position() == cursor.limit() {
        cursor.rewind();
    }
    cursor_window(cursor, requested)
}

fn cursor_window<B: AsRef<[u8]>>(cursor: &ByteCursor<B>, requested: Option<usize>) -> Span {
    let remaining = cursor.remaining();
    let len = requested.map_or(remaining, |r| r.min(remaining));
    Span::new(cursor.position(), len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_and_prefix() {
        assert_eq!(resolve_whole(10), Span::new(0, 10));
        assert_eq!(resolve_prefix(10, 4), Span::new(0, 4));
        assert_eq!(resolve_prefix(10, 40), Span::new(0, 10));
    }

    #[test]
    fn test_explicit_clamps_to_capacity() {
        assert_eq!(resolve_explicit(16, 4, 8).unwrap(), Span::new(4, 8));
        // length > capacity - offset resolves to exactly capacity - offset
        assert_eq!(resolve_explicit(16, 10, 100).unwrap(), Span::new(10, 6));
        assert_eq!(resolve_explicit(16, 16, 1).unwrap(), Span::new(16, 0));
    }

    #[test]
    fn test_explicit_rejects_offset_past_end() {
        assert_eq!(resolve_explicit(16, 17, 0), Err(Error::BadParam));
    }

    #[test]
    fn test_span_clamp() {
        assert_eq!(Span::new(2, 40).clamp(32), Span::new(2, 32));
        assert_eq!(Span::new(2, 8).clamp(32), Span::new(2, 8));
    }

    #[test]
    fn test_cursor_read_rewinds_when_exhausted() {
        let mut cursor = ByteCursor::new([0u8; 10]);
        cursor.set_position(10).unwrap();
        assert_eq!(cursor.position(), cursor.limit());

        let span = resolve_cursor_read(&mut cursor, None);
        assert_eq!(span, Span::new(0, 10));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_cursor_write_flips_when_exhausted() {
        let mut cursor = ByteCursor::new([0u8; 16]);
        cursor.set_position(6).unwrap();
        cursor.set_limit(6).unwrap();

        let span = resolve_cursor_write(&mut cursor, Some(100));
        assert_eq!(span, Span::new(0, 6));
        assert_eq!(cursor.limit(), 6);
    }

    #[test]
    fn test_cursor_uses_remaining() {
        let mut cursor = ByteCursor::new([0u8; 16]);
        cursor.set_position(4).unwrap();
        cursor.set_limit(12).unwrap();

        assert_eq!(resolve_cursor_write(&mut cursor, None), Span::new(4, 8));
        assert_eq!(resolve_cursor_write(&mut cursor, Some(3)), Span::new(4, 3));
        assert_eq!(resolve_cursor_read(&mut cursor, Some(20)), Span::new(4, 8));
        // Not exhausted, so nothing moved
        assert_eq!(cursor.position(), 4);
    }
}
