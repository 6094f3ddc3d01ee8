//! Cursor buffer with position and limit

use crate::error::{Error, Result};

/// Saved cursor position and limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    position: usize,
    limit: usize,
}

/// Byte storage with a read/write cursor
///
/// Keeps the invariant `position <= limit <= capacity`. A new cursor starts
/// at position 0 with the limit at the full capacity.
///
/// Cursor reads leave the position just past the bytes received. Cursor
/// writes do not move it; callers use [`ByteCursor::advance`] with the
/// count the write returns.
#[derive(Debug, Clone)]
pub struct ByteCursor<B> {
    inner: B,
    position: usize,
    limit: usize,
}

impl<B: AsRef<[u8]>> ByteCursor<B> {
    /// Wrap storage; position 0, limit at capacity
    pub fn new(inner: B) -> Self {
        let limit = inner.as_ref().len();
        Self {
            inner,
            position: 0,
            limit,
        }
    }

    /// Total size of the storage
    pub fn capacity(&self) -> usize {
        self.inner.as_ref().len()
    }

    /// Current position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the position; must not pass the limit
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.limit {
            return Err(Error::BadParam);
        }
        self.position = position;
        Ok(())
    }

    /// Current limit
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Move the limit; must not pass the capacity
    ///
    /// The position is pulled back to the new limit if it was beyond it.
    pub fn set_limit(&mut self, limit: usize) -> Result<()> {
        if limit > self.capacity() {
            return Err(Error::BadParam);
        }
        self.limit = limit;
        self.position = self.position.min(limit);
        Ok(())
    }

    /// Bytes between the position and the limit
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    /// Returns true if any bytes remain before the limit
    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    /// Limit to the current position, position to 0
    pub fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
    }

    /// Position to 0, limit unchanged
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Position to 0, limit to capacity
    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = self.capacity();
    }

    /// Move the position forward by `n`, stopping at the limit
    pub fn advance(&mut self, n: usize) {
        self.position = self.position.saturating_add(n).min(self.limit);
    }

    /// Bytes between the position and the limit
    pub fn remaining_slice(&self) -> &[u8] {
        &self.inner.as_ref()[self.position..self.limit]
    }

    /// Save position and limit
    pub fn state(&self) -> CursorState {
        CursorState {
            position: self.position,
            limit: self.limit,
        }
    }

    /// Put back a saved position and limit
    pub fn restore(&mut self, state: CursorState) {
        self.position = state.position;
        self.limit = state.limit;
    }

    /// Borrow the storage
    pub fn get_ref(&self) -> &B {
        &self.inner
    }

    /// Unwrap the storage
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> ByteCursor<B> {
    /// Mutably borrow the whole storage
    pub fn get_mut(&mut self) -> &mut [u8] {
        self.inner.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cursor() {
        let cursor = ByteCursor::new([1u8, 2, 3, 4]);
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.limit(), 4);
        assert_eq!(cursor.remaining(), 4);
        assert_eq!(cursor.remaining_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_flip_rewind_clear() {
        let mut cursor = ByteCursor::new([0u8; 8]);
        cursor.advance(3);
        cursor.flip();
        assert_eq!((cursor.position(), cursor.limit()), (0, 3));

        cursor.advance(2);
        cursor.rewind();
        assert_eq!((cursor.position(), cursor.limit()), (0, 3));

        cursor.clear();
        assert_eq!((cursor.position(), cursor.limit()), (0, 8));
    }

    #[test]
    fn test_bounds() {
        let mut cursor = ByteCursor::new([0u8; 8]);
        cursor.set_limit(5).unwrap();
        assert_eq!(cursor.set_position(6), Err(Error::BadParam));
        assert_eq!(cursor.set_limit(9), Err(Error::BadParam));

        cursor.set_position(5).unwrap();
        cursor.set_limit(2).unwrap();
        assert_eq!(cursor.position(), 2);

        cursor.advance(10);
        assert_eq!(cursor.position(), 2);
        assert!(!cursor.has_remaining());

        cursor.rewind();
        cursor.advance(usize::MAX);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_state_restore() {
        let mut cursor = ByteCursor::new([0u8; 8]);
        cursor.set_position(8).unwrap();
        let saved = cursor.state();
        cursor.flip();
        cursor.restore(saved);
        assert_eq!((cursor.position(), cursor.limit()), (8, 8));
    }
}
