//! Buffer Resolution Layer
//!
//! Callers can describe a transfer in several shapes: a whole slice, a
//! prefix, an explicit offset/length range, a cursor buffer, or a piece of
//! text in some character encoding. The functions here reduce all of them
//! to a [`Span`] over plain byte storage, which is what the canonical
//! primitives in [`crate::dispatch`] accept.
//!
//! Over-long requests are clamped, never rejected. The only shape errors
//! are offsets past the end of the storage and cursor positions outside
//! their limit.

mod charset;
mod cursor;
mod request;
mod resolve;

pub use charset::Charset;
pub use cursor::{ByteCursor, CursorState};
pub use request::WriteRequest;
pub use resolve::*;

/// Transaction family a buffer-shaped request is aimed at
///
/// Selects which canonical primitive a convenience call reduces to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// SMBus block data at a register (count chosen by the device on reads)
    BlockData {
        /// Register address
        register: u8,
    },
    /// Raw I2C block at a register
    I2cBlock {
        /// Register address
        register: u8,
    },
    /// Plain device read/write, no register
    Device,
}
