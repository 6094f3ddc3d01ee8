//! Write request builder

use alloc::borrow::Cow;

use super::charset::Charset;
use super::resolve::{resolve_explicit, Span};
use crate::error::Result;

#[derive(Debug, Clone, Copy)]
enum Source<'a> {
    Bytes(&'a [u8]),
    Text(&'a str, Charset),
}

/// Outgoing payload in any of the supported input shapes
///
/// Covers the whole-slice, prefix, explicit-range and encoded-text forms
/// with one type:
///
/// ```ignore
/// WriteRequest::bytes(&data);                                 // whole slice
/// WriteRequest::bytes(&data).with_length(4);                  // prefix
/// WriteRequest::bytes(&data).with_offset(2).with_length(4);   // range
/// WriteRequest::text("hello");                                // ASCII text
/// WriteRequest::text("h\u{e9}").with_charset(Charset::Utf8);  // other encoding
/// ```
///
/// Offsets and lengths count bytes of the encoded payload. Lengths past
/// the end of the payload are clamped.
#[derive(Debug, Clone, Copy)]
pub struct WriteRequest<'a> {
    source: Source<'a>,
    offset: usize,
    length: Option<usize>,
}

impl<'a> WriteRequest<'a> {
    /// Send raw bytes
    pub fn bytes(data: &'a [u8]) -> Self {
        Self {
            source: Source::Bytes(data),
            offset: 0,
            length: None,
        }
    }

    /// Send text, encoded with the default charset (ASCII)
    pub fn text(text: &'a str) -> Self {
        Self {
            source: Source::Text(text, Charset::default()),
            offset: 0,
            length: None,
        }
    }

    /// Set the text encoding (no effect on byte payloads)
    pub fn with_charset(mut self, charset: Charset) -> Self {
        if let Source::Text(text, _) = self.source {
            self.source = Source::Text(text, charset);
        }
        self
    }

    /// Start at `offset` into the payload
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Send at most `length` bytes
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Payload bytes, encoding text if needed
    pub fn encode(&self) -> Cow<'a, [u8]> {
        match self.source {
            Source::Bytes(data) => Cow::Borrowed(data),
            Source::Text(text, charset) => Cow::Owned(charset.encode(text)),
        }
    }

    /// Window of the encoded payload to send
    pub fn span(&self, payload_len: usize) -> Result<Span> {
        let length = self
            .length
            .unwrap_or_else(|| payload_len.saturating_sub(self.offset));
        resolve_explicit(payload_len, self.offset, length)
    }
}
