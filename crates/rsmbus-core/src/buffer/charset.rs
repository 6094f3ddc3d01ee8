//! Character encodings for text payloads

use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::error::Error;

/// Replacement byte for characters the charset cannot represent
const REPLACEMENT: u8 = b'?';

/// Encoding applied to text before it is sent as bytes
///
/// `Ascii` is the default so text written without naming a charset keeps
/// its historical 7-bit encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Charset {
    /// 7-bit US-ASCII
    #[default]
    Ascii,
    /// ISO-8859-1
    Latin1,
    /// UTF-8
    Utf8,
}

impl Charset {
    /// Encode `text`, replacing unmappable characters with `?`
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Self::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { REPLACEMENT })
                .collect(),
            Self::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(REPLACEMENT))
                .collect(),
            Self::Utf8 => text.as_bytes().to_vec(),
        }
    }

    /// Canonical name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ascii => "US-ASCII",
            Self::Latin1 => "ISO-8859-1",
            Self::Utf8 => "UTF-8",
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Charset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" | "us-ascii" => Ok(Self::Ascii),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Self::Latin1),
            "utf8" | "utf-8" => Ok(Self::Utf8),
            _ => Err(Error::BadParam),
        }
    }
}
