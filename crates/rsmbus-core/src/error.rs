//! Error types for rsmbus-core
//!
//! This module provides a no_std compatible error type shared by the
//! session table, the buffer resolution layer, the dispatcher and every
//! bus driver.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
///
/// Each variant has a stable numeric status code (see [`Error::code`])
/// following the pigpio convention, so callers bridging to C-style
/// interfaces can report the same negative values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    // Session errors
    /// Handle is not open (never opened, or already closed)
    BadHandle,
    /// Bus number is not valid on this platform
    BadBus,
    /// Device address is outside 0x00..=0x7F
    BadAddr,
    /// Open flags are not supported
    BadFlags,
    /// Every session slot is in use
    NoHandle,
    /// Driver rejected the open
    OpenFailed,

    // Transfer errors
    /// A numeric argument is outside its domain
    BadParam,
    /// A write transaction failed on the bus
    WriteFailed,
    /// A read transaction failed on the bus
    ReadFailed,
}

impl Error {
    /// Negative status code for this error
    pub const fn code(self) -> i32 {
        match self {
            Self::NoHandle => -24,
            Self::BadHandle => -25,
            Self::OpenFailed => -71,
            Self::BadBus => -74,
            Self::BadAddr => -75,
            Self::BadFlags => -77,
            Self::BadParam => -81,
            Self::WriteFailed => -82,
            Self::ReadFailed => -83,
        }
    }

    /// Map a negative status code back to an error
    ///
    /// Returns `None` for non-negative values and for codes outside the
    /// I2C error family.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            -24 => Some(Self::NoHandle),
            -25 => Some(Self::BadHandle),
            -71 => Some(Self::OpenFailed),
            -74 => Some(Self::BadBus),
            -75 => Some(Self::BadAddr),
            -77 => Some(Self::BadFlags),
            -81 => Some(Self::BadParam),
            -82 => Some(Self::WriteFailed),
            -83 => Some(Self::ReadFailed),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadHandle => write!(f, "bad handle"),
            Self::BadBus => write!(f, "bad I2C bus"),
            Self::BadAddr => write!(f, "bad I2C address"),
            Self::BadFlags => write!(f, "bad open flags"),
            Self::NoHandle => write!(f, "no handle available"),
            Self::OpenFailed => write!(f, "I2C open failed"),
            Self::BadParam => write!(f, "bad parameter"),
            Self::WriteFailed => write!(f, "I2C write failed"),
            Self::ReadFailed => write!(f, "I2C read failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

/// Convert a status-or-count value into a `Result`
///
/// Non-negative values are counts. Negative values are decoded with
/// [`Error::from_code`]; unknown negative codes become `fallback`, which
/// should be the failure matching the transaction direction.
pub fn status_to_result(status: i32, fallback: Error) -> Result<usize> {
    if status >= 0 {
        Ok(status as usize)
    } else {
        Err(Error::from_code(status).unwrap_or(fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Error; 9] = [
        Error::BadHandle,
        Error::BadBus,
        Error::BadAddr,
        Error::BadFlags,
        Error::NoHandle,
        Error::OpenFailed,
        Error::BadParam,
        Error::WriteFailed,
        Error::ReadFailed,
    ];

    #[test]
    fn test_codes_are_negative_and_reversible() {
        for err in ALL {
            assert!(err.code() < 0);
            assert_eq!(Error::from_code(err.code()), Some(err));
        }
    }

    #[test]
    fn test_status_to_result() {
        assert_eq!(status_to_result(0, Error::WriteFailed), Ok(0));
        assert_eq!(status_to_result(17, Error::ReadFailed), Ok(17));
        assert_eq!(status_to_result(-25, Error::ReadFailed), Err(Error::BadHandle));
        assert_eq!(status_to_result(-1, Error::ReadFailed), Err(Error::ReadFailed));
    }
}
