//! Error types for Linux I2C operations

use thiserror::Error;

/// Linux I2C specific errors
#[derive(Debug, Error)]
pub enum LinuxI2cError {
    /// Failed to open the bus device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to bind the device address
    #[error("Failed to select address 0x{address:02X}: {source}")]
    SetAddressFailed {
        address: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to query adapter functionality
    #[error("Failed to query adapter functionality: {0}")]
    FuncsFailed(#[source] std::io::Error),

    /// A bus transaction failed
    #[error("{kind} failed: {source}")]
    TransferFailed {
        kind: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Handle has no open device
    #[error("Handle {0} is not bound to a device")]
    NotOpen(u32),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl LinuxI2cError {
    pub(crate) fn transfer(kind: &'static str, errno: nix::errno::Errno) -> Self {
        Self::TransferFailed {
            kind,
            source: std::io::Error::from_raw_os_error(errno as i32),
        }
    }
}

/// Result type for Linux I2C operations
pub type Result<T> = std::result::Result<T, LinuxI2cError>;
