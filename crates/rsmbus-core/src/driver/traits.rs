//! Bus driver trait definitions

use crate::error::Result;
use crate::session::Handle;
use crate::smbus::Transaction;
use bitflags::bitflags;

bitflags! {
    /// SMBus driver feature flags
    ///
    /// These flags indicate which transaction kinds a driver can perform.
    /// Bit values follow the Linux `I2C_FUNC_*` functionality mask so the
    /// kernel's answer can be used directly.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SmbusFeatures: u32 {
        /// Plain I2C messages (raw device read/write)
        const I2C              = 0x0000_0001;
        /// Block process call
        const BLOCK_PROC_CALL  = 0x0000_8000;
        /// Quick command
        const QUICK            = 0x0001_0000;
        /// Receive byte
        const READ_BYTE        = 0x0002_0000;
        /// Send byte
        const WRITE_BYTE       = 0x0004_0000;
        /// Read byte data
        const READ_BYTE_DATA   = 0x0008_0000;
        /// Write byte data
        const WRITE_BYTE_DATA  = 0x0010_0000;
        /// Read word data
        const READ_WORD_DATA   = 0x0020_0000;
        /// Write word data
        const WRITE_WORD_DATA  = 0x0040_0000;
        /// Process call
        const PROC_CALL        = 0x0080_0000;
        /// Read block data
        const READ_BLOCK_DATA  = 0x0100_0000;
        /// Write block data
        const WRITE_BLOCK_DATA = 0x0200_0000;
        /// Read raw I2C block
        const READ_I2C_BLOCK   = 0x0400_0000;
        /// Write raw I2C block
        const WRITE_I2C_BLOCK  = 0x0800_0000;

        /// Every byte-sized SMBus operation
        const BYTE = Self::READ_BYTE.bits() | Self::WRITE_BYTE.bits()
            | Self::READ_BYTE_DATA.bits() | Self::WRITE_BYTE_DATA.bits();
        /// Every word-sized SMBus operation
        const WORD = Self::READ_WORD_DATA.bits() | Self::WRITE_WORD_DATA.bits()
            | Self::PROC_CALL.bits();
        /// Every block SMBus operation
        const BLOCK = Self::READ_BLOCK_DATA.bits() | Self::WRITE_BLOCK_DATA.bits()
            | Self::BLOCK_PROC_CALL.bits() | Self::READ_I2C_BLOCK.bits()
            | Self::WRITE_I2C_BLOCK.bits();
    }
}

impl Default for SmbusFeatures {
    fn default() -> Self {
        SmbusFeatures::all()
    }
}

/// Bus driver trait
///
/// This trait represents the native layer that performs the actual bus
/// I/O. Handles are allocated by the session table; the driver only keeps
/// whatever per-handle state it needs (an open file, an emulated device).
///
/// Drivers are called only after every argument has been validated and
/// clamped, so implementations can trust the transaction shape:
/// - `register` is present exactly for register-addressed kinds
/// - block payloads and block read buffers are at most 32 bytes
/// - `read_buf` is sized to the most the caller can accept
pub trait BusDriver {
    /// Returns true if `bus` exists on this platform
    fn has_bus(&self, bus: u32) -> bool;

    /// Bind driver state for a device to a freshly allocated handle
    ///
    /// Should fail with `Error::OpenFailed` if the device cannot be opened.
    fn open(&mut self, handle: Handle, bus: u32, address: u8) -> Result<()>;

    /// Release driver state for a handle
    fn close(&mut self, handle: Handle);

    /// Get the transaction kinds supported for an open handle
    fn features(&self, _handle: Handle) -> SmbusFeatures {
        SmbusFeatures::all()
    }

    /// Perform a single transaction
    ///
    /// Returns the number of bytes placed in `txn.read_buf` (0 for pure
    /// writes). Must never exceed `txn.read_buf.len()`. Bus failures should
    /// be reported as `txn.kind.failure()`.
    fn transact(&mut self, handle: Handle, txn: &mut Transaction<'_>) -> Result<usize>;
}

// Blanket impl for boxed drivers to allow runtime driver selection
impl BusDriver for alloc::boxed::Box<dyn BusDriver + Send> {
    fn has_bus(&self, bus: u32) -> bool {
        (**self).has_bus(bus)
    }

    fn open(&mut self, handle: Handle, bus: u32, address: u8) -> Result<()> {
        (**self).open(handle, bus, address)
    }

    fn close(&mut self, handle: Handle) {
        (**self).close(handle)
    }

    fn features(&self, handle: Handle) -> SmbusFeatures {
        (**self).features(handle)
    }

    fn transact(&mut self, handle: Handle, txn: &mut Transaction<'_>) -> Result<usize> {
        (**self).transact(handle, txn)
    }
}
