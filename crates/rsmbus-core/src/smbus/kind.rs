//! SMBus transaction kinds

use crate::driver::SmbusFeatures;
use crate::error::{Error, Result};

/// Wire-level operation performed by a single transaction
///
/// Every convenience entry point in the dispatcher reduces to exactly one
/// of these before a driver is called.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// Single bit in the R/W position, no payload
    WriteQuick,
    /// One byte, no register
    WriteByte,
    /// One byte, no register
    ReadByte,
    /// One byte at a register
    WriteByteData,
    /// One byte from a register
    ReadByteData,
    /// Little-endian word at a register
    WriteWordData,
    /// Little-endian word from a register
    ReadWordData,
    /// Write a word then read a word in one transaction
    ProcessCall,
    /// Count-prefixed block (0-32 bytes) at a register
    WriteBlockData,
    /// Count-prefixed block from a register, count chosen by the device
    ReadBlockData,
    /// Write a block then read a block in one transaction
    BlockProcessCall,
    /// Raw block (1-32 bytes) at a register, no count byte
    WriteI2cBlockData,
    /// Raw block (1-32 bytes) from a register, no count byte
    ReadI2cBlockData,
    /// Plain I2C write, no register
    WriteDevice,
    /// Plain I2C read, no register
    ReadDevice,
}

impl TransactionKind {
    /// Returns true if failures of this kind are read failures
    ///
    /// The combined write-then-read kinds count as reads.
    pub const fn is_read(&self) -> bool {
        matches!(
            self,
            Self::ReadByte
                | Self::ReadByteData
                | Self::ReadWordData
                | Self::ProcessCall
                | Self::ReadBlockData
                | Self::BlockProcessCall
                | Self::ReadI2cBlockData
                | Self::ReadDevice
        )
    }

    /// Returns true if this kind addresses a device register
    pub const fn has_register(&self) -> bool {
        !matches!(
            self,
            Self::WriteQuick
                | Self::WriteByte
                | Self::ReadByte
                | Self::WriteDevice
                | Self::ReadDevice
        )
    }

    /// The error reported when a transaction of this kind fails on the bus
    pub const fn failure(&self) -> Error {
        if self.is_read() {
            Error::ReadFailed
        } else {
            Error::WriteFailed
        }
    }

    /// Driver capability needed to run this kind
    pub const fn required_feature(&self) -> SmbusFeatures {
        match self {
            Self::WriteQuick => SmbusFeatures::QUICK,
            Self::WriteByte => SmbusFeatures::WRITE_BYTE,
            Self::ReadByte => SmbusFeatures::READ_BYTE,
            Self::WriteByteData => SmbusFeatures::WRITE_BYTE_DATA,
            Self::ReadByteData => SmbusFeatures::READ_BYTE_DATA,
            Self::WriteWordData => SmbusFeatures::WRITE_WORD_DATA,
            Self::ReadWordData => SmbusFeatures::READ_WORD_DATA,
            Self::ProcessCall => SmbusFeatures::PROC_CALL,
            Self::WriteBlockData => SmbusFeatures::WRITE_BLOCK_DATA,
            Self::ReadBlockData => SmbusFeatures::READ_BLOCK_DATA,
            Self::BlockProcessCall => SmbusFeatures::BLOCK_PROC_CALL,
            Self::WriteI2cBlockData => SmbusFeatures::WRITE_I2C_BLOCK,
            Self::ReadI2cBlockData => SmbusFeatures::READ_I2C_BLOCK,
            Self::WriteDevice | Self::ReadDevice => SmbusFeatures::I2C,
        }
    }

    /// Short name used in logs and CLI output
    pub const fn name(&self) -> &'static str {
        match self {
            Self::WriteQuick => "write_quick",
            Self::WriteByte => "write_byte",
            Self::ReadByte => "read_byte",
            Self::WriteByteData => "write_byte_data",
            Self::ReadByteData => "read_byte_data",
            Self::WriteWordData => "write_word_data",
            Self::ReadWordData => "read_word_data",
            Self::ProcessCall => "process_call",
            Self::WriteBlockData => "write_block_data",
            Self::ReadBlockData => "read_block_data",
            Self::BlockProcessCall => "block_process_call",
            Self::WriteI2cBlockData => "write_i2c_block_data",
            Self::ReadI2cBlockData => "read_i2c_block_data",
            Self::WriteDevice => "write_device",
            Self::ReadDevice => "read_device",
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Check if a driver supports the requested transaction kind
///
/// Returns `Ok(())` if supported, otherwise the failure matching the
/// direction of the transaction.
pub fn check_feature_supported(kind: TransactionKind, features: SmbusFeatures) -> Result<()> {
    if features.contains(kind.required_feature()) {
        Ok(())
    } else {
        log::warn!("{} is not supported by this driver", kind);
        Err(kind.failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction() {
        assert!(TransactionKind::ProcessCall.is_read());
        assert!(TransactionKind::BlockProcessCall.is_read());
        assert!(!TransactionKind::WriteQuick.is_read());
        assert_eq!(TransactionKind::ReadDevice.failure(), Error::ReadFailed);
        assert_eq!(TransactionKind::WriteBlockData.failure(), Error::WriteFailed);
    }

    #[test]
    fn test_register_addressing() {
        assert!(TransactionKind::ReadI2cBlockData.has_register());
        assert!(TransactionKind::ProcessCall.has_register());
        assert!(!TransactionKind::WriteDevice.has_register());
        assert!(!TransactionKind::ReadByte.has_register());
    }

    #[test]
    fn test_feature_check() {
        let features = SmbusFeatures::READ_BYTE_DATA | SmbusFeatures::WRITE_BYTE_DATA;
        assert!(check_feature_supported(TransactionKind::ReadByteData, features).is_ok());
        assert_eq!(
            check_feature_supported(TransactionKind::ReadWordData, features),
            Err(Error::ReadFailed)
        );
        assert_eq!(
            check_feature_supported(TransactionKind::WriteQuick, features),
            Err(Error::WriteFailed)
        );
    }
}
