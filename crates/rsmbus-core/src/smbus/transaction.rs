//! SMBus transaction structure

use super::TransactionKind;

/// A single SMBus/I2C transaction
///
/// Designed to avoid allocation - uses slices for data.
/// The lifetime parameter `'a` ties the transaction to the buffers it
/// references. Word values are carried little-endian in `write_data` and
/// `read_buf`.
pub struct Transaction<'a> {
    /// What to perform on the bus
    pub kind: TransactionKind,

    /// Register (command code), for register-addressed kinds only
    pub register: Option<u8>,

    /// Payload sent to the device
    pub write_data: &'a [u8],

    /// Buffer receiving the device's response
    pub read_buf: &'a mut [u8],
}

impl<'a> Transaction<'a> {
    fn new(
        kind: TransactionKind,
        register: Option<u8>,
        write_data: &'a [u8],
        read_buf: &'a mut [u8],
    ) -> Self {
        Self {
            kind,
            register,
            write_data,
            read_buf,
        }
    }

    /// Quick command; `bit` is sent in the R/W position
    pub fn quick(bit: bool) -> Self {
        let data: &'static [u8] = if bit { &[1] } else { &[0] };
        Self::new(TransactionKind::WriteQuick, None, data, &mut [])
    }

    /// Send one byte without a register
    pub fn write_byte(value: &'a [u8; 1]) -> Self {
        Self::new(TransactionKind::WriteByte, None, value, &mut [])
    }

    /// Receive one byte without a register
    pub fn read_byte(buf: &'a mut [u8; 1]) -> Self {
        Self::new(TransactionKind::ReadByte, None, &[], buf)
    }

    /// Write one byte to a register
    pub fn write_byte_data(register: u8, value: &'a [u8; 1]) -> Self {
        Self::new(TransactionKind::WriteByteData, Some(register), value, &mut [])
    }

    /// Read one byte from a register
    pub fn read_byte_data(register: u8, buf: &'a mut [u8; 1]) -> Self {
        Self::new(TransactionKind::ReadByteData, Some(register), &[], buf)
    }

    /// Write a little-endian word to a register
    pub fn write_word_data(register: u8, value: &'a [u8; 2]) -> Self {
        Self::new(TransactionKind::WriteWordData, Some(register), value, &mut [])
    }

    /// Read a little-endian word from a register
    pub fn read_word_data(register: u8, buf: &'a mut [u8; 2]) -> Self {
        Self::new(TransactionKind::ReadWordData, Some(register), &[], buf)
    }

    /// Write a word and read a word back in one transaction
    pub fn process_call(register: u8, value: &'a [u8; 2], buf: &'a mut [u8; 2]) -> Self {
        Self::new(TransactionKind::ProcessCall, Some(register), value, buf)
    }

    /// Write a count-prefixed block to a register
    pub fn write_block_data(register: u8, data: &'a [u8]) -> Self {
        Self::new(TransactionKind::WriteBlockData, Some(register), data, &mut [])
    }

    /// Read a count-prefixed block from a register
    pub fn read_block_data(register: u8, buf: &'a mut [u8]) -> Self {
        Self::new(TransactionKind::ReadBlockData, Some(register), &[], buf)
    }

    /// Write a block and read a block back in one transaction
    pub fn block_process_call(register: u8, data: &'a [u8], buf: &'a mut [u8]) -> Self {
        Self::new(TransactionKind::BlockProcessCall, Some(register), data, buf)
    }

    /// Write a raw block to a register
    pub fn write_i2c_block_data(register: u8, data: &'a [u8]) -> Self {
        Self::new(TransactionKind::WriteI2cBlockData, Some(register), data, &mut [])
    }

    /// Read a raw block from a register
    pub fn read_i2c_block_data(register: u8, buf: &'a mut [u8]) -> Self {
        Self::new(TransactionKind::ReadI2cBlockData, Some(register), &[], buf)
    }

    /// Plain I2C write
    pub fn write_device(data: &'a [u8]) -> Self {
        Self::new(TransactionKind::WriteDevice, None, data, &mut [])
    }

    /// Plain I2C read
    pub fn read_device(buf: &'a mut [u8]) -> Self {
        Self::new(TransactionKind::ReadDevice, None, &[], buf)
    }

    /// Register of a register-addressed transaction, 0 otherwise
    pub fn register_or_zero(&self) -> u8 {
        self.register.unwrap_or(0)
    }

    /// Bit sent by a quick command
    pub fn quick_bit(&self) -> bool {
        self.write_data.first().is_some_and(|&b| b != 0)
    }

    /// Returns true if this transaction has a read phase
    pub fn has_read(&self) -> bool {
        !self.read_buf.is_empty()
    }

    /// Returns true if this transaction has a write phase
    pub fn has_write(&self) -> bool {
        !self.write_data.is_empty()
    }
}
