//! Linux I2C device implementation
//!
//! This module provides the `LinuxI2c` struct that implements the
//! `BusDriver` trait using Linux's i2c-dev interface.

use crate::error::{LinuxI2cError, Result};

use rsmbus_core::error::{Error as CoreError, Result as CoreResult};
use rsmbus_core::smbus::BLOCK_MAX;
use rsmbus_core::{BusDriver, Handle, SmbusFeatures, Transaction, TransactionKind};

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// Default directory holding the `i2c-N` device nodes
const DEFAULT_DEV_DIR: &str = "/dev";

/// Linux i2c-dev ioctl constants
mod ioctl {
    use nix::{ioctl_read_bad, ioctl_readwrite_bad, ioctl_write_int_bad};

    /// Bind a 7-bit slave address to the file descriptor
    const I2C_SLAVE: u16 = 0x0703;
    /// Query the adapter functionality mask
    const I2C_FUNCS: u16 = 0x0705;
    /// Perform one SMBus transfer
    const I2C_SMBUS: u16 = 0x0720;

    pub const I2C_SMBUS_READ: u8 = 1;
    pub const I2C_SMBUS_WRITE: u8 = 0;

    pub const I2C_SMBUS_QUICK: u32 = 0;
    pub const I2C_SMBUS_BYTE: u32 = 1;
    pub const I2C_SMBUS_BYTE_DATA: u32 = 2;
    pub const I2C_SMBUS_WORD_DATA: u32 = 3;
    pub const I2C_SMBUS_PROC_CALL: u32 = 4;
    pub const I2C_SMBUS_BLOCK_DATA: u32 = 5;
    pub const I2C_SMBUS_BLOCK_PROC_CALL: u32 = 7;
    pub const I2C_SMBUS_I2C_BLOCK_DATA: u32 = 8;

    ioctl_write_int_bad!(i2c_set_slave, I2C_SLAVE);
    ioctl_read_bad!(i2c_get_funcs, I2C_FUNCS, libc::c_ulong);
    ioctl_readwrite_bad!(i2c_smbus, I2C_SMBUS, super::SmbusIoctlData);
}

/// Data area of an SMBus transfer
///
/// This must match the kernel's `union i2c_smbus_data`: a byte, a
/// native-endian word, or a block whose first byte is the count.
#[repr(C, align(2))]
#[derive(Debug, Clone, Copy)]
struct SmbusData {
    block: [u8; BLOCK_MAX + 2],
}

impl Default for SmbusData {
    fn default() -> Self {
        Self {
            block: [0; BLOCK_MAX + 2],
        }
    }
}

impl SmbusData {
    fn set_word(&mut self, le_bytes: &[u8]) {
        let mut word = [0u8; 2];
        let len = le_bytes.len().min(2);
        word[..len].copy_from_slice(&le_bytes[..len]);
        self.block[..2].copy_from_slice(&u16::from_le_bytes(word).to_ne_bytes());
    }

    fn word_le(&self) -> [u8; 2] {
        u16::from_ne_bytes([self.block[0], self.block[1]]).to_le_bytes()
    }

    fn set_block(&mut self, data: &[u8]) {
        let len = data.len().min(BLOCK_MAX);
        self.block[0] = len as u8;
        self.block[1..=len].copy_from_slice(&data[..len]);
    }

    /// Copy the count-prefixed reply into `buf`, returning the bytes copied
    fn copy_block(&self, buf: &mut [u8]) -> usize {
        let count = (self.block[0] as usize).min(BLOCK_MAX).min(buf.len());
        buf[..count].copy_from_slice(&self.block[1..=count]);
        count
    }
}

/// Argument of the I2C_SMBUS ioctl
///
/// This must match the kernel's `struct i2c_smbus_ioctl_data` layout
#[repr(C)]
#[derive(Debug)]
struct SmbusIoctlData {
    read_write: u8,
    command: u8,
    size: u32,
    data: *mut SmbusData,
}

/// Kernel-level shape of an SMBus transaction
#[derive(Debug, Clone, Copy)]
struct SmbusRequest {
    read_write: u8,
    command: u8,
    size: u32,
    data: SmbusData,
}

impl SmbusRequest {
    /// Translate an SMBus transaction; `None` for plain device transfers
    fn prepare(txn: &Transaction<'_>) -> Option<Self> {
        use self::ioctl::*;

        let mut data = SmbusData::default();
        let command = txn.register_or_zero();

        let (read_write, command, size) = match txn.kind {
            TransactionKind::WriteQuick => {
                let bit = if txn.quick_bit() {
                    I2C_SMBUS_READ
                } else {
                    I2C_SMBUS_WRITE
                };
                (bit, 0, I2C_SMBUS_QUICK)
            }
            TransactionKind::WriteByte => {
                let value = txn.write_data.first().copied().unwrap_or(0);
                (I2C_SMBUS_WRITE, value, I2C_SMBUS_BYTE)
            }
            TransactionKind::ReadByte => (I2C_SMBUS_READ, 0, I2C_SMBUS_BYTE),
            TransactionKind::WriteByteData => {
                data.block[0] = txn.write_data.first().copied().unwrap_or(0);
                (I2C_SMBUS_WRITE, command, I2C_SMBUS_BYTE_DATA)
            }
            TransactionKind::ReadByteData => (I2C_SMBUS_READ, command, I2C_SMBUS_BYTE_DATA),
            TransactionKind::WriteWordData => {
                data.set_word(txn.write_data);
                (I2C_SMBUS_WRITE, command, I2C_SMBUS_WORD_DATA)
            }
            TransactionKind::ReadWordData => (I2C_SMBUS_READ, command, I2C_SMBUS_WORD_DATA),
            TransactionKind::ProcessCall => {
                data.set_word(txn.write_data);
                (I2C_SMBUS_WRITE, command, I2C_SMBUS_PROC_CALL)
            }
            TransactionKind::WriteBlockData => {
                data.set_block(txn.write_data);
                (I2C_SMBUS_WRITE, command, I2C_SMBUS_BLOCK_DATA)
            }
            TransactionKind::ReadBlockData => (I2C_SMBUS_READ, command, I2C_SMBUS_BLOCK_DATA),
            TransactionKind::BlockProcessCall => {
                data.set_block(txn.write_data);
                (I2C_SMBUS_WRITE, command, I2C_SMBUS_BLOCK_PROC_CALL)
            }
            TransactionKind::WriteI2cBlockData => {
                data.set_block(txn.write_data);
                (I2C_SMBUS_WRITE, command, I2C_SMBUS_I2C_BLOCK_DATA)
            }
            TransactionKind::ReadI2cBlockData => {
                // The kernel reads the wanted length from the count byte
                data.block[0] = txn.read_buf.len().min(BLOCK_MAX) as u8;
                (I2C_SMBUS_READ, command, I2C_SMBUS_I2C_BLOCK_DATA)
            }
            TransactionKind::WriteDevice | TransactionKind::ReadDevice => return None,
        };

        Some(Self {
            read_write,
            command,
            size,
            data,
        })
    }

    /// Copy the reply into the transaction's read buffer
    fn finish(&self, txn: &mut Transaction<'_>) -> usize {
        match txn.kind {
            TransactionKind::ReadByte | TransactionKind::ReadByteData => {
                match txn.read_buf.first_mut() {
                    Some(byte) => {
                        *byte = self.data.block[0];
                        1
                    }
                    None => 0,
                }
            }
            TransactionKind::ReadWordData | TransactionKind::ProcessCall => {
                let word = self.data.word_le();
                let len = txn.read_buf.len().min(2);
                txn.read_buf[..len].copy_from_slice(&word[..len]);
                len
            }
            TransactionKind::ReadBlockData
            | TransactionKind::BlockProcessCall
            | TransactionKind::ReadI2cBlockData => self.data.copy_block(txn.read_buf),
            _ => 0,
        }
    }
}

/// Configuration for the Linux I2C driver
#[derive(Debug, Clone)]
pub struct LinuxI2cConfig {
    /// Directory holding the `i2c-N` device nodes (default: /dev)
    pub dev_dir: PathBuf,
}

impl Default for LinuxI2cConfig {
    fn default() -> Self {
        Self {
            dev_dir: PathBuf::from(DEFAULT_DEV_DIR),
        }
    }
}

impl LinuxI2cConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for `i2c-N` device nodes in another directory
    pub fn with_dev_dir(mut self, dev_dir: impl Into<PathBuf>) -> Self {
        self.dev_dir = dev_dir.into();
        self
    }

    /// Path of the device node for a bus
    pub fn bus_path(&self, bus: u32) -> PathBuf {
        self.dev_dir.join(format!("i2c-{}", bus))
    }
}

/// An open device: the bus file bound to one address
struct OpenDevice {
    file: File,
    features: SmbusFeatures,
}

/// Linux I2C driver using the i2c-dev interface
///
/// Each open handle owns its own file descriptor for `/dev/i2c-N`, bound
/// to the handle's device address.
pub struct LinuxI2c {
    config: LinuxI2cConfig,
    devices: HashMap<Handle, OpenDevice>,
}

impl LinuxI2c {
    /// Create a driver with the given configuration
    pub fn new(config: LinuxI2cConfig) -> Self {
        Self {
            config,
            devices: HashMap::new(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &LinuxI2cConfig {
        &self.config
    }

    /// Open the bus node and bind it to a device address
    fn open_device(&self, bus: u32, address: u8) -> Result<OpenDevice> {
        let path = self.config.bus_path(bus);
        log::debug!("linux_i2c: Opening {}", path.display());

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| LinuxI2cError::OpenFailed {
                path: path.display().to_string(),
                source: e,
            })?;

        let fd = file.as_raw_fd();

        unsafe {
            ioctl::i2c_set_slave(fd, address as libc::c_int).map_err(|e| {
                LinuxI2cError::SetAddressFailed {
                    address,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        let mut funcs: libc::c_ulong = 0;
        unsafe {
            ioctl::i2c_get_funcs(fd, &mut funcs).map_err(|e| {
                LinuxI2cError::FuncsFailed(std::io::Error::from_raw_os_error(e as i32))
            })?;
        }
        let features = SmbusFeatures::from_bits_truncate(funcs as u32);

        log::debug!(
            "linux_i2c: {} addr 0x{:02X} functionality 0x{:08X}",
            path.display(),
            address,
            funcs
        );

        Ok(OpenDevice { file, features })
    }

    /// Run one transaction on an open device
    fn run(&mut self, handle: Handle, txn: &mut Transaction<'_>) -> Result<usize> {
        let device = self
            .devices
            .get_mut(&handle)
            .ok_or(LinuxI2cError::NotOpen(handle.raw()))?;

        match txn.kind {
            TransactionKind::WriteDevice => device
                .file
                .write(txn.write_data)
                .map_err(|e| LinuxI2cError::TransferFailed {
                    kind: txn.kind.name(),
                    source: e,
                }),
            TransactionKind::ReadDevice => device
                .file
                .read(txn.read_buf)
                .map_err(|e| LinuxI2cError::TransferFailed {
                    kind: txn.kind.name(),
                    source: e,
                }),
            _ => {
                let mut request = SmbusRequest::prepare(txn).ok_or_else(|| {
                    LinuxI2cError::InvalidParameter(format!("{} is not an SMBus kind", txn.kind))
                })?;
                let mut args = SmbusIoctlData {
                    read_write: request.read_write,
                    command: request.command,
                    size: request.size,
                    data: &mut request.data,
                };

                let fd = device.file.as_raw_fd();
                unsafe {
                    ioctl::i2c_smbus(fd, &mut args)
                        .map_err(|e| LinuxI2cError::transfer(txn.kind.name(), e))?;
                }

                Ok(request.finish(txn))
            }
        }
    }
}

impl BusDriver for LinuxI2c {
    fn has_bus(&self, bus: u32) -> bool {
        self.config.bus_path(bus).exists()
    }

    fn open(&mut self, handle: Handle, bus: u32, address: u8) -> CoreResult<()> {
        match self.open_device(bus, address) {
            Ok(device) => {
                self.devices.insert(handle, device);
                Ok(())
            }
            Err(e) => {
                log::debug!("linux_i2c: {}", e);
                Err(CoreError::OpenFailed)
            }
        }
    }

    fn close(&mut self, handle: Handle) {
        // Dropping the file closes the descriptor
        self.devices.remove(&handle);
    }

    fn features(&self, handle: Handle) -> SmbusFeatures {
        self.devices
            .get(&handle)
            .map_or(SmbusFeatures::empty(), |d| d.features)
    }

    fn transact(&mut self, handle: Handle, txn: &mut Transaction<'_>) -> CoreResult<usize> {
        self.run(handle, txn).map_err(|e| {
            log::debug!("linux_i2c: {}", e);
            txn.kind.failure()
        })
    }
}

/// Parse driver options from a list of key-value pairs
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<LinuxI2cConfig, String> {
    let mut config = LinuxI2cConfig::default();

    for (key, value) in options {
        match *key {
            "dev_dir" => {
                if value.is_empty() {
                    return Err("Empty dev_dir".to_string());
                }
                config.dev_dir = Path::new(value).to_path_buf();
            }
            _ => {
                log::warn!("linux_i2c: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}
