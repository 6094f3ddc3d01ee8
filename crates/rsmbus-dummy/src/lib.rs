//! rsmbus-dummy - In-memory SMBus device emulator for testing
//!
//! This crate provides a bus driver that emulates SMBus/I2C devices in
//! memory. It's useful for testing and development without real hardware.
//!
//! Each emulated device has 256 byte registers, a register pointer used by
//! the register-less kinds, and a store of count-prefixed blocks. Every
//! transaction the driver receives is recorded so tests can check exactly
//! what reached the bus.

pub mod image;

use std::collections::HashMap;
use std::path::PathBuf;

use rsmbus_core::error::{Error, Result};
use rsmbus_core::smbus::BLOCK_MAX;
use rsmbus_core::{BusDriver, Handle, SmbusFeatures, Transaction, TransactionKind};

pub use image::{DeviceContents, DeviceImage, ImageError};

/// Configuration for the dummy bus
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Bus numbers that exist
    pub buses: Vec<u32>,
    /// Capabilities reported for every handle
    pub features: SmbusFeatures,
    /// Create a blank device on open if none is present at the address
    pub open_any: bool,
    /// Device image to preload
    pub image: Option<PathBuf>,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            buses: vec![0, 1],
            features: SmbusFeatures::all(),
            open_any: true,
            image: None,
        }
    }
}

/// One emulated SMBus device
#[derive(Debug, Clone)]
pub struct DummyDevice {
    registers: [u8; 256],
    pointer: u8,
    blocks: HashMap<u8, Vec<u8>>,
}

impl Default for DummyDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyDevice {
    /// Create a device with every register cleared
    pub fn new() -> Self {
        Self {
            registers: [0; 256],
            pointer: 0,
            blocks: HashMap::new(),
        }
    }

    /// Build a device from image contents
    pub fn from_contents(contents: &DeviceContents) -> Self {
        let mut device = Self::new();
        for &(register, value) in &contents.registers {
            device.registers[register as usize] = value;
        }
        for (register, data) in &contents.blocks {
            device.blocks.insert(*register, data.clone());
        }
        device
    }

    /// All 256 registers
    pub fn registers(&self) -> &[u8; 256] {
        &self.registers
    }

    /// Read one register
    pub fn register(&self, register: u8) -> u8 {
        self.registers[register as usize]
    }

    /// Set one register
    pub fn set_register(&mut self, register: u8, value: u8) {
        self.registers[register as usize] = value;
    }

    /// Register pointer used by byte and device transfers
    pub fn pointer(&self) -> u8 {
        self.pointer
    }

    /// Block served to block reads of `register`
    pub fn block(&self, register: u8) -> Option<&[u8]> {
        self.blocks.get(&register).map(Vec::as_slice)
    }

    /// Set the block served to block reads of `register`
    ///
    /// Blocks longer than 32 bytes are truncated.
    pub fn set_block(&mut self, register: u8, data: &[u8]) {
        let len = data.len().min(BLOCK_MAX);
        self.blocks.insert(register, data[..len].to_vec());
    }

    fn next_pointer(&mut self) -> usize {
        let current = self.pointer as usize;
        self.pointer = self.pointer.wrapping_add(1);
        current
    }

    fn write_sequential(&mut self, start: u8, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.registers[start.wrapping_add(i as u8) as usize] = byte;
        }
    }

    fn read_sequential(&self, start: u8, buf: &mut [u8]) {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.registers[start.wrapping_add(i as u8) as usize];
        }
    }

    fn copy_reply(reply: &[u8], buf: &mut [u8]) -> usize {
        let len = reply.len().min(buf.len());
        buf[..len].copy_from_slice(&reply[..len]);
        len
    }

    /// Apply one transaction, returning the number of bytes read
    fn execute(&mut self, txn: &mut Transaction<'_>) -> usize {
        let reg = txn.register_or_zero();

        match txn.kind {
            TransactionKind::WriteQuick => 0,
            TransactionKind::WriteByte => {
                self.pointer = txn.write_data.first().copied().unwrap_or(0);
                0
            }
            TransactionKind::ReadByte => match txn.read_buf.first_mut() {
                Some(byte) => {
                    let index = self.next_pointer();
                    *byte = self.registers[index];
                    1
                }
                None => 0,
            },
            TransactionKind::WriteByteData
            | TransactionKind::WriteWordData
            | TransactionKind::WriteI2cBlockData => {
                self.write_sequential(reg, txn.write_data);
                0
            }
            TransactionKind::ReadByteData
            | TransactionKind::ReadWordData
            | TransactionKind::ReadI2cBlockData => {
                self.read_sequential(reg, txn.read_buf);
                txn.read_buf.len()
            }
            TransactionKind::ProcessCall => {
                // Reply with the old word, keep the new one
                self.read_sequential(reg, txn.read_buf);
                self.write_sequential(reg, txn.write_data);
                txn.read_buf.len()
            }
            TransactionKind::WriteBlockData => {
                self.blocks.insert(reg, txn.write_data.to_vec());
                0
            }
            TransactionKind::ReadBlockData => match self.blocks.get(&reg) {
                Some(block) => Self::copy_reply(block, txn.read_buf),
                None => 0,
            },
            TransactionKind::BlockProcessCall => {
                // Reply with the stored block, or echo the request if none
                let reply = self
                    .blocks
                    .insert(reg, txn.write_data.to_vec())
                    .unwrap_or_else(|| txn.write_data.to_vec());
                Self::copy_reply(&reply, txn.read_buf)
            }
            TransactionKind::WriteDevice => {
                // First byte selects the register, the rest is stored from there
                if let Some((&start, rest)) = txn.write_data.split_first() {
                    self.write_sequential(start, rest);
                    self.pointer = start.wrapping_add(rest.len() as u8);
                }
                0
            }
            TransactionKind::ReadDevice => {
                for byte in txn.read_buf.iter_mut() {
                    let index = self.next_pointer();
                    *byte = self.registers[index];
                }
                txn.read_buf.len()
            }
        }
    }
}

/// A transaction as seen by the dummy bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Handle the transaction ran on
    pub handle: Handle,
    /// Bus of that handle
    pub bus: u32,
    /// Device address of that handle
    pub address: u8,
    /// Transaction kind
    pub kind: TransactionKind,
    /// Register, for register-addressed kinds
    pub register: Option<u8>,
    /// Bytes sent to the device
    pub write_data: Vec<u8>,
    /// Size of the read buffer offered to the device
    pub read_len: usize,
}

/// Dummy SMBus driver
///
/// Emulates any number of devices on a configurable set of buses.
pub struct DummyBus {
    buses: Vec<u32>,
    features: SmbusFeatures,
    open_any: bool,
    devices: HashMap<(u32, u8), DummyDevice>,
    rejected: Vec<(u32, u8)>,
    handles: HashMap<Handle, (u32, u8)>,
    log: Vec<Record>,
    fail_count: usize,
}

impl Default for DummyBus {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyBus {
    /// Create a dummy bus with default configuration (buses 0 and 1)
    pub fn new() -> Self {
        let config = DummyConfig::default();
        Self {
            buses: config.buses,
            features: config.features,
            open_any: config.open_any,
            devices: HashMap::new(),
            rejected: Vec::new(),
            handles: HashMap::new(),
            log: Vec::new(),
            fail_count: 0,
        }
    }

    /// Create a dummy bus from a configuration, loading its image if any
    pub fn from_config(config: &DummyConfig) -> std::result::Result<Self, ImageError> {
        let mut bus = Self::new();
        bus.buses = config.buses.clone();
        bus.features = config.features;
        bus.open_any = config.open_any;

        if let Some(path) = &config.image {
            let image = DeviceImage::from_toml_file(path)?;
            log::debug!(
                "dummy: loaded {} device(s) from {}",
                image.devices.len(),
                path.display()
            );
            bus.load_image(&image);
        }

        Ok(bus)
    }

    /// Add the devices (and buses, if listed) of an image
    pub fn load_image(&mut self, image: &DeviceImage) {
        if !image.buses.is_empty() {
            self.buses = image.buses.clone();
        }
        for contents in &image.devices {
            self.devices.insert(
                (contents.bus, contents.address),
                DummyDevice::from_contents(contents),
            );
        }
    }

    /// Replace the capability set reported for every handle
    pub fn with_features(mut self, features: SmbusFeatures) -> Self {
        self.features = features;
        self
    }

    /// Place a device at an address
    pub fn insert_device(&mut self, bus: u32, address: u8, device: DummyDevice) {
        self.devices.insert((bus, address), device);
    }

    /// Get the device at an address
    pub fn device(&self, bus: u32, address: u8) -> Option<&DummyDevice> {
        self.devices.get(&(bus, address))
    }

    /// Get the device at an address mutably
    pub fn device_mut(&mut self, bus: u32, address: u8) -> Option<&mut DummyDevice> {
        self.devices.get_mut(&(bus, address))
    }

    /// Make opens of an address fail as if the device did not respond
    pub fn reject_device(&mut self, bus: u32, address: u8) {
        self.rejected.push((bus, address));
    }

    /// Fail the next `count` transactions
    pub fn fail_next(&mut self, count: usize) {
        self.fail_count = count;
    }

    /// Every transaction received so far
    pub fn log(&self) -> &[Record] {
        &self.log
    }

    /// Most recent transaction
    pub fn last(&self) -> Option<&Record> {
        self.log.last()
    }

    /// Forget recorded transactions
    pub fn clear_log(&mut self) {
        self.log.clear();
    }
}

impl BusDriver for DummyBus {
    fn has_bus(&self, bus: u32) -> bool {
        self.buses.contains(&bus)
    }

    fn open(&mut self, handle: Handle, bus: u32, address: u8) -> Result<()> {
        if self.rejected.contains(&(bus, address)) {
            return Err(Error::OpenFailed);
        }

        if !self.devices.contains_key(&(bus, address)) {
            if !self.open_any {
                log::debug!("dummy: no device at bus {} addr 0x{:02X}", bus, address);
                return Err(Error::OpenFailed);
            }
            self.devices.insert((bus, address), DummyDevice::new());
        }

        self.handles.insert(handle, (bus, address));
        Ok(())
    }

    fn close(&mut self, handle: Handle) {
        self.handles.remove(&handle);
    }

    fn features(&self, _handle: Handle) -> SmbusFeatures {
        self.features
    }

    fn transact(&mut self, handle: Handle, txn: &mut Transaction<'_>) -> Result<usize> {
        let Some(&(bus, address)) = self.handles.get(&handle) else {
            return Err(txn.kind.failure());
        };

        self.log.push(Record {
            handle,
            bus,
            address,
            kind: txn.kind,
            register: txn.register,
            write_data: txn.write_data.to_vec(),
            read_len: txn.read_buf.len(),
        });

        if self.fail_count > 0 {
            self.fail_count -= 1;
            log::debug!("dummy: injected {} failure", txn.kind);
            return Err(txn.kind.failure());
        }

        let device = self
            .devices
            .get_mut(&(bus, address))
            .ok_or(txn.kind.failure())?;
        Ok(device.execute(txn))
    }
}

/// Parse dummy options from driver string parameters
///
/// # Options
///
/// - `buses=0+1` - bus numbers that exist, separated by `+` (default: 0+1)
/// - `image=<file.toml>` - device image to preload
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<DummyConfig, String> {
    let mut config = DummyConfig::default();

    for (key, value) in options {
        match *key {
            "buses" => {
                config.buses = value
                    .split('+')
                    .map(|bus| {
                        bus.trim()
                            .parse()
                            .map_err(|_| format!("Invalid bus number: {}", bus))
                    })
                    .collect::<std::result::Result<_, _>>()?;
            }
            "image" => {
                config.image = Some(PathBuf::from(value));
            }
            _ => {
                log::warn!("dummy: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

/// Create a dummy bus and return it as a boxed driver
///
/// This is a convenience function for use in the CLI driver dispatch.
pub fn open_dummy(
    options: &[(&str, &str)],
) -> std::result::Result<Box<dyn BusDriver + Send>, Box<dyn std::error::Error>> {
    let config = parse_options(options)?;
    let bus = DummyBus::from_config(&config)?;
    Ok(Box::new(bus))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsmbus_core::{BufferTarget, ByteCursor, Charset, Smbus, WriteRequest};

    fn open(bus: &mut Smbus<DummyBus>) -> Handle {
        bus.open_default(1, 0x48).unwrap()
    }

    #[test]
    fn test_register_round_trip() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);

        assert_eq!(bus.write_byte_data(h, 0x00, 0x80), Ok(()));
        assert_eq!(bus.read_byte_data(h, 0x00), Ok(0x80));

        for reg in [0x01u8, 0x7F, 0xFF] {
            bus.write_byte_data(h, reg, reg ^ 0x5A).unwrap();
            assert_eq!(bus.read_byte_data(h, reg).unwrap(), reg ^ 0x5A);
        }
    }

    #[test]
    fn test_word_and_process_call() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);

        bus.write_word_data(h, 0x10, 0xBEEF).unwrap();
        assert_eq!(bus.read_word_data(h, 0x10).unwrap(), 0xBEEF);
        assert_eq!(bus.read_byte_data(h, 0x10).unwrap(), 0xEF);
        assert_eq!(bus.read_byte_data(h, 0x11).unwrap(), 0xBE);

        assert_eq!(bus.process_call(h, 0x10, 0x1234).unwrap(), 0xBEEF);
        assert_eq!(bus.read_word_data(h, 0x10).unwrap(), 0x1234);
    }

    #[test]
    fn test_byte_pointer_and_quick() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);

        bus.write_byte_data(h, 0x05, 0x11).unwrap();
        bus.write_byte_data(h, 0x06, 0x22).unwrap();
        bus.write_byte(h, 0x05).unwrap();
        assert_eq!(bus.read_byte(h).unwrap(), 0x11);
        assert_eq!(bus.read_byte(h).unwrap(), 0x22);

        bus.write_quick(h, true).unwrap();
        let record = bus.driver().last().unwrap();
        assert_eq!(record.kind, TransactionKind::WriteQuick);
        assert_eq!(record.write_data, vec![1]);
    }

    #[test]
    fn test_block_write_clamped_to_32() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);
        let data: Vec<u8> = (0..40).collect();

        bus.write_block_data(h, 0x20, &data, 0, 40).unwrap();
        let record = bus.driver().last().unwrap();
        assert_eq!(record.kind, TransactionKind::WriteBlockData);
        assert_eq!(record.write_data.len(), 32);
        assert_eq!(record.write_data, data[..32].to_vec());

        let sent = bus
            .write(h, BufferTarget::I2cBlock { register: 0 }, WriteRequest::bytes(&data))
            .unwrap();
        assert_eq!(sent, 32);
        assert_eq!(bus.driver().last().unwrap().write_data.len(), 32);

        // Zero-length SMBus blocks are legal
        bus.write_block_data(h, 0x21, &data, 0, 0).unwrap();
        assert!(bus.driver().last().unwrap().write_data.is_empty());
    }

    #[test]
    fn test_explicit_range_clamped() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);
        let data: Vec<u8> = (0..10).collect();

        bus.write_i2c_block_data(h, 0x00, &data, 6, 100).unwrap();
        assert_eq!(bus.driver().last().unwrap().write_data, vec![6, 7, 8, 9]);

        assert_eq!(
            bus.write_i2c_block_data(h, 0x00, &data, 11, 1),
            Err(Error::BadParam)
        );
        assert_eq!(
            bus.write_i2c_block_data(h, 0x00, &data, 10, 1),
            Err(Error::BadParam)
        );
    }

    #[test]
    fn test_short_block_read_leaves_tail() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);
        bus.driver_mut()
            .device_mut(1, 0x48)
            .unwrap()
            .set_block(0x10, &[1, 2, 3, 4]);

        let mut buf = [0xEEu8; 32];
        assert_eq!(bus.read_block_data(h, 0x10, &mut buf, 0, 32), Ok(4));
        assert_eq!(&buf[..4], &[1, 2, 3, 4]);
        assert!(buf[4..].iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn test_block_read_with_offset() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);
        bus.write_block_data(h, 0x10, &[9, 8, 7], 0, 3).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(bus.read_block_data(h, 0x10, &mut buf, 4, 100), Ok(3));
        assert_eq!(buf, [0, 0, 0, 0, 9, 8, 7, 0]);
        assert_eq!(bus.driver().last().unwrap().read_len, 4);
    }

    #[test]
    fn test_cursor_read_rewinds_when_exhausted() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);
        let data: Vec<u8> = (1..=10).collect();
        bus.write_i2c_block_data(h, 0x00, &data, 0, 10).unwrap();

        let mut cursor = ByteCursor::new([0u8; 10]);
        cursor.set_position(10).unwrap();
        assert_eq!(cursor.limit(), 10);

        let count = bus
            .read_cursor(h, BufferTarget::I2cBlock { register: 0 }, &mut cursor, None)
            .unwrap();
        assert_eq!(count, 10);
        assert_eq!(cursor.get_ref(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        // Rewound, then moved past the bytes received
        assert_eq!((cursor.position(), cursor.limit()), (10, 10));
    }

    #[test]
    fn test_cursor_read_short_block() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);
        bus.driver_mut()
            .device_mut(1, 0x48)
            .unwrap()
            .set_block(0x10, &[1, 2, 3, 4]);

        let mut cursor = ByteCursor::new([0xEEu8; 10]);
        cursor.set_position(2).unwrap();

        let count = bus
            .read_cursor(h, BufferTarget::BlockData { register: 0x10 }, &mut cursor, None)
            .unwrap();
        assert_eq!(count, 4);
        assert_eq!(
            cursor.get_ref(),
            &[0xEE, 0xEE, 1, 2, 3, 4, 0xEE, 0xEE, 0xEE, 0xEE]
        );
        assert_eq!((cursor.position(), cursor.limit()), (6, 10));
        assert_eq!(bus.driver().last().unwrap().read_len, 8);
    }

    #[test]
    fn test_cursor_write_flips_when_exhausted() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);

        let mut cursor = ByteCursor::new([1u8, 2, 3, 4, 5, 0, 0, 0]);
        cursor.set_position(5).unwrap();
        cursor.set_limit(5).unwrap();

        let sent = bus
            .write_cursor(h, BufferTarget::BlockData { register: 0x30 }, &mut cursor, None)
            .unwrap();
        assert_eq!(sent, 5);
        assert_eq!(bus.driver().last().unwrap().write_data, vec![1, 2, 3, 4, 5]);
        assert_eq!((cursor.position(), cursor.limit()), (0, 5));

        cursor.advance(2);
        let sent = bus
            .write_cursor(h, BufferTarget::Device, &mut cursor, Some(2))
            .unwrap();
        assert_eq!(sent, 2);
        assert_eq!(bus.driver().last().unwrap().write_data, vec![3, 4]);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_cursor_restored_on_error() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);

        let mut cursor = ByteCursor::new([0u8; 10]);
        cursor.set_position(10).unwrap();
        bus.driver_mut().fail_next(1);

        let result = bus.read_cursor(h, BufferTarget::Device, &mut cursor, None);
        assert_eq!(result, Err(Error::ReadFailed));
        assert_eq!((cursor.position(), cursor.limit()), (10, 10));
    }

    #[test]
    fn test_block_process_call_in_place_short_reply() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);
        bus.driver_mut()
            .device_mut(1, 0x48)
            .unwrap()
            .set_block(0x40, &[0xAA, 0xBB]);

        let mut data = [1u8, 2, 3, 4, 5];
        let count = bus
            .block_process_call_in_place(h, 0x40, &mut data, 0, 5)
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(data, [0xAA, 0xBB, 3, 4, 5]);

        let record = bus.driver().last().unwrap();
        assert_eq!(record.write_data, vec![1, 2, 3, 4, 5]);
        assert_eq!(record.read_len, 5);
    }

    #[test]
    fn test_block_process_call_limits() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);
        let data = [0x55u8; 40];
        let mut reply = [0u8; 32];

        // Request clamped to 31 bytes, one byte left for the reply
        let count = bus
            .block_process_call(h, 0x00, &data, 0, 40, &mut reply, 0)
            .unwrap();
        assert_eq!(count, 1);
        let record = bus.driver().last().unwrap();
        assert_eq!(record.write_data.len(), 31);
        assert_eq!(record.read_len, 1);

        assert_eq!(
            bus.block_process_call(h, 0x00, &data, 0, 0, &mut reply, 0),
            Err(Error::BadParam)
        );
        assert_eq!(
            bus.block_process_call(h, 0x00, &data, 0, 4, &mut reply, 32),
            Err(Error::BadParam)
        );
    }

    #[test]
    fn test_text_defaults_to_ascii() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);

        let sent = bus
            .write(h, BufferTarget::Device, WriteRequest::text("\u{e9}AB"))
            .unwrap();
        assert_eq!(sent, 3);
        assert_eq!(bus.driver().last().unwrap().write_data, vec![b'?', b'A', b'B']);

        let sent = bus
            .write(
                h,
                BufferTarget::Device,
                WriteRequest::text("\u{e9}AB").with_charset(Charset::Utf8),
            )
            .unwrap();
        assert_eq!(sent, 4);
        assert_eq!(
            bus.driver().last().unwrap().write_data,
            vec![0xC3, 0xA9, b'A', b'B']
        );
    }

    #[test]
    fn test_device_transfers() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);

        // Register pointer, then two data bytes
        bus.write_device(h, &[0x20, 0xCA, 0xFE], 0, 3).unwrap();
        bus.write_byte(h, 0x20).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(bus.read_device(h, &mut buf, 1, 2), Ok(2));
        assert_eq!(buf, [0, 0xCA, 0xFE, 0]);

        let mut whole = [0u8; 3];
        bus.write_byte(h, 0x20).unwrap();
        assert_eq!(bus.read_into(h, BufferTarget::Device, &mut whole), Ok(3));
        assert_eq!(whole, [0xCA, 0xFE, 0x00]);

        assert_eq!(bus.write_device(h, &[], 0, 0), Err(Error::BadParam));
    }

    #[test]
    fn test_bad_handle_after_close() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);
        assert_eq!(bus.session(h).unwrap().address, 0x48);
        bus.close(h).unwrap();
        assert_eq!(bus.session(h), Err(Error::BadHandle));

        let mut buf = [0u8; 8];
        assert_eq!(bus.write_quick(h, false), Err(Error::BadHandle));
        assert_eq!(bus.read_byte(h), Err(Error::BadHandle));
        assert_eq!(bus.write_byte_data(h, 0, 0), Err(Error::BadHandle));
        assert_eq!(bus.read_word_data(h, 0), Err(Error::BadHandle));
        assert_eq!(bus.process_call(h, 0, 0), Err(Error::BadHandle));
        assert_eq!(bus.write_block_data(h, 0, &buf, 0, 8), Err(Error::BadHandle));
        assert_eq!(bus.read_block_data(h, 0, &mut buf, 0, 8), Err(Error::BadHandle));
        assert_eq!(
            bus.block_process_call_in_place(h, 0, &mut buf, 0, 8),
            Err(Error::BadHandle)
        );
        assert_eq!(bus.write_i2c_block_data(h, 0, &buf, 0, 0), Err(Error::BadHandle));
        assert_eq!(bus.read_device(h, &mut buf, 0, 8), Err(Error::BadHandle));

        // A closed handle wins over an out-of-range offset
        assert_eq!(bus.write_block_data(h, 0, &buf, 9, 1), Err(Error::BadHandle));
        assert_eq!(bus.read_block_data(h, 0, &mut buf, 9, 1), Err(Error::BadHandle));
        assert_eq!(
            bus.block_process_call_in_place(h, 0, &mut buf, 9, 1),
            Err(Error::BadHandle)
        );
        assert_eq!(bus.write_i2c_block_data(h, 0, &buf, 9, 1), Err(Error::BadHandle));
        assert_eq!(bus.read_i2c_block_data(h, 0, &mut buf, 9, 1), Err(Error::BadHandle));
        assert_eq!(bus.write_device(h, &buf, 9, 1), Err(Error::BadHandle));
        assert_eq!(bus.read_device(h, &mut buf, 9, 1), Err(Error::BadHandle));
        assert_eq!(
            bus.write(
                h,
                BufferTarget::Device,
                WriteRequest::bytes(&[1, 2]).with_offset(9)
            ),
            Err(Error::BadHandle)
        );

        let mut cursor = ByteCursor::new([0u8; 4]);
        cursor.set_position(4).unwrap();
        assert_eq!(
            bus.read_cursor(h, BufferTarget::Device, &mut cursor, None),
            Err(Error::BadHandle)
        );
        assert_eq!((cursor.position(), cursor.limit()), (4, 4));

        assert_eq!(bus.close(h), Err(Error::BadHandle));

        assert!(bus.driver().log().is_empty());
    }

    #[test]
    fn test_open_errors() {
        let mut driver = DummyBus::new();
        driver.reject_device(1, 0x50);
        let mut bus = Smbus::with_max_sessions(driver, 1);

        assert_eq!(bus.open(7, 0x48, 0), Err(Error::BadBus));
        assert_eq!(bus.open(1, 0x80, 0), Err(Error::BadAddr));
        assert_eq!(bus.open(1, 0x48, 1), Err(Error::BadFlags));
        assert_eq!(bus.open(1, 0x50, 0), Err(Error::OpenFailed));
        assert_eq!(bus.open_count(), 0);

        let h = bus.open(0, 0x48, 0).unwrap();
        assert_eq!(h.raw(), 0);
        assert_eq!(bus.open(0, 0x49, 0), Err(Error::NoHandle));
    }

    #[test]
    fn test_unsupported_kind_not_sent() {
        let driver = DummyBus::new().with_features(SmbusFeatures::BYTE | SmbusFeatures::I2C);
        let mut bus = Smbus::new(driver);
        let h = open(&mut bus);
        let mut buf = [0u8; 4];

        assert_eq!(bus.read_word_data(h, 0), Err(Error::ReadFailed));
        assert_eq!(bus.write_block_data(h, 0, &buf, 0, 4), Err(Error::WriteFailed));
        assert_eq!(
            bus.block_process_call_in_place(h, 0, &mut buf, 0, 4),
            Err(Error::ReadFailed)
        );
        assert!(bus.driver().log().is_empty());

        bus.write_byte(h, 0).unwrap();
        assert_eq!(bus.driver().log().len(), 1);
    }

    #[test]
    fn test_injected_failure_direction() {
        let mut bus = Smbus::new(DummyBus::new());
        let h = open(&mut bus);

        bus.driver_mut().fail_next(2);
        assert_eq!(bus.write_byte_data(h, 0, 1), Err(Error::WriteFailed));
        assert_eq!(bus.read_byte_data(h, 0), Err(Error::ReadFailed));
        assert_eq!(bus.read_byte_data(h, 0), Ok(0));
    }

    #[test]
    fn test_shared_across_threads() {
        use std::sync::Mutex;

        let bus = Mutex::new(Smbus::new(DummyBus::new()));
        std::thread::scope(|s| {
            for reg in 0..4u8 {
                let bus = &bus;
                s.spawn(move || {
                    let mut bus = bus.lock().unwrap();
                    let h = bus.open_default(1, 0x48).unwrap();
                    bus.write_byte_data(h, reg, reg + 1).unwrap();
                    bus.close(h).unwrap();
                });
            }
        });

        let mut bus = bus.into_inner().unwrap();
        let h = open(&mut bus);
        for reg in 0..4u8 {
            assert_eq!(bus.read_byte_data(h, reg).unwrap(), reg + 1);
        }
    }

    #[test]
    fn test_load_image() {
        let image = DeviceImage::from_toml_str(
            r#"
buses = [3]

[[device]]
bus = 3
address = "0x50"

[[device.register]]
addr = 0x00
value = 0x80

[[device.block]]
register = 0x10
data = [1, 2]
"#,
        )
        .unwrap();

        let mut driver = DummyBus::new();
        driver.load_image(&image);
        let mut bus = Smbus::new(driver);

        assert_eq!(bus.open_default(1, 0x50), Err(Error::BadBus));
        let h = bus.open_default(3, 0x50).unwrap();
        assert_eq!(bus.read_byte_data(h, 0x00), Ok(0x80));

        let mut buf = [0u8; 32];
        assert_eq!(bus.read_block_data(h, 0x10, &mut buf, 0, 32), Ok(2));
    }

    #[test]
    fn test_closed_world() {
        let config = DummyConfig {
            open_any: false,
            ..Default::default()
        };
        let mut driver = DummyBus::from_config(&config).unwrap();
        driver.insert_device(1, 0x48, DummyDevice::new());
        let mut bus = Smbus::new(driver);

        assert!(bus.open_default(1, 0x48).is_ok());
        assert_eq!(bus.open_default(1, 0x49), Err(Error::OpenFailed));
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("buses", "0+2+5")]).unwrap();
        assert_eq!(config.buses, vec![0, 2, 5]);
        assert!(config.image.is_none());

        let config = parse_options(&[("image", "devices.toml")]).unwrap();
        assert_eq!(config.image, Some(PathBuf::from("devices.toml")));

        assert!(parse_options(&[("buses", "1+x")]).is_err());
    }
}
