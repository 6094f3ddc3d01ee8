//! Transaction Dispatcher
//!
//! [`Smbus`] owns a bus driver and the session table. It exposes one
//! canonical primitive per transaction kind, taking explicit
//! `(handle, [register], storage, offset, length)` arguments, plus a few
//! conveniences that resolve other argument shapes (see [`crate::buffer`])
//! and then call those same primitives.
//!
//! Every primitive follows the same order:
//! 1. the handle must be open (`BadHandle`)
//! 2. offsets and lengths are resolved and clamped (`BadParam` only when
//!    nothing sensible can be sent or received)
//! 3. the driver must support the kind (`WriteFailed`/`ReadFailed`)
//! 4. exactly one driver transaction runs; its failure is returned as is
//!
//! Reads go through a scratch buffer and only the bytes the device actually
//! returned are copied into caller storage, so a failed or short read never
//! disturbs bytes it did not produce.

use alloc::vec;

use crate::buffer::{
    resolve_cursor_read, resolve_cursor_write, resolve_explicit, BufferTarget, ByteCursor, Span,
    WriteRequest,
};
use crate::driver::BusDriver;
use crate::error::{Error, Result};
use crate::session::{Handle, Session, SessionTable};
use crate::smbus::{check_feature_supported, Transaction, TransactionKind, BLOCK_MAX};

/// Largest write half of a block process call (one byte is left for the reply)
pub const BLOCK_PROC_CALL_WRITE_MAX: usize = BLOCK_MAX - 1;

/// SMBus/I2C access through a bus driver
///
/// All methods take `&mut self`, so one `Smbus` (and every handle it owns)
/// is used by one thread at a time. Wrap it in a `Mutex` to share it.
pub struct Smbus<D> {
    driver: D,
    sessions: SessionTable,
}

impl<D: BusDriver> Smbus<D> {
    /// Create a dispatcher with the default session capacity
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            sessions: SessionTable::default(),
        }
    }

    /// Create a dispatcher allowing at most `max_sessions` open handles
    pub fn with_max_sessions(driver: D, max_sessions: usize) -> Self {
        Self {
            driver,
            sessions: SessionTable::with_capacity(max_sessions),
        }
    }

    /// Get a reference to the driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Unwrap the driver
    pub fn into_driver(self) -> D {
        self.driver
    }

    // =========================================================================
    // Handle Gateway
    // =========================================================================

    /// Open a device on a bus
    ///
    /// Fails with `BadBus` if the driver does not know the bus, `BadAddr`
    /// if `address > 0x7F`, `BadFlags` if `flags != 0`, `NoHandle` if every
    /// session slot is taken, or the driver's error (normally
    /// `OpenFailed`) if it rejects the device.
    pub fn open(&mut self, bus: u32, address: u8, flags: u32) -> Result<Handle> {
        if !self.driver.has_bus(bus) {
            log::debug!("open: bus {} does not exist", bus);
            return Err(Error::BadBus);
        }

        let handle = self.sessions.allocate(bus, address, flags)?;

        if let Err(e) = self.driver.open(handle, bus, address) {
            log::debug!("open: driver rejected bus {} addr 0x{:02X}: {}", bus, address, e);
            // Slot was allocated just above
            let _ = self.sessions.release(handle);
            return Err(e);
        }

        log::debug!("Opened handle {} (bus {}, addr 0x{:02X})", handle, bus, address);
        Ok(handle)
    }

    /// Open a device with no flags
    pub fn open_default(&mut self, bus: u32, address: u8) -> Result<Handle> {
        self.open(bus, address, 0)
    }

    /// Close a handle; any later use of it fails with `BadHandle`
    pub fn close(&mut self, handle: Handle) -> Result<()> {
        self.sessions.release(handle)?;
        self.driver.close(handle);
        log::debug!("Closed handle {}", handle);
        Ok(())
    }

    /// Bus and device bound to an open handle
    pub fn session(&self, handle: Handle) -> Result<Session> {
        self.sessions.get(handle)
    }

    /// Number of open handles
    pub fn open_count(&self) -> usize {
        self.sessions.open_count()
    }

    /// Run one transaction against an open handle
    fn transact(&mut self, handle: Handle, txn: &mut Transaction<'_>) -> Result<usize> {
        self.sessions.get(handle)?;
        check_feature_supported(txn.kind, self.driver.features(handle))?;

        log::trace!(
            "handle {}: {} reg={:?} write={:02X?} read_len={}",
            handle,
            txn.kind,
            txn.register,
            txn.write_data,
            txn.read_buf.len()
        );

        let count = self.driver.transact(handle, txn)?;
        Ok(count.min(txn.read_buf.len()))
    }

    /// Run a fixed-size read; a short answer is a read failure
    fn transact_exact(&mut self, handle: Handle, mut txn: Transaction<'_>) -> Result<()> {
        let expected = txn.read_buf.len();
        let count = self.transact(handle, &mut txn)?;
        if count < expected {
            log::debug!("{}: expected {} bytes, got {}", txn.kind, expected, count);
            return Err(Error::ReadFailed);
        }
        Ok(())
    }

    // =========================================================================
    // Canonical primitives: single values
    // =========================================================================

    /// Send a single bit in the R/W position
    pub fn write_quick(&mut self, handle: Handle, bit: bool) -> Result<()> {
        self.transact(handle, &mut Transaction::quick(bit))?;
        Ok(())
    }

    /// Send one byte without a register
    pub fn write_byte(&mut self, handle: Handle, value: u8) -> Result<()> {
        let data = [value];
        self.transact(handle, &mut Transaction::write_byte(&data))?;
        Ok(())
    }

    /// Receive one byte without a register
    pub fn read_byte(&mut self, handle: Handle) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.transact_exact(handle, Transaction::read_byte(&mut buf))?;
        Ok(buf[0])
    }

    /// Write one byte to a register
    pub fn write_byte_data(&mut self, handle: Handle, register: u8, value: u8) -> Result<()> {
        let data = [value];
        self.transact(handle, &mut Transaction::write_byte_data(register, &data))?;
        Ok(())
    }

    /// Read one byte from a register
    pub fn read_byte_data(&mut self, handle: Handle, register: u8) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.transact_exact(handle, Transaction::read_byte_data(register, &mut buf))?;
        Ok(buf[0])
    }

    /// Write a 16-bit word (little-endian on the wire) to a register
    pub fn write_word_data(&mut self, handle: Handle, register: u8, value: u16) -> Result<()> {
        let data = value.to_le_bytes();
        self.transact(handle, &mut Transaction::write_word_data(register, &data))?;
        Ok(())
    }

    /// Read a 16-bit word (little-endian on the wire) from a register
    pub fn read_word_data(&mut self, handle: Handle, register: u8) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.transact_exact(handle, Transaction::read_word_data(register, &mut buf))?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Write a word to a register and read a word back in one transaction
    pub fn process_call(&mut self, handle: Handle, register: u8, value: u16) -> Result<u16> {
        let data = value.to_le_bytes();
        let mut buf = [0u8; 2];
        self.transact_exact(handle, Transaction::process_call(register, &data, &mut buf))?;
        Ok(u16::from_le_bytes(buf))
    }

    // =========================================================================
    // Canonical primitives: buffers
    // =========================================================================

    /// Write a block of up to 32 bytes to a register
    ///
    /// Sends `data[offset..offset + length]`, with `length` clamped to the
    /// storage and then to 32 bytes. A zero-length block is allowed.
    pub fn write_block_data(
        &mut self,
        handle: Handle,
        register: u8,
        data: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<()> {
        self.sessions.get(handle)?;
        let span = resolve_explicit(data.len(), offset, length)?;
        self.write_block_span(handle, register, data, span)?;
        Ok(())
    }

    /// Read a block from a register into `buf[offset..]`
    ///
    /// The device decides how many bytes it sends; at most
    /// `min(length, buf.len() - offset, 32)` are accepted. Returns the
    /// number of bytes copied into `buf`.
    pub fn read_block_data(
        &mut self,
        handle: Handle,
        register: u8,
        buf: &mut [u8],
        offset: usize,
        length: usize,
    ) -> Result<usize> {
        self.sessions.get(handle)?;
        let span = resolve_explicit(buf.len(), offset, length)?;
        self.read_block_span(handle, TransactionKind::ReadBlockData, register, &[], buf, span)
    }

    /// Write a block and read the device's reply in one transaction
    ///
    /// Sends `write[write_offset..write_offset + write_length]` (1 to 31
    /// bytes after clamping) and copies the reply into `read[read_offset..]`.
    /// Write and reply together never exceed 32 bytes, so the reply is
    /// limited to `32 - written`. Returns the number of reply bytes.
    #[allow(clippy::too_many_arguments)]
    pub fn block_process_call(
        &mut self,
        handle: Handle,
        register: u8,
        write: &[u8],
        write_offset: usize,
        write_length: usize,
        read: &mut [u8],
        read_offset: usize,
    ) -> Result<usize> {
        self.sessions.get(handle)?;

        let write_span = clamp_transfer(
            resolve_explicit(write.len(), write_offset, write_length)?,
            BLOCK_PROC_CALL_WRITE_MAX,
        );
        if write_span.is_empty() {
            return Err(Error::BadParam);
        }

        let reply_max = BLOCK_MAX - write_span.len;
        let read_span = resolve_explicit(read.len(), read_offset, reply_max)?;
        self.read_block_span(
            handle,
            TransactionKind::BlockProcessCall,
            register,
            write_span.slice(write),
            read,
            read_span,
        )
    }

    /// Block process call whose reply overwrites its own request
    ///
    /// Sends `data[offset..offset + length]` and copies the reply back
    /// starting at `offset`. Bytes past the reply length keep their
    /// request values. The reply is only copied once the whole transaction
    /// has completed.
    pub fn block_process_call_in_place(
        &mut self,
        handle: Handle,
        register: u8,
        data: &mut [u8],
        offset: usize,
        length: usize,
    ) -> Result<usize> {
        self.sessions.get(handle)?;
        let span = clamp_transfer(
            resolve_explicit(data.len(), offset, length)?,
            BLOCK_PROC_CALL_WRITE_MAX,
        );
        let request: heapless::Vec<u8, BLOCK_MAX> =
            heapless::Vec::from_slice(span.slice(data)).map_err(|_| Error::BadParam)?;

        self.block_process_call(handle, register, &request, 0, request.len(), data, offset)
    }

    /// Write a raw block of 1 to 32 bytes to a register
    pub fn write_i2c_block_data(
        &mut self,
        handle: Handle,
        register: u8,
        data: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<()> {
        self.sessions.get(handle)?;
        let span = resolve_explicit(data.len(), offset, length)?;
        self.write_i2c_block_span(handle, register, data, span)?;
        Ok(())
    }

    /// Read a raw block of 1 to 32 bytes from a register into `buf[offset..]`
    ///
    /// Returns the number of bytes copied into `buf`.
    pub fn read_i2c_block_data(
        &mut self,
        handle: Handle,
        register: u8,
        buf: &mut [u8],
        offset: usize,
        length: usize,
    ) -> Result<usize> {
        self.sessions.get(handle)?;
        let span = resolve_explicit(buf.len(), offset, length)?;
        self.read_block_span(handle, TransactionKind::ReadI2cBlockData, register, &[], buf, span)
    }

    /// Plain I2C write of `data[offset..offset + length]`
    pub fn write_device(
        &mut self,
        handle: Handle,
        data: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<()> {
        self.sessions.get(handle)?;
        let span = resolve_explicit(data.len(), offset, length)?;
        self.write_device_span(handle, data, span)?;
        Ok(())
    }

    /// Plain I2C read into `buf[offset..offset + length]`
    ///
    /// Returns the number of bytes copied into `buf`.
    pub fn read_device(
        &mut self,
        handle: Handle,
        buf: &mut [u8],
        offset: usize,
        length: usize,
    ) -> Result<usize> {
        self.sessions.get(handle)?;
        let span = resolve_explicit(buf.len(), offset, length)?;
        self.read_device_span(handle, buf, span)
    }

    // =========================================================================
    // Resolution-driven conveniences
    // =========================================================================

    /// Write any [`WriteRequest`] shape to a buffer target
    ///
    /// Returns the number of bytes sent after clamping.
    pub fn write(
        &mut self,
        handle: Handle,
        target: BufferTarget,
        request: WriteRequest<'_>,
    ) -> Result<usize> {
        self.sessions.get(handle)?;
        let payload = request.encode();
        let span = request.span(payload.len())?;
        self.write_span(handle, target, &payload, span)
    }

    /// Read into the whole of `buf`
    ///
    /// Returns the number of bytes copied into `buf`.
    pub fn read_into(
        &mut self,
        handle: Handle,
        target: BufferTarget,
        buf: &mut [u8],
    ) -> Result<usize> {
        let span = Span::new(0, buf.len());
        self.read_span(handle, target, buf, span)
    }

    /// Write from a cursor buffer
    ///
    /// Sends from the cursor position up to `length` bytes or the limit,
    /// whichever comes first; an exhausted cursor is flipped first. The
    /// cursor is not advanced. If the transaction fails the cursor is left
    /// exactly as it was passed in.
    ///
    /// Returns the number of bytes sent.
    pub fn write_cursor<B: AsRef<[u8]>>(
        &mut self,
        handle: Handle,
        target: BufferTarget,
        cursor: &mut ByteCursor<B>,
        length: Option<usize>,
    ) -> Result<usize> {
        self.sessions.get(handle)?;
        let saved = cursor.state();
        let span = resolve_cursor_write(cursor, length);

        let result = self.write_span(handle, target, cursor.get_ref().as_ref(), span);
        if result.is_err() {
            cursor.restore(saved);
        }
        result
    }

    /// Read into a cursor buffer
    ///
    /// Fills from the cursor position up to `length` bytes or the limit,
    /// whichever comes first; an exhausted cursor is rewound first. On
    /// success the position moves past the bytes the device returned. If
    /// the transaction fails the cursor is left exactly as it was passed in.
    ///
    /// Returns the number of bytes copied into the cursor's storage.
    pub fn read_cursor<B: AsRef<[u8]> + AsMut<[u8]>>(
        &mut self,
        handle: Handle,
        target: BufferTarget,
        cursor: &mut ByteCursor<B>,
        length: Option<usize>,
    ) -> Result<usize> {
        self.sessions.get(handle)?;
        let saved = cursor.state();
        let span = resolve_cursor_read(cursor, length);

        match self.read_span(handle, target, cursor.get_mut(), span) {
            Ok(count) => {
                cursor.advance(count);
                Ok(count)
            }
            Err(e) => {
                cursor.restore(saved);
                Err(e)
            }
        }
    }

    // =========================================================================
    // Span-level helpers shared by primitives and conveniences
    // =========================================================================

    fn write_span(
        &mut self,
        handle: Handle,
        target: BufferTarget,
        data: &[u8],
        span: Span,
    ) -> Result<usize> {
        match target {
            BufferTarget::BlockData { register } => {
                self.write_block_span(handle, register, data, span)
            }
            BufferTarget::I2cBlock { register } => {
                self.write_i2c_block_span(handle, register, data, span)
            }
            BufferTarget::Device => self.write_device_span(handle, data, span),
        }
    }

    fn read_span(
        &mut self,
        handle: Handle,
        target: BufferTarget,
        buf: &mut [u8],
        span: Span,
    ) -> Result<usize> {
        match target {
            BufferTarget::BlockData { register } => {
                let kind = TransactionKind::ReadBlockData;
                self.read_block_span(handle, kind, register, &[], buf, span)
            }
            BufferTarget::I2cBlock { register } => {
                let kind = TransactionKind::ReadI2cBlockData;
                self.read_block_span(handle, kind, register, &[], buf, span)
            }
            BufferTarget::Device => self.read_device_span(handle, buf, span),
        }
    }

    fn write_block_span(
        &mut self,
        handle: Handle,
        register: u8,
        data: &[u8],
        span: Span,
    ) -> Result<usize> {
        let span = clamp_transfer(span, BLOCK_MAX);
        let mut txn = Transaction::write_block_data(register, span.slice(data));
        self.transact(handle, &mut txn)?;
        Ok(span.len)
    }

    fn write_i2c_block_span(
        &mut self,
        handle: Handle,
        register: u8,
        data: &[u8],
        span: Span,
    ) -> Result<usize> {
        self.sessions.get(handle)?;
        let span = clamp_transfer(span, BLOCK_MAX);
        if span.is_empty() {
            return Err(Error::BadParam);
        }
        let mut txn = Transaction::write_i2c_block_data(register, span.slice(data));
        self.transact(handle, &mut txn)?;
        Ok(span.len)
    }

    fn write_device_span(&mut self, handle: Handle, data: &[u8], span: Span) -> Result<usize> {
        self.sessions.get(handle)?;
        if span.is_empty() {
            return Err(Error::BadParam);
        }
        let mut txn = Transaction::write_device(span.slice(data));
        self.transact(handle, &mut txn)?;
        Ok(span.len)
    }

    /// Read at most 32 bytes through a scratch buffer into `buf[span]`
    fn read_block_span(
        &mut self,
        handle: Handle,
        kind: TransactionKind,
        register: u8,
        write: &[u8],
        buf: &mut [u8],
        span: Span,
    ) -> Result<usize> {
        self.sessions.get(handle)?;
        let span = clamp_transfer(span, BLOCK_MAX);
        if span.is_empty() {
            return Err(Error::BadParam);
        }

        let mut scratch = [0u8; BLOCK_MAX];
        let mut txn = Transaction {
            kind,
            register: Some(register),
            write_data: write,
            read_buf: &mut scratch[..span.len],
        };
        let count = self.transact(handle, &mut txn)?;

        buf[span.offset..span.offset + count].copy_from_slice(&scratch[..count]);
        Ok(count)
    }

    fn read_device_span(&mut self, handle: Handle, buf: &mut [u8], span: Span) -> Result<usize> {
        self.sessions.get(handle)?;
        if span.is_empty() {
            return Err(Error::BadParam);
        }

        let mut scratch = vec![0u8; span.len];
        let count = self.transact(handle, &mut Transaction::read_device(&mut scratch))?;

        buf[span.offset..span.offset + count].copy_from_slice(&scratch[..count]);
        Ok(count)
    }
}

/// Apply a protocol size ceiling, noting when a request is cut short
fn clamp_transfer(span: Span, max: usize) -> Span {
    if span.len > max {
        log::warn!("{} byte transfer exceeds the {} byte limit, truncating", span.len, max);
    }
    span.clamp(max)
}
