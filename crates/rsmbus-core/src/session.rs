//! Handle Gateway: the session table
//!
//! Every transaction names its device by a [`Handle`]. The table hands out
//! the lowest free slot on open and frees it on close; a closed handle is
//! rejected with `Error::BadHandle` until the slot is handed out again.

use alloc::vec::Vec;
use core::fmt;

use crate::error::{Error, Result};
use crate::smbus::MAX_DEVICE_ADDR;

/// Default number of concurrently open sessions
pub const DEFAULT_MAX_SESSIONS: usize = 64;

/// Opaque identifier for an open device session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u32);

impl Handle {
    /// Build a handle from its raw number
    ///
    /// Any number is accepted; the session table decides whether it is open.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw handle number (always >= 0)
    pub const fn raw(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bus/device pairing bound to an open handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    /// Bus number
    pub bus: u32,
    /// 7-bit device address
    pub address: u8,
}

/// Fixed-capacity table of open sessions
#[derive(Debug)]
pub struct SessionTable {
    slots: Vec<Option<Session>>,
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionTable {
    /// Create a table with room for `capacity` open sessions
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize(capacity, None);
        Self { slots }
    }

    /// Maximum number of open sessions
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of currently open sessions
    pub fn open_count(&self) -> usize {
        self.iter().count()
    }

    /// Validate open arguments and reserve a slot
    ///
    /// Bus existence is checked by the caller, which knows the driver.
    pub fn allocate(&mut self, bus: u32, address: u8, flags: u32) -> Result<Handle> {
        if address > MAX_DEVICE_ADDR {
            return Err(Error::BadAddr);
        }
        // No open flags are defined yet
        if flags != 0 {
            return Err(Error::BadFlags);
        }

        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(Error::NoHandle)?;
        self.slots[index] = Some(Session { bus, address });

        Ok(Handle(index as u32))
    }

    /// Look up an open session
    pub fn get(&self, handle: Handle) -> Result<Session> {
        self.slots
            .get(handle.index())
            .copied()
            .flatten()
            .ok_or(Error::BadHandle)
    }

    /// Free a slot; fails if it is not open
    pub fn release(&mut self, handle: Handle) -> Result<Session> {
        self.slots
            .get_mut(handle.index())
            .and_then(Option::take)
            .ok_or(Error::BadHandle)
    }

    /// Iterate over open handles and their sessions
    pub fn iter(&self) -> impl Iterator<Item = (Handle, Session)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (Handle(i as u32), s)))
    }
}
