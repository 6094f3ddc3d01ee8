//! rsmbus-core - Core library for SMBus/I2C device access
//!
//! This crate sits between application code and a native bus driver. It
//! validates handles, normalizes the many ways a caller can describe a
//! transfer (whole slices, explicit offset/length, cursor buffers, encoded
//! text) down to one canonical primitive per transaction kind, enforces the
//! SMBus size limits, and reports failures through a single error type.
//!
//! It is `no_std` compatible but requires `alloc`.
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` for [`Error`]
//!
//! # Example
//!
//! ```ignore
//! use rsmbus_core::{BusDriver, Smbus};
//!
//! fn poke<D: BusDriver>(driver: D) -> rsmbus_core::Result<u8> {
//!     let mut bus = Smbus::new(driver);
//!     let handle = bus.open_default(1, 0x48)?;
//!     bus.write_byte_data(handle, 0x00, 0x80)?;
//!     let value = bus.read_byte_data(handle, 0x00)?;
//!     bus.close(handle)?;
//!     Ok(value)
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod buffer;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod session;
pub mod smbus;

pub use buffer::{BufferTarget, ByteCursor, Charset, Span, WriteRequest};
pub use dispatch::Smbus;
pub use driver::{BusDriver, SmbusFeatures};
pub use error::{Error, Result};
pub use session::Handle;
pub use smbus::{Transaction, TransactionKind};
