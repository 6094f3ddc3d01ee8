//! rsmbus-linux-i2c - Linux i2c-dev support
//!
//! This crate provides SMBus/I2C access on Linux through the `/dev/i2c-N`
//! character devices.
//!
//! # Overview
//!
//! Every open handle gets its own file descriptor bound to the device
//! address with the `I2C_SLAVE` ioctl. SMBus transactions use the
//! `I2C_SMBUS` ioctl and plain device transfers use `read(2)`/`write(2)`.
//! The adapter's `I2C_FUNCS` mask is reported as the handle's feature set.
//!
//! # Example
//!
//! ```no_run
//! use rsmbus_core::Smbus;
//! use rsmbus_linux_i2c::{LinuxI2c, LinuxI2cConfig};
//!
//! let mut bus = Smbus::new(LinuxI2c::new(LinuxI2cConfig::new()));
//! let handle = bus.open_default(1, 0x48)?;
//! let temp = bus.read_word_data(handle, 0x00)?;
//! println!("raw temperature: 0x{:04X}", temp);
//! bus.close(handle)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with rsmbus CLI
//!
//! ```bash
//! # Read a register on /dev/i2c-1
//! rsmbus -d linux_i2c -b 1 -a 0x48 read-reg 0x00
//!
//! # Device nodes in another directory
//! rsmbus -d linux_i2c:dev_dir=/run/i2c -b 0 -a 0x50 read-device 16
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with `CONFIG_I2C_CHARDEV` (the `i2c-dev` module loaded)
//! - Read/write access to `/dev/i2c-N`, usually via the `i2c` group

pub mod device;
pub mod error;

// Re-exports
pub use device::{parse_options, LinuxI2c, LinuxI2cConfig};
pub use error::{LinuxI2cError, Result};

/// Create a Linux I2C driver and return it boxed
///
/// This is a convenience function for use in the CLI driver dispatch.
///
/// # Options
///
/// - `dev_dir=/dev` - Optional: directory holding the `i2c-N` nodes
pub fn open_linux_i2c(
    options: &[(&str, &str)],
) -> std::result::Result<Box<dyn rsmbus_core::BusDriver + Send>, Box<dyn std::error::Error>> {
    let config = parse_options(options)?;
    Ok(Box::new(LinuxI2c::new(config)))
}
