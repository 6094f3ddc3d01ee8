//! SMBus types and transaction structures
//!
//! This module provides the transaction kinds understood by the bus
//! drivers, the request structure handed to them, and the protocol limits.

mod kind;
mod transaction;

pub use kind::{check_feature_supported, TransactionKind};
pub use transaction::Transaction;

/// Maximum payload of a single SMBus block transaction
pub const BLOCK_MAX: usize = 32;

/// Highest valid 7-bit device address
pub const MAX_DEVICE_ADDR: u8 = 0x7F;
