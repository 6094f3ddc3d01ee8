//! CLI command implementations
//!
//! Every transfer command opens one handle on the selected bus and device,
//! performs exactly one transaction through the dispatcher, and closes the
//! handle again, also when the transaction fails.

mod list;
mod transfer;

pub use list::list_drivers;
pub use transfer::{run, Output};

use thiserror::Error;

/// Errors reported by the transfer commands
#[derive(Debug, Error)]
pub enum CommandError {
    /// The bus rejected the request
    #[error("{} (status {})", .0, .0.code())]
    Smbus(#[from] rsmbus_core::Error),

    /// The payload given on the command line is invalid
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
