//! Bus driver traits and abstractions
//!
//! This module defines the trait a native bus driver implements so the
//! dispatcher can hand it canonical transactions.

mod traits;

pub use traits::*;
