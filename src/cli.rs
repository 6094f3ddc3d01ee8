//! CLI argument parsing

use crate::drivers;
use clap::{Parser, Subcommand};
use rsmbus_core::Charset;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a hex or decimal byte
pub fn parse_u8(s: &str) -> Result<u8, String> {
    let value = parse_hex_u32(s)?;
    u8::try_from(value).map_err(|_| format!("Value out of range for a byte: {}", s))
}

/// Parse a hex or decimal 16-bit word
pub fn parse_u16(s: &str) -> Result<u16, String> {
    let value = parse_hex_u32(s)?;
    u16::try_from(value).map_err(|_| format!("Value out of range for a word: {}", s))
}

/// Parse a 7-bit device address
fn parse_address(s: &str) -> Result<u8, String> {
    let value = parse_u8(s)?;
    if value > rsmbus_core::smbus::MAX_DEVICE_ADDR {
        return Err(format!("Address {} is not a 7-bit address", s));
    }
    Ok(value)
}

/// Parse a list of hex or decimal bytes
pub fn parse_hex_bytes(items: &[String]) -> Result<Vec<u8>, String> {
    items.iter().map(|s| parse_u8(s)).collect()
}

/// Generate dynamic help text for the driver argument
fn driver_help() -> String {
    format!(
        "Bus driver to use [available: {}]",
        drivers::driver_names_short()
    )
}

#[derive(Parser)]
#[command(name = "rsmbus")]
#[command(author, version, about = "SMBus/I2C device access", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Bus driver, optionally with options (e.g. "linux_i2c:dev_dir=/dev")
    #[arg(short, long, global = true, default_value = "dummy", help = driver_help())]
    pub driver: String,

    /// Bus number
    #[arg(short, long, global = true, default_value = "1", value_parser = parse_hex_u32)]
    pub bus: u32,

    /// 7-bit device address (hex or decimal)
    #[arg(short, long, global = true, default_value = "0x48", value_parser = parse_address)]
    pub address: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Outgoing payload shared by the write commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DataArgs {
    /// Bytes to send (hex or decimal, e.g. 0x12 0x34)
    #[arg(required_unless_present = "text")]
    pub bytes: Vec<String>,

    /// Send a string instead of bytes
    #[arg(long, conflicts_with = "bytes")]
    pub text: Option<String>,

    /// Encoding for --text (ascii, latin1, utf8)
    #[arg(long, default_value = "ascii")]
    pub charset: Charset,

    /// Skip this many payload bytes
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Send at most this many payload bytes
    #[arg(long)]
    pub length: Option<usize>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Send a quick command
    Quick {
        /// Send a 1 in the R/W position instead of 0
        #[arg(long)]
        read: bool,
    },

    /// Receive one byte without a register
    ReadByte,

    /// Send one byte without a register
    WriteByte {
        /// Byte to send
        #[arg(value_parser = parse_u8)]
        value: u8,
    },

    /// Read one register
    ReadReg {
        /// Register (command code)
        #[arg(value_parser = parse_u8)]
        register: u8,
    },

    /// Write one register
    WriteReg {
        /// Register (command code)
        #[arg(value_parser = parse_u8)]
        register: u8,

        /// Byte to write
        #[arg(value_parser = parse_u8)]
        value: u8,
    },

    /// Read a 16-bit word from a register
    ReadWord {
        /// Register (command code)
        #[arg(value_parser = parse_u8)]
        register: u8,
    },

    /// Write a 16-bit word to a register
    WriteWord {
        /// Register (command code)
        #[arg(value_parser = parse_u8)]
        register: u8,

        /// Word to write
        #[arg(value_parser = parse_u16)]
        value: u16,
    },

    /// Write a word and read the reply word
    ProcessCall {
        /// Register (command code)
        #[arg(value_parser = parse_u8)]
        register: u8,

        /// Word to send
        #[arg(value_parser = parse_u16)]
        value: u16,
    },

    /// Read an SMBus block (length chosen by the device)
    ReadBlock {
        /// Register (command code)
        #[arg(value_parser = parse_u8)]
        register: u8,
    },

    /// Write an SMBus block (at most 32 bytes are sent)
    WriteBlock {
        /// Register (command code)
        #[arg(value_parser = parse_u8)]
        register: u8,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Write a block and read the reply block
    BlockProcessCall {
        /// Register (command code)
        #[arg(value_parser = parse_u8)]
        register: u8,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Read a raw I2C block from a register
    ReadI2cBlock {
        /// Register (command code)
        #[arg(value_parser = parse_u8)]
        register: u8,

        /// Bytes to read (1-32)
        #[arg(default_value_t = 32)]
        length: usize,
    },

    /// Write a raw I2C block to a register
    WriteI2cBlock {
        /// Register (command code)
        #[arg(value_parser = parse_u8)]
        register: u8,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Plain I2C read
    ReadDevice {
        /// Bytes to read
        length: usize,
    },

    /// Plain I2C write
    WriteDevice {
        #[command(flatten)]
        data: DataArgs,
    },

    /// List available bus drivers
    ListDrivers,
}
