//! TOML device image parsing
//!
//! Preloads emulated devices from a file:
//!
//! ```toml
//! buses = [0, 1]
//!
//! [[device]]
//! bus = 1
//! address = "0x48"
//!
//! [[device.register]]
//! addr = 0x00
//! value = 0x80
//!
//! [[device.block]]
//! register = 0x10
//! data = [0xDE, 0xAD, 0xBE, 0xEF]
//! ```
//!
//! Numeric fields accept integers or `"0x.."` strings.

use std::fs;
use std::path::Path;

use thiserror::Error;

/// Errors loading a device image
#[derive(Debug, Error)]
pub enum ImageError {
    /// Failed to read the image file
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid image
    #[error("Invalid device image: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value does not fit its field
    #[error("Invalid value in device image: {0}")]
    InvalidValue(String),
}

/// Parsed device image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceImage {
    /// Buses the emulated platform exposes (empty keeps the default)
    pub buses: Vec<u32>,
    /// Devices to preload
    pub devices: Vec<DeviceContents>,
}

/// Initial contents of one emulated device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceContents {
    /// Bus number
    pub bus: u32,
    /// 7-bit device address
    pub address: u8,
    /// `(register, value)` pairs
    pub registers: Vec<(u8, u8)>,
    /// `(register, block)` pairs served to block reads
    pub blocks: Vec<(u8, Vec<u8>)>,
}

#[derive(Debug, serde::Deserialize)]
struct TomlImage {
    #[serde(default)]
    buses: Vec<u32>,
    #[serde(default)]
    device: Vec<TomlDevice>,
}

#[derive(Debug, serde::Deserialize)]
struct TomlDevice {
    #[serde(deserialize_with = "deserialize_hex_u32")]
    bus: u32,
    #[serde(deserialize_with = "deserialize_hex_u32")]
    address: u32,
    #[serde(default)]
    register: Vec<TomlRegister>,
    #[serde(default)]
    block: Vec<TomlBlock>,
}

#[derive(Debug, serde::Deserialize)]
struct TomlRegister {
    #[serde(deserialize_with = "deserialize_hex_u32")]
    addr: u32,
    #[serde(deserialize_with = "deserialize_hex_u32")]
    value: u32,
}

#[derive(Debug, serde::Deserialize)]
struct TomlBlock {
    #[serde(deserialize_with = "deserialize_hex_u32")]
    register: u32,
    data: Vec<u8>,
}

/// Deserialize a u32 that can be hex (0x...) or decimal
fn deserialize_hex_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HexOrInt {
        Int(u32),
        Str(String),
    }

    match HexOrInt::deserialize(deserializer)? {
        HexOrInt::Int(n) => Ok(n),
        HexOrInt::Str(s) => parse_number(&s).map_err(serde::de::Error::custom),
    }
}

/// Parse a number that can be hex (0x...) or decimal
pub fn parse_number(s: &str) -> Result<u32, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("invalid hex: {}", e))
    } else {
        s.parse().map_err(|e| format!("invalid number: {}", e))
    }
}

fn to_u8(value: u32, what: &str) -> Result<u8, ImageError> {
    u8::try_from(value).map_err(|_| ImageError::InvalidValue(format!("{} 0x{:X}", what, value)))
}

impl DeviceImage {
    /// Load an image from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ImageError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse an image from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ImageError> {
        let file: TomlImage = toml::from_str(content)?;

        let mut devices = Vec::with_capacity(file.device.len());
        for dev in file.device {
            let address = to_u8(dev.address, "address")?;
            if address > rsmbus_core::smbus::MAX_DEVICE_ADDR {
                return Err(ImageError::InvalidValue(format!("address 0x{:X}", address)));
            }

            let mut registers = Vec::with_capacity(dev.register.len());
            for reg in dev.register {
                registers.push((to_u8(reg.addr, "register")?, to_u8(reg.value, "value")?));
            }

            let mut blocks = Vec::with_capacity(dev.block.len());
            for block in dev.block {
                if block.data.len() > rsmbus_core::smbus::BLOCK_MAX {
                    return Err(ImageError::InvalidValue(format!(
                        "block at register 0x{:02X} is {} bytes",
                        block.register,
                        block.data.len()
                    )));
                }
                blocks.push((to_u8(block.register, "register")?, block.data));
            }

            devices.push(DeviceContents {
                bus: dev.bus,
                address,
                registers,
                blocks,
            });
        }

        Ok(Self {
            buses: file.buses,
            devices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("72").unwrap(), 72);
        assert_eq!(parse_number("0x48").unwrap(), 0x48);
        assert!(parse_number("0xZZ").is_err());
    }

    #[test]
    fn test_parse_image() {
        let toml = r#"
buses = [0, 1, 3]

[[device]]
bus = 1
address = "0x48"

[[device.register]]
addr = 0x00
value = "0x80"

[[device.register]]
addr = 1
value = 2

[[device.block]]
register = 0x10
data = [0xDE, 0xAD, 0xBE, 0xEF]
"#;
        let image = DeviceImage::from_toml_str(toml).unwrap();
        assert_eq!(image.buses, vec![0, 1, 3]);
        assert_eq!(image.devices.len(), 1);

        let dev = &image.devices[0];
        assert_eq!(dev.bus, 1);
        assert_eq!(dev.address, 0x48);
        assert_eq!(dev.registers, vec![(0x00, 0x80), (0x01, 0x02)]);
        assert_eq!(dev.blocks, vec![(0x10, vec![0xDE, 0xAD, 0xBE, 0xEF])]);
    }

    #[test]
    fn test_reject_bad_values() {
        let toml = r#"
[[device]]
bus = 1
address = 0x80
"#;
        assert!(matches!(
            DeviceImage::from_toml_str(toml),
            Err(ImageError::InvalidValue(_))
        ));

        let toml = r#"
[[device]]
bus = 1
address = 0x20

[[device.register]]
addr = 0x100
value = 0
"#;
        assert!(matches!(
            DeviceImage::from_toml_str(toml),
            Err(ImageError::InvalidValue(_))
        ));
    }
}
