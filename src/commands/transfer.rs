//! Transfer commands: one transaction per invocation

use std::fmt;

use rsmbus_core::smbus::BLOCK_MAX;
use rsmbus_core::{BufferTarget, BusDriver, Handle, Smbus, WriteRequest};

use super::CommandError;
use crate::cli::{parse_hex_bytes, Commands, DataArgs};

/// Result of a transfer command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Write completed, nothing to show
    Done,
    /// A single byte
    Byte(u8),
    /// A 16-bit word
    Word(u16),
    /// A block of bytes
    Bytes(Vec<u8>),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Done => Ok(()),
            Output::Byte(b) => write!(f, "0x{:02X}", b),
            Output::Word(w) => write!(f, "0x{:04X}", w),
            Output::Bytes(bytes) if bytes.is_empty() => write!(f, "(no data)"),
            Output::Bytes(bytes) => {
                let hex: Vec<String> = bytes.iter().map(|b| format!("0x{:02X}", b)).collect();
                write!(f, "{}", hex.join(" "))
            }
        }
    }
}

/// Run one transfer command against `address` on `bus`
///
/// The handle is closed before returning, whether or not the transfer
/// succeeded.
pub fn run<D: BusDriver>(
    smbus: &mut Smbus<D>,
    bus: u32,
    address: u8,
    command: &Commands,
) -> Result<Output, CommandError> {
    let handle = smbus.open_default(bus, address)?;
    log::debug!("Using handle {} for bus {} addr 0x{:02X}", handle, bus, address);

    let result = execute(smbus, handle, command);

    if let Err(e) = smbus.close(handle) {
        log::warn!("Failed to close handle {}: {}", handle, e);
    }
    result
}

/// Build the write request described by the payload options and hand it to `f`
fn with_request<T>(
    data: &DataArgs,
    f: impl FnOnce(WriteRequest<'_>) -> Result<T, CommandError>,
) -> Result<T, CommandError> {
    let bytes;
    let mut request = match &data.text {
        Some(text) => WriteRequest::text(text).with_charset(data.charset),
        None => {
            bytes = parse_hex_bytes(&data.bytes).map_err(CommandError::InvalidData)?;
            WriteRequest::bytes(&bytes)
        }
    };

    request = request.with_offset(data.offset);
    if let Some(length) = data.length {
        request = request.with_length(length);
    }
    f(request)
}

fn execute<D: BusDriver>(
    smbus: &mut Smbus<D>,
    handle: Handle,
    command: &Commands,
) -> Result<Output, CommandError> {
    match command {
        Commands::Quick { read } => {
            smbus.write_quick(handle, *read)?;
            Ok(Output::Done)
        }
        Commands::ReadByte => Ok(Output::Byte(smbus.read_byte(handle)?)),
        Commands::WriteByte { value } => {
            smbus.write_byte(handle, *value)?;
            Ok(Output::Done)
        }
        Commands::ReadReg { register } => Ok(Output::Byte(smbus.read_byte_data(handle, *register)?)),
        Commands::WriteReg { register, value } => {
            smbus.write_byte_data(handle, *register, *value)?;
            Ok(Output::Done)
        }
        Commands::ReadWord { register } => Ok(Output::Word(smbus.read_word_data(handle, *register)?)),
        Commands::WriteWord { register, value } => {
            smbus.write_word_data(handle, *register, *value)?;
            Ok(Output::Done)
        }
        Commands::ProcessCall { register, value } => Ok(Output::Word(smbus.process_call(
            handle, *register, *value,
        )?)),
        Commands::ReadBlock { register } => {
            let mut buf = [0u8; BLOCK_MAX];
            let target = BufferTarget::BlockData {
                register: *register,
            };
            let count = smbus.read_into(handle, target, &mut buf)?;
            Ok(Output::Bytes(buf[..count].to_vec()))
        }
        Commands::WriteBlock { register, data } => with_request(data, |request| {
            let target = BufferTarget::BlockData {
                register: *register,
            };
            let sent = smbus.write(handle, target, request)?;
            log::info!("Wrote {} byte block to register 0x{:02X}", sent, register);
            Ok(Output::Done)
        }),
        Commands::BlockProcessCall { register, data } => with_request(data, |request| {
            let mut buf = request.encode().into_owned();
            let span = request.span(buf.len())?;
            let count = smbus.block_process_call_in_place(
                handle,
                *register,
                &mut buf,
                span.offset,
                span.len,
            )?;
            Ok(Output::Bytes(buf[span.offset..span.offset + count].to_vec()))
        }),
        Commands::ReadI2cBlock { register, length } => {
            let mut buf = vec![0u8; *length];
            let count = smbus.read_i2c_block_data(handle, *register, &mut buf, 0, *length)?;
            Ok(Output::Bytes(buf[..count].to_vec()))
        }
        Commands::WriteI2cBlock { register, data } => with_request(data, |request| {
            let target = BufferTarget::I2cBlock {
                register: *register,
            };
            let sent = smbus.write(handle, target, request)?;
            log::info!("Wrote {} bytes to register 0x{:02X}", sent, register);
            Ok(Output::Done)
        }),
        Commands::ReadDevice { length } => {
            let mut buf = vec![0u8; *length];
            let count = smbus.read_device(handle, &mut buf, 0, *length)?;
            Ok(Output::Bytes(buf[..count].to_vec()))
        }
        Commands::WriteDevice { data } => with_request(data, |request| {
            let sent = smbus.write(handle, BufferTarget::Device, request)?;
            log::info!("Wrote {} bytes", sent);
            Ok(Output::Done)
        }),
        // Handled before a driver is opened
        Commands::ListDrivers => Ok(Output::Done),
    }
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use rsmbus_core::{Charset, Error};
    use rsmbus_dummy::DummyBus;

    fn bytes(items: &[&str]) -> DataArgs {
        DataArgs {
            bytes: items.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_register_round_trip() {
        let mut smbus = Smbus::new(DummyBus::new());
        let write = Commands::WriteReg {
            register: 0x00,
            value: 0x80,
        };
        assert_eq!(run(&mut smbus, 1, 0x48, &write).unwrap(), Output::Done);

        let read = Commands::ReadReg { register: 0x00 };
        assert_eq!(run(&mut smbus, 1, 0x48, &read).unwrap(), Output::Byte(0x80));
        assert_eq!(smbus.open_count(), 0);
    }

    #[test]
    fn test_block_commands() {
        let mut smbus = Smbus::new(DummyBus::new());
        let write = Commands::WriteBlock {
            register: 0x10,
            data: DataArgs {
                text: Some("abc".to_string()),
                charset: Charset::Ascii,
                ..Default::default()
            },
        };
        run(&mut smbus, 1, 0x48, &write).unwrap();

        let read = Commands::ReadBlock { register: 0x10 };
        assert_eq!(
            run(&mut smbus, 1, 0x48, &read).unwrap(),
            Output::Bytes(b"abc".to_vec())
        );
    }

    #[test]
    fn test_block_process_call_echo() {
        let mut smbus = Smbus::new(DummyBus::new());
        let call = Commands::BlockProcessCall {
            register: 0x20,
            data: bytes(&["1", "2", "3"]),
        };
        assert_eq!(
            run(&mut smbus, 1, 0x48, &call).unwrap(),
            Output::Bytes(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_payload_range() {
        let mut smbus = Smbus::new(DummyBus::new());
        let mut data = bytes(&["0x00", "0x11", "0x22", "0x33"]);
        data.offset = 1;
        data.length = Some(2);
        let write = Commands::WriteI2cBlock {
            register: 0x30,
            data,
        };
        run(&mut smbus, 1, 0x48, &write).unwrap();

        let sent = &smbus.driver().last().unwrap().write_data;
        assert_eq!(sent, &vec![0x11, 0x22]);
    }

    #[test]
    fn test_errors_close_handle() {
        let mut smbus = Smbus::new(DummyBus::new());

        let read = Commands::ReadByte;
        assert!(matches!(
            run(&mut smbus, 9, 0x48, &read),
            Err(CommandError::Smbus(Error::BadBus))
        ));

        let write = Commands::WriteDevice {
            data: bytes(&["0xZZ"]),
        };
        assert!(matches!(
            run(&mut smbus, 1, 0x48, &write),
            Err(CommandError::InvalidData(_))
        ));
        assert_eq!(smbus.open_count(), 0);
    }

    #[test]
    fn test_output_format() {
        assert_eq!(Output::Byte(0x0A).to_string(), "0x0A");
        assert_eq!(Output::Word(0xBEEF).to_string(), "0xBEEF");
        assert_eq!(Output::Bytes(vec![1, 0xFF]).to_string(), "0x01 0xFF");
        assert_eq!(Output::Bytes(vec![]).to_string(), "(no data)");
    }
}
