//! Bus driver registration and dispatch
//!
//! This module provides a centralized registry for all bus drivers, with
//! support for feature-gated inclusion and dynamic help text generation.

use rsmbus_core::BusDriver;

/// Type alias for a boxed bus driver
pub type BoxedDriver = Box<dyn BusDriver + Send>;

/// Information about a bus driver
pub struct DriverInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available drivers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_drivers() -> Vec<DriverInfo> {
    let mut drivers = Vec::new();

    #[cfg(feature = "dummy")]
    drivers.push(DriverInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory SMBus device emulator (buses=0+1,image=<file.toml>)",
    });

    #[cfg(feature = "linux-i2c")]
    drivers.push(DriverInfo {
        name: "linux_i2c",
        aliases: &["linux-i2c", "i2cdev"],
        description: "Linux i2c-dev interface (dev_dir=/dev)",
    });

    drivers
}

/// Generate help text listing all available drivers
pub fn driver_help() -> String {
    let drivers = available_drivers();

    if drivers.is_empty() {
        return "No drivers available (recompile with driver features enabled)".to_string();
    }

    let mut help = String::from("Available drivers:\n");
    for d in &drivers {
        help.push_str(&format!("  {:12} - {}\n", d.name, d.description));
        if !d.aliases.is_empty() {
            help.push_str(&format!("  {:12}   aliases: {}\n", "", d.aliases.join(", ")));
        }
    }

    help
}

/// Generate a short list of driver names for CLI help
pub fn driver_names_short() -> String {
    let drivers = available_drivers();
    let names: Vec<&str> = drivers.iter().map(|d| d.name).collect();
    names.join(", ")
}

/// Parsed driver string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverParams {
    /// Driver name
    pub name: String,
    /// Options in the order given
    pub params: Vec<(String, String)>,
}

impl DriverParams {
    /// Borrow the options as the `(key, value)` pairs drivers parse
    pub fn options(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Parse a driver string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_driver_params(s: &str) -> Result<DriverParams, Box<dyn std::error::Error>> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = Vec::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.push((key.to_string(), value.to_string()));
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok(DriverParams {
        name: name.to_string(),
        params,
    })
}

/// Open a bus driver from a driver string
///
/// The string can be just the name (e.g., "dummy") or include options
/// (e.g., "linux_i2c:dev_dir=/dev").
pub fn open_driver(driver: &str) -> Result<BoxedDriver, Box<dyn std::error::Error>> {
    let params = parse_driver_params(driver)?;
    #[allow(unused_variables)]
    let options = params.options();

    match params.name.as_str() {
        #[cfg(feature = "dummy")]
        "dummy" => {
            log::debug!("Opening dummy bus...");
            rsmbus_dummy::open_dummy(&options)
                .map_err(|e| format!("Failed to open dummy bus: {}", e).into())
        }

        #[cfg(feature = "linux-i2c")]
        "linux_i2c" | "linux-i2c" | "i2cdev" => {
            log::debug!("Opening Linux I2C driver...");
            rsmbus_linux_i2c::open_linux_i2c(&options)
                .map_err(|e| format!("Invalid linux_i2c parameters: {}", e).into())
        }

        _ => Err(unknown_driver_error(&params.name)),
    }
}

fn unknown_driver_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown driver: {}\n\n", name);
    msg.push_str(&driver_help());
    msg.push_str("\nUse 'rsmbus list-drivers' for more details");
    msg.into()
}
