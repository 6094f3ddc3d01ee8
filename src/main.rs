//! rsmbus - SMBus/I2C device access from the command line
//!
//! Every transaction kind of the `rsmbus-core` dispatcher is available as a
//! subcommand. The bus driver is chosen at runtime with a driver string:
//!
//! - **dummy** - in-memory device emulator, optionally preloaded from a
//!   TOML device image
//! - **linux_i2c** - Linux `/dev/i2c-N` character devices
//!
//! Each invocation opens one handle, performs one transaction, prints the
//! result in hex, and closes the handle.

mod cli;
mod commands;
mod drivers;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Output;
use rsmbus_core::Smbus;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Verbosity only raises the default; RUST_LOG still takes precedence
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Commands::ListDrivers = cli.command {
        commands::list_drivers();
        return Ok(());
    }

    let driver = drivers::open_driver(&cli.driver)?;
    let mut smbus = Smbus::new(driver);

    match commands::run(&mut smbus, cli.bus, cli.address, &cli.command) {
        Ok(Output::Done) => {}
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
