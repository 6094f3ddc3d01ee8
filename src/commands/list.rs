//! List commands implementation

use crate::drivers;

/// List all available bus drivers
pub fn list_drivers() {
    let drivers = drivers::available_drivers();

    if drivers.is_empty() {
        println!("No drivers available (recompile with driver features enabled)");
        return;
    }

    println!("Available drivers:");
    println!();
    for d in &drivers {
        println!("  {:10} - {}", d.name, d.description);
        if !d.aliases.is_empty() {
            println!("  {:10}   aliases: {}", "", d.aliases.join(", "));
        }
    }
}
