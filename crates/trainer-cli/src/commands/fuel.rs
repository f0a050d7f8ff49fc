//! Fuel freeze command.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use owo_colors::OwoColorize;
use tracing::{info, warn};
use trainer_core::{FreezeStatus, ShutdownSignal};

use super::hex_utils::format_hex_address;
use crate::cli::Cli;
use crate::input;

const STATUS_INTERVAL: Duration = Duration::from_secs(1);

fn print_status(status: &FreezeStatus) {
    let state = if status.running {
        "frozen".green().to_string()
    } else {
        "stopped".red().to_string()
    };
    print!(
        "\r{} at {}  writes={} failures={}",
        state,
        format_hex_address(status.target),
        status.writes,
        status.failures
    );
    if let Some(error) = &status.last_error
        && status.failures > 0
    {
        print!("  last error: {}", error.yellow());
    }
    println!();
}

/// Hold fuel until the user stops the command
pub fn run(cli: &Cli, value: Option<f32>) -> Result<()> {
    let (mut trainer, profile) = super::attach(cli)?;
    let value = value.unwrap_or_else(|| profile.fuel_value());
    if !value.is_finite() {
        anyhow::bail!("Fuel value must be a finite number");
    }

    let shutdown = Arc::new(ShutdownSignal::new());
    let shutdown_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping...");
        shutdown_ctrlc.trigger();
    })?;

    let _keyboard_handle = input::spawn_keyboard_monitor(Arc::clone(&shutdown));

    let address = trainer.start_fuel_freeze(value)?;
    println!(
        "Fuel frozen to {:.2} at {} (Press Esc or q to stop)",
        value,
        format_hex_address(address)
    );

    while !shutdown.wait(STATUS_INTERVAL) {
        match trainer.fuel_status() {
            Some(status) if status.running => print_status(&status),
            Some(status) => {
                warn!("Fuel freeze loop exited on its own");
                print_status(&status);
                break;
            }
            None => break,
        }
    }

    let final_status = trainer.fuel_status();
    trainer.shutdown();
    if let Some(status) = final_status {
        println!(
            "Stopped after {} writes ({} failed)",
            status.writes, status.failures
        );
    }

    Ok(())
}
