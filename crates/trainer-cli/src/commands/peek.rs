//! Peek and poke commands.

use anyhow::Result;
use trainer_core::ScalarKind;

use super::hex_utils::{format_hex_address, parse_hex_address, parse_scalar};
use crate::cli::Cli;

/// Read a scalar at an absolute address
pub fn peek(cli: &Cli, address: &str, kind: ScalarKind) -> Result<()> {
    let address = parse_hex_address(address)?;
    let (trainer, _profile) = super::attach(cli)?;

    let value = trainer.peek(address, kind)?;
    println!("{} ({}): {}", format_hex_address(address), kind, value);
    Ok(())
}

/// Write a scalar at an absolute address
pub fn poke(cli: &Cli, address: &str, value: &str, kind: ScalarKind) -> Result<()> {
    let address = parse_hex_address(address)?;
    let value = parse_scalar(kind, value)?;
    let (trainer, _profile) = super::attach(cli)?;

    trainer.poke(address, value)?;
    println!("Wrote {} ({}) at {}", value, kind, format_hex_address(address));
    Ok(())
}
