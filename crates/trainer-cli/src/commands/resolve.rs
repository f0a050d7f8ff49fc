//! Resolve command implementation.
//!
//! Walks a pointer chain the same way the engine does for fuel and boosts,
//! which makes it handy for checking a new layout against a running game.

use anyhow::Result;
use trainer_core::{PointerChain, ScalarKind};

use super::hex_utils::{format_hex_address, parse_hex_address, parse_offset};
use crate::cli::Cli;

/// Run the resolve command
pub fn run(cli: &Cli, base: &str, offsets: &[String], kind: Option<ScalarKind>) -> Result<()> {
    let base = parse_hex_address(base)?;
    let chain = offsets
        .iter()
        .map(|s| parse_offset(s))
        .collect::<Result<PointerChain>>()?;
    let (trainer, _profile) = super::attach(cli)?;

    let address = trainer.resolve(base, &chain)?;
    println!(
        "{} {} -> {}",
        format_hex_address(base),
        chain,
        format_hex_address(address)
    );

    if let Some(kind) = kind {
        match trainer.peek(address, kind) {
            Ok(value) => println!("Value ({}): {}", kind, value),
            Err(e) => println!("Value ({}): unreadable ({})", kind, e),
        }
    }

    Ok(())
}
