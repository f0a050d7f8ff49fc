//! Status command implementation.

use anyhow::Result;
use owo_colors::OwoColorize;
use trainer_core::Currency;

use super::hex_utils::format_hex_address;
use crate::cli::Cli;

fn base_label(base: u64) -> String {
    if base == 0 {
        "unresolved".red().to_string()
    } else {
        format_hex_address(base).green().to_string()
    }
}

/// Run the status command
pub fn run(cli: &Cli) -> Result<()> {
    let (trainer, _profile) = super::attach(cli)?;
    let process = trainer.process();
    let session = trainer.session();

    println!(
        "{} {} (PID: {})",
        "Attached to".bold(),
        trainer.config().process_name,
        process.process_id
    );
    println!("  Image base:  {}", base_label(process.image_base));
    println!(
        "  Module base: {} ({})",
        base_label(process.module_base),
        trainer.config().module_name.as_deref().unwrap_or("none")
    );
    println!(
        "  Backends:    write={} read={}",
        session.has_write_backend(),
        session.has_read_backend()
    );
    println!();

    for currency in [Currency::Coins, Currency::Diamonds] {
        match trainer.read_currency(currency) {
            Ok(value) => println!("  {:<9} {}", currency.to_string(), value),
            Err(e) => println!("  {:<9} {} ({})", currency.to_string(), "unreadable".yellow(), e),
        }
    }

    match trainer.fuel_address() {
        Ok(address) => println!("  {:<9} {}", "fuel", format_hex_address(address)),
        Err(e) => println!("  {:<9} {} ({})", "fuel", "unresolved".yellow(), e),
    }

    match trainer.boost_address() {
        Ok(address) => println!(
            "  {:<9} {} via {}",
            "boost",
            format_hex_address(address),
            trainer.active_boost_chain()
        ),
        Err(e) => println!("  {:<9} {} ({})", "boost", "unresolved".yellow(), e),
    }

    Ok(())
}
