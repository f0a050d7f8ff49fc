//! Coins and diamonds commands.

use anyhow::{Context, Result};
use trainer_core::Currency;

use crate::cli::{Cli, CurrencyAction};
use crate::profile::HotkeyMode;

/// Run a get/set/add action
pub fn run(cli: &Cli, currency: Currency, action: &CurrencyAction) -> Result<()> {
    let (trainer, _profile) = super::attach(cli)?;

    match *action {
        CurrencyAction::Get => {
            let value = trainer.read_currency(currency)?;
            println!("{}: {}", currency, value);
        }
        CurrencyAction::Set { value } => {
            trainer.set_currency(currency, value)?;
            println!("{} set to {}", currency, value);
        }
        CurrencyAction::Add { amount } => {
            let value = trainer.add_currency(currency, amount)?;
            println!("Added {}. {}: {}", amount, currency, value);
        }
    }

    Ok(())
}

/// Run the action bound to the value's hotkey in the profile
pub fn apply(cli: &Cli, currency: Currency) -> Result<()> {
    let (trainer, profile) = super::attach(cli)?;
    let binding = profile.hotkeys.for_currency(currency);

    let amount: u64 = binding
        .value
        .trim()
        .parse()
        .with_context(|| format!("Saved {} hotkey value {:?} is not a number", currency, binding.value))?;

    match binding.mode {
        HotkeyMode::Set => {
            let value = u32::try_from(amount)
                .with_context(|| format!("{} is out of 32-bit unsigned range", amount))?;
            trainer.set_currency(currency, value)?;
            println!("{} set to {}", currency, value);
        }
        HotkeyMode::Increase => {
            let value = trainer.add_currency(currency, amount)?;
            println!("Added {}. {}: {}", amount, currency, value);
        }
    }

    Ok(())
}
