//! Boost commands.

use anyhow::{Context, Result};
use tracing::warn;
use trainer_core::save_layout;

use super::hex_utils::format_hex_address;
use crate::cli::{BoostAction, Cli};

/// Run the boost command
pub fn run(cli: &Cli, action: &BoostAction) -> Result<()> {
    let (mut trainer, _profile) = super::attach(cli)?;

    match action {
        BoostAction::Set { value } => {
            println!("Make sure the boost shop is open in game.");
            let address = trainer.set_boosts(*value)?;
            println!("Wrote boosts={} at {}", value, format_hex_address(address));
        }
        BoostAction::Recalibrate { save } => {
            let calibration = trainer
                .recalibrate_boosts()
                .context("Could not recalibrate with the fallback offsets")?;
            println!(
                "Recalibrated with chain {} {}",
                calibration.chain,
                trainer.active_boost_chain()
            );
            println!(
                "Resolved {} with value {}",
                format_hex_address(calibration.address),
                calibration.value
            );

            match save {
                Some(path) => {
                    save_layout(path, &trainer.calibrated_layout())
                        .with_context(|| format!("Failed to write layout {}", path.display()))?;
                    println!("Saved layout to {} (use it with --layout)", path.display());
                }
                None => warn!(
                    "The recalibrated chain only lasts for this run; pass --save <file> to keep it"
                ),
            }
        }
    }

    Ok(())
}
