//! Layout command implementation.

use anyhow::{Context, Result};
use trainer_core::save_layout;

use crate::cli::{Cli, LayoutAction};
use crate::profile::Profile;

/// Run the layout command. Does not attach to the game.
pub fn run(cli: &Cli, action: &LayoutAction) -> Result<()> {
    let profile = Profile::load(&cli.profile)?;
    let trainer = super::build_trainer(cli, &profile)?;

    match action {
        LayoutAction::Show => {
            println!("{}", serde_json::to_string_pretty(trainer.layout())?);
        }
        LayoutAction::Save { path } => {
            save_layout(path, trainer.layout())
                .with_context(|| format!("Failed to write layout {}", path.display()))?;
            println!("Saved layout to {}", path.display());
        }
    }

    Ok(())
}
