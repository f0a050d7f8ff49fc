//! CLI command implementations.
//!
//! Every command that touches the game goes through [`attach`], which builds
//! the engine from the profile and command-line overrides.

pub mod boost;
pub mod currency;
pub mod fuel;
pub mod hex_utils;
pub mod hexdump;
pub mod layout;
pub mod peek;
pub mod profile;
pub mod resolve;
pub mod status;

use anyhow::{Context, Result};
use tracing::debug;
use trainer_core::{Trainer, load_layout};

use crate::cli::Cli;
use crate::profile::Profile;

/// Build the engine without attaching
pub fn build_trainer(cli: &Cli, profile: &Profile) -> Result<Trainer> {
    let config = profile.trainer_config(cli.game.as_deref(), cli.module.as_deref());
    debug!(
        "Target: {} (module: {})",
        config.process_name,
        config.module_name.as_deref().unwrap_or("-")
    );

    let mut builder = Trainer::builder(config);
    if let Some(path) = &cli.layout {
        let layout = load_layout(path)
            .with_context(|| format!("Failed to load layout {}", path.display()))?;
        builder = builder.layout(layout);
    }
    Ok(builder.build()?)
}

/// Load the profile, build the engine and attach to the game
pub fn attach(cli: &Cli) -> Result<(Trainer, Profile)> {
    let profile = Profile::load(&cli.profile)?;
    let mut trainer = build_trainer(cli, &profile)?;

    let process = trainer.attach().with_context(|| {
        format!(
            "Could not attach to {} (is the game running? try running as administrator)",
            trainer.config().process_name
        )
    })?;
    debug!("Attached: {:?}", process);

    Ok((trainer, profile))
}
