mod cli;
mod commands;
mod input;
mod profile;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use trainer_core::Currency;

use cli::{Cli, Command};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("trainer=info".parse()?))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Status => commands::status::run(&cli),
        Command::Coins { action } => commands::currency::run(&cli, Currency::Coins, action),
        Command::Diamonds { action } => commands::currency::run(&cli, Currency::Diamonds, action),
        Command::Apply { target } => commands::currency::apply(&cli, *target),
        Command::Boost { action } => commands::boost::run(&cli, action),
        Command::Fuel { value } => commands::fuel::run(&cli, *value),
        Command::Peek { address, kind } => commands::peek::peek(&cli, address, *kind),
        Command::Poke {
            address,
            value,
            kind,
        } => commands::peek::poke(&cli, address, value, *kind),
        Command::Resolve {
            base,
            offsets,
            kind,
        } => commands::resolve::run(&cli, base, offsets, *kind),
        Command::Hexdump {
            address,
            size,
            ascii,
        } => commands::hexdump::run(&cli, address, *size, *ascii),
        Command::Layout { action } => commands::layout::run(&cli, action),
        Command::Profile { action } => commands::profile::run(&cli, action),
    }
}
