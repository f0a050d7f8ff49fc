use std::path::PathBuf;

use clap::{Parser, Subcommand};
use trainer_core::{Currency, DEFAULT_CURRENCY_STEP, ScalarKind};

#[derive(Parser)]
#[command(name = "trainer")]
#[command(about = "Memory trainer for Hill Climb Racing")]
#[command(version)]
pub struct Cli {
    /// Profile file (target names, saved values, hotkeys)
    #[arg(short, long, global = true, default_value = "config.json")]
    pub profile: PathBuf,

    /// JSON memory layout replacing the built-in offsets
    #[arg(short, long, global = true)]
    pub layout: Option<PathBuf>,

    /// Target executable name (overrides the profile)
    #[arg(long, global = true, env = "TRAINER_GAME")]
    pub game: Option<String>,

    /// Module anchoring the boost pointer (overrides the profile)
    #[arg(long, global = true, env = "TRAINER_MODULE")]
    pub module: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Attach and show process info and current values
    Status,

    /// Read or change coins
    Coins {
        #[command(subcommand)]
        action: CurrencyAction,
    },

    /// Read or change diamonds
    Diamonds {
        #[command(subcommand)]
        action: CurrencyAction,
    },

    /// Run the saved hotkey action for a value (Set or Increase)
    Apply {
        /// coins or diamonds
        target: Currency,
    },

    /// Boost count (open the boost shop in game first)
    Boost {
        #[command(subcommand)]
        action: BoostAction,
    },

    /// Freeze fuel until Esc, q or Ctrl+C
    Fuel {
        /// Value to hold (defaults to the profile's fuel value)
        #[arg(long)]
        value: Option<f32>,
    },

    /// Read a scalar at an absolute address
    Peek {
        /// Address (hex)
        address: String,

        #[arg(short, long, default_value = "u32")]
        kind: ScalarKind,
    },

    /// Write a scalar at an absolute address
    Poke {
        /// Address (hex)
        address: String,

        /// Value (decimal, or 0x-prefixed hex for integers)
        #[arg(allow_hyphen_values = true)]
        value: String,

        #[arg(short, long, default_value = "u32")]
        kind: ScalarKind,
    },

    /// Resolve a pointer chain from an absolute base
    Resolve {
        /// Base address (hex)
        base: String,

        /// Offsets in hex, may be negative (-0x10)
        #[arg(allow_hyphen_values = true)]
        offsets: Vec<String>,

        /// Read a value at the resolved address
        #[arg(short, long)]
        kind: Option<ScalarKind>,
    },

    /// Dump raw memory
    Hexdump {
        /// Address (hex)
        address: String,

        /// Number of bytes
        #[arg(default_value_t = 64)]
        size: usize,

        /// Show ASCII column
        #[arg(long)]
        ascii: bool,
    },

    /// Show or export the memory layout
    Layout {
        #[command(subcommand)]
        action: LayoutAction,
    },

    /// Show or edit the profile file
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
pub enum CurrencyAction {
    /// Print the current value
    Get,
    /// Overwrite the value
    Set { value: u32 },
    /// Add to the current value
    Add {
        #[arg(default_value_t = DEFAULT_CURRENCY_STEP)]
        amount: u64,
    },
}

#[derive(Subcommand)]
pub enum BoostAction {
    /// Write the boost count through the active pointer chain
    Set { value: i32 },
    /// Try the fallback pointer chains
    Recalibrate {
        /// Write the layout with the working chain first to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum LayoutAction {
    /// Print the memory layout in use as JSON
    Show,
    /// Write the memory layout in use to a file (load it back with --layout)
    Save { path: PathBuf },
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Print the profile as JSON
    Show,
    /// Update saved values and write the profile back
    Save {
        #[arg(long)]
        coin: Option<u32>,
        #[arg(long)]
        diamond: Option<u32>,
        #[arg(long)]
        fuel: Option<f32>,
        #[arg(long)]
        boost: Option<i32>,
    },
}
