//! Profile file: target names, last used values and hotkey bindings.
//!
//! Values are stored as strings the way the user typed them, so a profile
//! written by hand with `"fuel": "100.00"` survives a load/save cycle.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info};
use trainer_core::config::DEFAULT_FUEL_VALUE;
use trainer_core::{Currency, TrainerConfig};

/// What a value hotkey does when pressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
pub enum HotkeyMode {
    /// Overwrite with the saved value
    #[default]
    Set,
    /// Add the saved value to the current one
    Increase,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueHotkey {
    pub mode: HotkeyMode,
    pub value: String,
    pub hotkey: String,
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleHotkey {
    pub hotkey: String,
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hotkeys {
    pub coins: ValueHotkey,
    pub diamonds: ValueHotkey,
    pub fuel: ToggleHotkey,
}

impl Hotkeys {
    pub fn for_currency(&self, currency: Currency) -> &ValueHotkey {
        match currency {
            Currency::Coins => &self.coins,
            Currency::Diamonds => &self.diamonds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub game: Option<String>,
    pub module: Option<String>,
    pub coin: String,
    pub diamond: String,
    pub fuel: String,
    pub boost: String,
    pub hotkeys: Hotkeys,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            game: None,
            module: None,
            coin: "0".to_string(),
            diamond: "0".to_string(),
            fuel: format!("{:.2}", DEFAULT_FUEL_VALUE),
            boost: "0".to_string(),
            hotkeys: Hotkeys::default(),
        }
    }
}

impl Profile {
    /// Load a profile. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Profile {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse profile {}", path.display()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Saved profile to {}", path.display());
        Ok(())
    }

    /// Engine config, command-line overrides first
    pub fn trainer_config(&self, game: Option<&str>, module: Option<&str>) -> TrainerConfig {
        let defaults = TrainerConfig::default();
        let process_name = game
            .map(str::to_string)
            .or_else(|| self.game.clone().filter(|g| !g.trim().is_empty()))
            .unwrap_or(defaults.process_name);
        let module_name = module
            .map(str::to_string)
            .or_else(|| self.module.clone())
            .or(defaults.module_name);
        TrainerConfig::new(process_name, module_name)
    }

    /// Saved fuel value; an unparsable entry falls back to the default
    pub fn fuel_value(&self) -> f32 {
        self.fuel.trim().parse().unwrap_or(DEFAULT_FUEL_VALUE)
    }
}
