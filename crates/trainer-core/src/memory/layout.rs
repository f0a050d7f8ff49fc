//! Memory layout of the target game build
//!
//! Flat offsets and pointer chains are relative to a module base. They only
//! hold for one build of the game, so [`MemoryLayout`] can be replaced from a
//! JSON file without touching the engine.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

use super::pointer::{PointerChain, PointerPath};

/// Flat offsets from the executable image base
pub mod flat {
    /// Coins (u32)
    pub const COINS: u64 = 0x28CAD4;
    /// Diamonds (u32)
    pub const DIAMONDS: u64 = 0x28CAEC;
}

/// Fuel pointer (f32), relative to the executable image base
pub mod fuel {
    pub const BASE: u64 = 0x0028CA2C;
    pub const CHAIN: [i32; 1] = [0x2A8];
}

/// Boost pointer (i32), relative to the configured module base
pub mod boost {
    pub const BASE: u64 = 0x00396244;
    pub const PRIMARY: [i32; 7] = [0x4, 0x14, 0x14, 0x8, 0x30, 0xF8, 0xE4];
    pub const SECONDARY: [i32; 7] = [0x4, 0x14, 0x14, 0x8, 0x7C, 0xF8, 0xE4];
    pub const TERTIARY: [i32; 7] = [0x4, 0x14, 0x14, 0x8, 0x8C, 0xF8, 0xE4];

    /// Accepted boost count range (exclusive bounds)
    pub const MIN_EXCLUSIVE: i32 = 0;
    pub const MAX_EXCLUSIVE: i32 = 10_000;
}

/// Timing constants for the freeze loop
pub mod timing {
    use std::time::Duration;

    /// Interval between freeze writes
    pub const FREEZE_INTERVAL: Duration = Duration::from_millis(110);

    /// Bounded wait for the freeze loop to exit before detaching
    pub const FREEZE_STOP_TIMEOUT: Duration = Duration::from_millis(120);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLayout {
    pub coins: u64,
    pub diamonds: u64,
    pub fuel: PointerPath,
    pub boost_base: u64,
    /// Boost chains in the order they are tried: primary first, then fallbacks
    pub boost_chains: Vec<PointerChain>,
}

impl Default for MemoryLayout {
    fn default() -> Self {
        Self {
            coins: flat::COINS,
            diamonds: flat::DIAMONDS,
            fuel: PointerPath::new(fuel::BASE, fuel::CHAIN),
            boost_base: boost::BASE,
            boost_chains: vec![
                PointerChain::new(boost::PRIMARY),
                PointerChain::new(boost::SECONDARY),
                PointerChain::new(boost::TERTIARY),
            ],
        }
    }
}

impl MemoryLayout {
    /// Reject tables the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.boost_chains.is_empty() {
            return Err(Error::InvalidOffset("no boost pointer chain".to_string()));
        }
        for (name, value) in [
            ("coins", self.coins),
            ("diamonds", self.diamonds),
            ("fuel base", self.fuel.base_offset),
            ("boost base", self.boost_base),
        ] {
            if value == 0 {
                return Err(Error::InvalidOffset(format!("{name} offset is zero")));
            }
        }
        Ok(())
    }
}

/// Load a layout from a JSON file
pub fn load_layout<P: AsRef<Path>>(path: P) -> Result<MemoryLayout> {
    let content = fs::read_to_string(path.as_ref())?;
    let layout: MemoryLayout = serde_json::from_str(&content)?;
    layout.validate()?;
    info!("Loaded memory layout from {}", path.as_ref().display());
    Ok(layout)
}

/// Save a layout as pretty JSON
pub fn save_layout<P: AsRef<Path>>(path: P, layout: &MemoryLayout) -> Result<()> {
    let content = serde_json::to_string_pretty(layout)?;
    fs::write(path, content)?;
    Ok(())
}
