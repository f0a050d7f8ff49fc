//! The trainer engine.
//!
//! `Trainer` ties the pieces together:
//! - locating the game process and its module bases
//! - attaching a [`MemorySession`]
//! - reading and writing the tracked values through the [`MemoryLayout`]
//! - running the fuel freeze on a background [`FreezeWorker`]
//!
//! ## Example
//!
//! ```ignore
//! use trainer_core::{Currency, Trainer, TrainerConfig};
//!
//! let mut trainer = Trainer::new(TrainerConfig::default())?;
//! let process = trainer.attach()?;
//! let coins = trainer.add_currency(Currency::Coins, 100_000_000)?;
//! trainer.start_fuel_freeze(100.0)?;
//! // ...
//! trainer.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use strum::{Display, EnumString, IntoStaticStr};
use tracing::{debug, info, warn};

use crate::config::TrainerConfig;
use crate::error::{Error, Result};
use crate::freeze::FreezeWorker;
use crate::memory::layout::{MemoryLayout, boost, timing};
use crate::memory::{
    BackendOpener, MemorySession, NativeOpener, PointerChain, ProcessHandle, ProcessLocator,
    ReadMemory, Scalar, ScalarKind, SystemProcessLocator,
};

/// Flat u32 counters stored next to the executable image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Currency {
    Coins,
    Diamonds,
}

/// Default amount added by [`Trainer::add_currency`] callers
pub const DEFAULT_CURRENCY_STEP: u64 = 100_000_000;

/// Result of a successful boost recalibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoostCalibration {
    /// Index into [`MemoryLayout::boost_chains`]
    pub chain: usize,
    pub address: u64,
    pub value: i32,
}

/// Snapshot of the fuel freeze
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FreezeStatus {
    pub target: u64,
    pub running: bool,
    pub writes: u64,
    pub failures: u64,
    pub last_error: Option<String>,
}

/// Builder for [`Trainer`]
pub struct TrainerBuilder {
    config: TrainerConfig,
    layout: Option<MemoryLayout>,
    locator: Option<Arc<dyn ProcessLocator>>,
    opener: Option<Arc<dyn BackendOpener>>,
    freeze_interval: Option<Duration>,
}

impl TrainerBuilder {
    /// Replace the built-in memory layout
    pub fn layout(mut self, layout: MemoryLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn locator(mut self, locator: Arc<dyn ProcessLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn opener(mut self, opener: Arc<dyn BackendOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn freeze_interval(mut self, interval: Duration) -> Self {
        self.freeze_interval = Some(interval);
        self
    }

    /// Build the engine, rejecting an unusable layout
    pub fn build(self) -> Result<Trainer> {
        let layout = self.layout.unwrap_or_default();
        layout.validate()?;

        Ok(Trainer {
            config: self.config,
            layout,
            locator: self
                .locator
                .unwrap_or_else(|| Arc::new(SystemProcessLocator)),
            session: Arc::new(MemorySession::new(
                self.opener.unwrap_or_else(|| Arc::new(NativeOpener)),
            )),
            process: ProcessHandle::default(),
            boost_chain: 0,
            fuel: None,
            freeze_interval: self.freeze_interval.unwrap_or(timing::FREEZE_INTERVAL),
        })
    }
}

pub struct Trainer {
    config: TrainerConfig,
    layout: MemoryLayout,
    locator: Arc<dyn ProcessLocator>,
    session: Arc<MemorySession>,
    process: ProcessHandle,
    /// Index of the boost chain currently in use
    boost_chain: usize,
    fuel: Option<FreezeWorker>,
    freeze_interval: Duration,
}

impl Trainer {
    /// Engine over the live system with the built-in layout
    pub fn new(config: TrainerConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: TrainerConfig) -> TrainerBuilder {
        TrainerBuilder {
            config,
            layout: None,
            locator: None,
            opener: None,
            freeze_interval: None,
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    pub fn session(&self) -> &Arc<MemorySession> {
        &self.session
    }

    pub fn process(&self) -> ProcessHandle {
        self.process
    }

    /// Find the game, attach and resolve its bases.
    pub fn attach(&mut self) -> Result<ProcessHandle> {
        self.stop_fuel_freeze();
        self.session.detach();
        self.process = ProcessHandle::default();

        let name = &self.config.process_name;
        let pid = self.locator.find_process_id(name)?;
        self.session.attach(pid)?;

        let image_base = self.locator.find_module_base(pid, name);
        if image_base == 0 {
            warn!("Could not resolve image base of {}", name);
        }

        let module_base = match &self.config.module_name {
            Some(module) => {
                let base = self.locator.find_module_base(pid, module);
                if base == 0 {
                    warn!("Could not resolve base of module {}", module);
                }
                base
            }
            None => 0,
        };

        self.process = ProcessHandle {
            process_id: pid,
            image_base,
            module_base,
        };
        self.boost_chain = 0;
        info!(
            "Attached to {} (pid {}, image {:#x}, module {:#x})",
            name, pid, image_base, module_base
        );
        Ok(self.process)
    }

    /// Stop the freeze and release the process.
    pub fn shutdown(&mut self) {
        self.stop_fuel_freeze();
        self.session.detach();
        self.process = ProcessHandle::default();
    }

    fn image_address(&self, offset: u64) -> Result<u64> {
        if self.process.image_base == 0 {
            return Err(Error::BaseUnresolved("image base"));
        }
        Ok(self.process.image_base + offset)
    }

    fn module_address(&self, offset: u64) -> Result<u64> {
        if self.process.module_base == 0 {
            return Err(Error::BaseUnresolved("module base"));
        }
        Ok(self.process.module_base + offset)
    }

    pub fn currency_address(&self, currency: Currency) -> Result<u64> {
        self.image_address(match currency {
            Currency::Coins => self.layout.coins,
            Currency::Diamonds => self.layout.diamonds,
        })
    }

    pub fn read_currency(&self, currency: Currency) -> Result<u32> {
        let address = self.currency_address(currency)?;
        self.session.read_u32(address)
    }

    pub fn set_currency(&self, currency: Currency, value: u32) -> Result<()> {
        let address = self.currency_address(currency)?;
        self.session.write_scalar(address, Scalar::U32(value))?;
        info!("{} set to {}", currency, value);
        Ok(())
    }

    /// Add `delta` to the current value. An unreadable value counts as 0.
    pub fn add_currency(&self, currency: Currency, delta: u64) -> Result<u32> {
        let address = self.currency_address(currency)?;
        let current = match self.session.read_u32(address) {
            Ok(v) => v,
            Err(e) => {
                debug!("Could not read {} ({}), assuming 0", currency, e);
                0
            }
        };

        let total = u64::from(current).saturating_add(delta);
        let value = u32::try_from(total).map_err(|_| Error::ValueOutOfRange {
            field: currency.into(),
            value: i64::try_from(total).unwrap_or(i64::MAX),
            min: 0,
            max: i64::from(u32::MAX),
        })?;

        self.session.write_scalar(address, Scalar::U32(value))?;
        info!("Added {} {}: {}", delta, currency, value);
        Ok(value)
    }

    /// Boost chain currently used by [`set_boosts`](Self::set_boosts)
    pub fn active_boost_chain(&self) -> &PointerChain {
        &self.layout.boost_chains[self.boost_chain]
    }

    /// Current layout with the active boost chain moved to the front, so a
    /// saved copy starts from the recalibrated chain on the next run.
    pub fn calibrated_layout(&self) -> MemoryLayout {
        let mut layout = self.layout.clone();
        let active = layout.boost_chains.remove(self.boost_chain);
        layout.boost_chains.insert(0, active);
        layout
    }

    pub fn boost_address(&self) -> Result<u64> {
        let base = self.module_address(self.layout.boost_base)?;
        self.session
            .resolve_pointer_chain(base, self.active_boost_chain())
    }

    /// Write the boost count through the active chain.
    ///
    /// The chain only resolves while the boost shop is open in game.
    pub fn set_boosts(&self, value: i32) -> Result<u64> {
        if value <= boost::MIN_EXCLUSIVE || value >= boost::MAX_EXCLUSIVE {
            return Err(Error::ValueOutOfRange {
                field: "boosts",
                value: i64::from(value),
                min: i64::from(boost::MIN_EXCLUSIVE + 1),
                max: i64::from(boost::MAX_EXCLUSIVE - 1),
            });
        }

        let address = self.boost_address()?;
        self.session.write_scalar(address, Scalar::I32(value))?;
        info!("Boosts set to {} at {:#x}", value, address);
        Ok(address)
    }

    /// Switch to the first fallback chain that resolves to a readable value.
    pub fn recalibrate_boosts(&mut self) -> Result<BoostCalibration> {
        let base = self.module_address(self.layout.boost_base)?;
        let mut last_error = None;

        for (index, chain) in self.layout.boost_chains.iter().enumerate().skip(1) {
            let attempt = self
                .session
                .resolve_pointer_chain(base, chain)
                .and_then(|address| Ok((address, self.session.read_i32(address)?)));

            match attempt {
                Ok((address, value)) => {
                    info!(
                        "Recalibrated boosts with chain {} {}: {:#x} = {}",
                        index, chain, address, value
                    );
                    self.boost_chain = index;
                    return Ok(BoostCalibration {
                        chain: index,
                        address,
                        value,
                    });
                }
                Err(e) => {
                    debug!("Boost chain {} {} failed: {}", index, chain, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::InvalidOffset("no fallback boost chain".to_string())))
    }

    /// Resolve the fuel address, falling back to `base + first offset`.
    pub fn fuel_address(&self) -> Result<u64> {
        let base = self.image_address(self.layout.fuel.base_offset)?;
        let chain = &self.layout.fuel.chain;

        match self.session.resolve_pointer_chain(base, chain) {
            Ok(address) => Ok(address),
            Err(e) => {
                let offset = i64::from(chain.first().unwrap_or(0));
                let address = base.wrapping_add_signed(offset);
                warn!(
                    "Fuel pointer unresolved ({}), using flat address {:#x}",
                    e, address
                );
                Ok(address)
            }
        }
    }

    /// Start freezing fuel at `value`. Returns the frozen address.
    ///
    /// Already running: nothing changes, the running target is returned.
    pub fn start_fuel_freeze(&mut self, value: f32) -> Result<u64> {
        if let Some(worker) = &self.fuel
            && worker.is_running()
        {
            debug!("Fuel freeze already running at {:#x}", worker.target());
            return Ok(worker.target());
        }

        let address = self.fuel_address()?;
        let worker = FreezeWorker::start(
            Arc::clone(&self.session),
            address,
            Scalar::F32(value).to_le_bytes().to_vec(),
            self.freeze_interval,
        )?;
        self.fuel = Some(worker);
        Ok(address)
    }

    /// Stop the fuel freeze. Returns whether one was running.
    pub fn stop_fuel_freeze(&mut self) -> bool {
        match self.fuel.take() {
            Some(worker) => {
                let target = worker.target();
                if worker.stop(timing::FREEZE_STOP_TIMEOUT) {
                    info!("Fuel freeze stopped");
                } else {
                    warn!("Fuel freeze at {:#x} abandoned before its loop exited", target);
                }
                true
            }
            None => false,
        }
    }

    /// Flip the fuel freeze. Returns `true` when it is now running.
    pub fn toggle_fuel_freeze(&mut self, value: f32) -> Result<bool> {
        if self.stop_fuel_freeze() {
            return Ok(false);
        }
        self.start_fuel_freeze(value)?;
        Ok(true)
    }

    pub fn fuel_status(&self) -> Option<FreezeStatus> {
        self.fuel.as_ref().map(|worker| FreezeStatus {
            target: worker.target(),
            running: worker.is_running(),
            writes: worker.writes(),
            failures: worker.failures(),
            last_error: worker.last_error(),
        })
    }

    pub fn peek(&self, address: u64, kind: ScalarKind) -> Result<Scalar> {
        self.session.read_scalar(address, kind)
    }

    pub fn poke(&self, address: u64, value: Scalar) -> Result<()> {
        self.session.write_scalar(address, value)
    }

    pub fn resolve(&self, base: u64, chain: &PointerChain) -> Result<u64> {
        self.session.resolve_pointer_chain(base, chain)
    }
}

impl Drop for Trainer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
