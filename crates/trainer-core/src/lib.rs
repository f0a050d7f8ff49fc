//! # trainer-core
//!
//! Engine for attaching to a running game process and editing its memory.
//!
//! This crate provides:
//! - Process and module base lookup
//! - A memory session composing a write backend and a read backend
//! - Multi-level pointer chain resolution over 32-bit pointers
//! - A background freeze loop pinning one address to a fixed value
//! - The `Trainer` engine driving all of the above through a swappable memory layout

pub mod config;
pub mod error;
pub mod freeze;
pub mod memory;
pub mod shutdown;
pub mod trainer;

pub use config::TrainerConfig;
pub use error::{Error, Result};
pub use freeze::FreezeWorker;
pub use memory::layout::{MemoryLayout, load_layout, save_layout};
pub use memory::{
    BackendKind, BackendOpener, MemoryBackend, MemorySession, ModuleEntry, NativeOpener,
    PointerChain, PointerPath, ProcessEntry, ProcessHandle, ProcessLocator, ReadMemory, Scalar,
    ScalarKind, SystemProcessLocator, resolve_pointer_chain, select_module, select_process,
};
pub use shutdown::ShutdownSignal;
pub use trainer::{
    BoostCalibration, Currency, DEFAULT_CURRENCY_STEP, FreezeStatus, Trainer, TrainerBuilder,
};
