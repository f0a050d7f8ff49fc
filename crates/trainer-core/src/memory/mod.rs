mod backend;
pub mod layout;
mod native;
mod pointer;
mod process;
mod reader;
mod scalar;
mod session;

#[cfg(test)]
pub mod mock;

pub use backend::{BackendKind, BackendOpener, MemoryBackend};
pub use native::NativeOpener;
pub use pointer::{PointerChain, PointerPath, resolve_pointer_chain};
pub use process::*;
pub use reader::ReadMemory;
pub use scalar::{Scalar, ScalarKind};
pub use session::MemorySession;

#[cfg(test)]
pub use mock::{MockLocator, MockMemory, MockMemoryBuilder, MockOpener};
