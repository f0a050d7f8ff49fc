use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::error::Result;

/// Role a backend plays inside a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    /// Write-capable backend, preferred for every write
    Write,
    /// Read and pointer-chasing backend, may also expose writes
    Read,
}

/// An open handle onto another process's address space.
///
/// Implementations must tolerate concurrent calls from two threads (the
/// foreground and the freeze loop).
pub trait MemoryBackend: Send + Sync {
    /// Read exactly `buf.len()` bytes at `address`.
    fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<()>;

    /// Write all of `bytes` at `address`.
    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()>;

    /// Whether `write_bytes` is usable at all on this backend.
    fn supports_write(&self) -> bool {
        true
    }

    /// Release the underlying handle. Called once, on detach.
    fn close(&mut self) -> Result<()>;
}

/// Opens backends for a process id.
pub trait BackendOpener: Send + Sync {
    fn open(&self, kind: BackendKind, pid: u32) -> Result<Box<dyn MemoryBackend>>;
}
