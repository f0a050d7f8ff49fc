//! Attach lifecycle and backend composition.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::backend::{BackendKind, BackendOpener, MemoryBackend};
use super::pointer::{PointerChain, resolve_pointer_chain};
use super::reader::ReadMemory;
use super::scalar::{Scalar, ScalarKind};

#[derive(Default)]
struct Backends {
    pid: Option<u32>,
    write: Option<Box<dyn MemoryBackend>>,
    read: Option<Box<dyn MemoryBackend>>,
}

/// A session attached to at most one process.
///
/// Reads go through the read backend. Writes prefer the write backend and
/// fall back to the read backend. Handles are only replaced by
/// [`attach`](Self::attach) and [`detach`](Self::detach), which wait for
/// in-flight calls to finish.
pub struct MemorySession {
    opener: Arc<dyn BackendOpener>,
    backends: RwLock<Backends>,
}

impl MemorySession {
    pub fn new(opener: Arc<dyn BackendOpener>) -> Self {
        Self {
            opener,
            backends: RwLock::new(Backends::default()),
        }
    }

    fn backends(&self) -> RwLockReadGuard<'_, Backends> {
        self.backends.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn backends_mut(&self) -> RwLockWriteGuard<'_, Backends> {
        self.backends.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach to `pid`, replacing any previous attachment.
    ///
    /// Succeeds when at least one backend opens.
    pub fn attach(&self, pid: u32) -> Result<()> {
        self.detach();

        let write = self.opener.open(BackendKind::Write, pid);
        let read = self.opener.open(BackendKind::Read, pid);

        let (write, read) = match (write, read) {
            (Err(write), Err(read)) => {
                warn!("Could not open any backend for pid {}", pid);
                return Err(Error::Attach {
                    pid,
                    write: write.to_string(),
                    read: read.to_string(),
                });
            }
            (write, read) => (write, read),
        };

        let write = match write {
            Ok(backend) => Some(backend),
            Err(e) => {
                warn!("Write backend unavailable, writes fall back to read backend: {}", e);
                None
            }
        };
        let read = match read {
            Ok(backend) => Some(backend),
            Err(e) => {
                warn!("Read backend unavailable, reads and pointer resolution disabled: {}", e);
                None
            }
        };

        let mut backends = self.backends_mut();
        backends.pid = Some(pid);
        backends.write = write;
        backends.read = read;
        info!(
            "Attached to pid {} (write: {}, read: {})",
            pid,
            backends.write.is_some(),
            backends.read.is_some()
        );
        Ok(())
    }

    /// Release both backends. Safe to call at any time, any number of times.
    pub fn detach(&self) {
        let mut guard = self.backends_mut();
        let backends = &mut *guard;
        let pid = backends.pid.take();

        for (kind, slot) in [
            (BackendKind::Write, &mut backends.write),
            (BackendKind::Read, &mut backends.read),
        ] {
            if let Some(mut backend) = slot.take()
                && let Err(e) = backend.close()
            {
                warn!("Failed to close {} backend: {}", kind, e);
            }
        }

        if let Some(pid) = pid {
            debug!("Detached from pid {}", pid);
        }
    }

    pub fn is_attached(&self) -> bool {
        let backends = self.backends();
        backends.write.is_some() || backends.read.is_some()
    }

    pub fn has_write_backend(&self) -> bool {
        self.backends().write.is_some()
    }

    pub fn has_read_backend(&self) -> bool {
        self.backends().read.is_some()
    }

    pub fn process_id(&self) -> Option<u32> {
        self.backends().pid
    }

    /// Write raw bytes, falling back to the read backend when the write
    /// backend is missing or fails.
    pub fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
        let backends = self.backends();
        let mut cause = None;

        if let Some(writer) = backends.write.as_deref() {
            match writer.write_bytes(address, bytes) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!("Write backend failed at {:#x}: {}", address, e);
                    cause = Some(e.to_string());
                }
            }
        }

        if let Some(reader) = backends.read.as_deref().filter(|r| r.supports_write()) {
            match reader.write_bytes(address, bytes) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!("Read backend write failed at {:#x}: {}", address, e);
                    cause = Some(e.to_string());
                }
            }
        }

        Err(Error::NoWriteBackend { address, cause })
    }

    pub fn write_scalar(&self, address: u64, value: Scalar) -> Result<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn read_scalar(&self, address: u64, kind: ScalarKind) -> Result<Scalar> {
        ReadMemory::read_scalar(self, address, kind)
    }

    /// Resolve a pointer chain through the read backend.
    pub fn resolve_pointer_chain(&self, base: u64, chain: &PointerChain) -> Result<u64> {
        if !self.has_read_backend() {
            return Err(Error::BackendUnavailable(BackendKind::Read));
        }
        resolve_pointer_chain(self, base, chain)
    }
}

impl ReadMemory for MemorySession {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let backends = self.backends();
        let reader = backends
            .read
            .as_deref()
            .ok_or(Error::BackendUnavailable(BackendKind::Read))?;

        let mut buf = vec![0u8; size];
        reader.read_into(address, &mut buf)?;
        Ok(buf)
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::mock::{MockMemoryBuilder, MockOpener};

    const PID: u32 = 1200;

    fn session(opener: &MockOpener) -> MemorySession {
        MemorySession::new(Arc::new(opener.clone()))
    }

    #[test]
    fn test_attach_opens_both_backends() {
        let opener = MockOpener::new(MockMemoryBuilder::new().build());
        let session = session(&opener);

        session.attach(PID).unwrap();
        assert!(session.is_attached());
        assert!(session.has_write_backend());
        assert!(session.has_read_backend());
        assert_eq!(session.process_id(), Some(PID));
        assert_eq!(opener.opened(), 2);
    }

    #[test]
    fn test_attach_both_failing() {
        let opener = MockOpener::new(MockMemoryBuilder::new().build())
            .fail_open(BackendKind::Write)
            .fail_open(BackendKind::Read);
        let session = session(&opener);

        let err = session.attach(PID).unwrap_err();
        match &err {
            Error::Attach { pid, write, read } => {
                assert_eq!(*pid, PID);
                assert!(write.starts_with("Failed to open process: pid 1200 for write"));
                assert!(read.starts_with("Failed to open process: pid 1200 for read"));
            }
            other => panic!("expected attach error, got {other:?}"),
        }
        assert!(!session.is_attached());
        assert_eq!(session.process_id(), None);

        session.detach();
        session.detach();
        assert_eq!(opener.closed(), 0);
    }

    #[test]
    fn test_reattach_releases_previous_backends() {
        let opener = MockOpener::new(MockMemoryBuilder::new().build());
        let session = session(&opener);

        session.attach(PID).unwrap();
        session.attach(PID + 1).unwrap();
        assert_eq!(opener.closed(), 2);
        assert_eq!(session.process_id(), Some(PID + 1));
    }

    #[test]
    fn test_failed_reattach_leaves_session_detached() {
        let opener = MockOpener::new(MockMemoryBuilder::new().build());
        let session = session(&opener);

        session.attach(PID).unwrap();
        opener.reject_all();
        assert!(session.attach(PID).is_err());
        assert!(!session.is_attached());
        assert_eq!(opener.closed(), 2);
    }

    #[test]
    fn test_detach_closes_both_even_when_close_fails() {
        let opener = MockOpener::new(MockMemoryBuilder::new().build()).failing_close();
        let session = session(&opener);

        session.attach(PID).unwrap();
        session.detach();
        assert_eq!(opener.closed(), 2);
        assert!(!session.is_attached());
        assert!(!session.has_write_backend());
        assert!(!session.has_read_backend());
    }

    #[test]
    fn test_drop_detaches() {
        let opener = MockOpener::new(MockMemoryBuilder::new().build());
        {
            let session = session(&opener);
            session.attach(PID).unwrap();
        }
        assert_eq!(opener.closed(), 2);
    }

    #[test]
    fn test_read_requires_read_backend() {
        let opener =
            MockOpener::new(MockMemoryBuilder::new().build()).fail_open(BackendKind::Read);
        let session = session(&opener);
        session.attach(PID).unwrap();

        assert!(matches!(
            session.read_scalar(0x1000, ScalarKind::U32),
            Err(Error::BackendUnavailable(BackendKind::Read))
        ));
        assert!(matches!(
            session.resolve_pointer_chain(0x1000, &PointerChain::default()),
            Err(Error::BackendUnavailable(BackendKind::Read))
        ));
        // Writes still work through the write backend
        session.write_scalar(0x1000, Scalar::U32(7)).unwrap();
    }

    #[test]
    fn test_write_falls_back_to_read_backend() {
        let opener = MockOpener::new(MockMemoryBuilder::new().build()).broken_writer();
        let session = session(&opener);
        session.attach(PID).unwrap();

        session.write_scalar(0x2000, Scalar::I32(-42)).unwrap();
        assert_eq!(opener.memory().read_i32(0x2000).unwrap(), -42);
    }

    #[test]
    fn test_write_uses_read_backend_when_writer_missing() {
        let opener =
            MockOpener::new(MockMemoryBuilder::new().build()).fail_open(BackendKind::Write);
        let session = session(&opener);
        session.attach(PID).unwrap();
        assert!(!session.has_write_backend());

        session.write_bytes(0x2000, &[1, 2, 3, 4]).unwrap();
        assert_eq!(opener.memory().read_bytes(0x2000, 4).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_no_write_backend() {
        let opener = MockOpener::new(MockMemoryBuilder::new().build())
            .broken_writer()
            .read_only_reader();
        let session = session(&opener);
        session.attach(PID).unwrap();

        let err = session.write_bytes(0x2000, &[1, 2, 3, 4]).unwrap_err();
        match err {
            Error::NoWriteBackend { address, cause } => {
                assert_eq!(address, 0x2000);
                assert!(cause.unwrap().contains("write rejected"));
            }
            other => panic!("expected NoWriteBackend, got {other:?}"),
        }
    }

    #[test]
    fn test_write_when_detached() {
        let opener = MockOpener::new(MockMemoryBuilder::new().build());
        let session = session(&opener);

        assert!(matches!(
            session.write_bytes(0x10, &[0]),
            Err(Error::NoWriteBackend { cause: None, .. })
        ));
    }

    #[test]
    fn test_float_round_trip_is_bit_identical() {
        let opener = MockOpener::new(MockMemoryBuilder::new().build());
        let session = session(&opener);
        session.attach(PID).unwrap();

        for v in [100.0f32, -0.0, 1.5e-38, f32::MAX, f32::MIN_POSITIVE, 0.1, -273.15] {
            session.write_scalar(0x3000, Scalar::F32(v)).unwrap();
            match session.read_scalar(0x3000, ScalarKind::F32).unwrap() {
                Scalar::F32(read) => assert_eq!(read.to_bits(), v.to_bits()),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_flat_offset_integer_round_trip() {
        let opener = MockOpener::new(MockMemoryBuilder::new().build());
        let session = session(&opener);
        session.attach(PID).unwrap();

        let address = 0x0040_0000 + 0x28CAD4;
        session.write_scalar(address, Scalar::I32(100_000_000)).unwrap();
        assert_eq!(
            session.read_scalar(address, ScalarKind::I32).unwrap(),
            Scalar::I32(100_000_000)
        );
        assert_eq!(session.read_u32(address).unwrap(), 100_000_000);
    }

    #[test]
    fn test_resolve_chain_through_session() {
        let memory = MockMemoryBuilder::new().with_u32(0x1000, 0x8000).build();
        let opener = MockOpener::new(memory);
        let session = session(&opener);
        session.attach(PID).unwrap();

        let chain = PointerChain::new(vec![0x2A8]);
        assert_eq!(session.resolve_pointer_chain(0x1000, &chain).unwrap(), 0x82A8);
    }
}
