//! In-process fakes for the memory layer.
//!
//! `MockMemory` is a sparse, byte-accurate address space shared between
//! clones. Bytes never written read as zero; ranges marked unmapped fail
//! every read and write.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{Error, Result};

use super::backend::{BackendKind, BackendOpener, MemoryBackend};
use super::process::{ModuleEntry, ProcessEntry, ProcessLocator, select_module};
use super::reader::ReadMemory;

#[derive(Debug, Default)]
struct Space {
    bytes: HashMap<u64, u8>,
    unmapped: Vec<Range<u64>>,
    writes: usize,
}

impl Space {
    fn check(&self, address: u64, len: usize) -> std::result::Result<(), String> {
        let end = address.saturating_add(len as u64);
        match self
            .unmapped
            .iter()
            .find(|r| address < r.end && r.start < end)
        {
            Some(r) => Err(format!("page {:#x}..{:#x} is not mapped", r.start, r.end)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockMemory {
    space: Arc<Mutex<Space>>,
}

impl MockMemory {
    fn space(&self) -> std::sync::MutexGuard<'_, Space> {
        self.space.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self, address: u64, bytes: &[u8]) -> Result<()> {
        let mut space = self.space();
        space
            .check(address, bytes.len())
            .map_err(|message| Error::MemoryWriteFailed { address, message })?;
        for (i, b) in bytes.iter().enumerate() {
            space.bytes.insert(address + i as u64, *b);
        }
        space.writes += 1;
        Ok(())
    }

    pub fn set_u32(&self, address: u64, value: u32) {
        self.write(address, &value.to_le_bytes())
            .expect("mock write to mapped memory");
    }

    pub fn unmap(&self, range: Range<u64>) {
        self.space().unmapped.push(range);
    }

    pub fn remap_all(&self) {
        self.space().unmapped.clear();
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.space().writes
    }
}

impl ReadMemory for MockMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let space = self.space();
        space
            .check(address, size)
            .map_err(|message| Error::MemoryReadFailed { address, message })?;
        Ok((0..size as u64)
            .map(|i| space.bytes.get(&(address + i)).copied().unwrap_or(0))
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct MockMemoryBuilder {
    memory: MockMemory,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_u32(self, address: u64, value: u32) -> Self {
        self.memory.set_u32(address, value);
        self
    }

    pub fn unmapped(self, range: Range<u64>) -> Self {
        self.memory.unmap(range);
        self
    }

    pub fn build(self) -> MockMemory {
        self.memory
    }
}

#[derive(Debug)]
struct MockBackend {
    memory: MockMemory,
    writable: bool,
    broken_writes: bool,
    fail_close: bool,
    closed: Arc<AtomicUsize>,
}

impl MemoryBackend for MockBackend {
    fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<()> {
        let bytes = self.memory.read_bytes(address, buf.len())?;
        buf.copy_from_slice(&bytes);
        Ok(())
    }

    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
        if !self.writable || self.broken_writes {
            return Err(Error::MemoryWriteFailed {
                address,
                message: "write rejected".to_string(),
            });
        }
        self.memory.write(address, bytes)
    }

    fn supports_write(&self) -> bool {
        self.writable
    }

    fn close(&mut self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(Error::Io(std::io::Error::other("close failed")));
        }
        Ok(())
    }
}

/// Opener handing out backends over a shared `MockMemory`.
#[derive(Debug, Clone)]
pub struct MockOpener {
    memory: MockMemory,
    fail_write_open: bool,
    fail_read_open: bool,
    broken_writer: bool,
    reader_writes: bool,
    fail_close: bool,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    reject_all: Arc<AtomicBool>,
}

impl MockOpener {
    pub fn new(memory: MockMemory) -> Self {
        Self {
            memory,
            fail_write_open: false,
            fail_read_open: false,
            broken_writer: false,
            reader_writes: true,
            fail_close: false,
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
            reject_all: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn fail_open(mut self, kind: BackendKind) -> Self {
        match kind {
            BackendKind::Write => self.fail_write_open = true,
            BackendKind::Read => self.fail_read_open = true,
        }
        self
    }

    /// Writer opens but every write through it fails
    pub fn broken_writer(mut self) -> Self {
        self.broken_writer = true;
        self
    }

    /// Reader exposes no write facility
    pub fn read_only_reader(mut self) -> Self {
        self.reader_writes = false;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Make later opens fail (process exited)
    pub fn reject_all(&self) {
        self.reject_all.store(true, Ordering::SeqCst);
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn memory(&self) -> &MockMemory {
        &self.memory
    }
}

impl BackendOpener for MockOpener {
    fn open(&self, kind: BackendKind, pid: u32) -> Result<Box<dyn MemoryBackend>> {
        let fail = match kind {
            BackendKind::Write => self.fail_write_open,
            BackendKind::Read => self.fail_read_open,
        };
        if fail || self.reject_all.load(Ordering::SeqCst) {
            return Err(Error::ProcessOpenFailed(format!(
                "pid {pid} for {kind} backend: access denied"
            )));
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockBackend {
            memory: self.memory.clone(),
            writable: kind == BackendKind::Write || self.reader_writes,
            broken_writes: kind == BackendKind::Write && self.broken_writer,
            fail_close: self.fail_close,
            closed: Arc::clone(&self.closed),
        }))
    }
}

/// Locator over a process and module list. Clones share the process list,
/// so a test can end a process after handing the locator out.
#[derive(Debug, Clone, Default)]
pub struct MockLocator {
    processes: Arc<Mutex<Vec<ProcessEntry>>>,
    modules: HashMap<u32, Vec<ModuleEntry>>,
}

impl MockLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process(self, pid: u32, name: &str) -> Self {
        self.processes.lock().unwrap().push(ProcessEntry {
            pid,
            name: name.to_string(),
        });
        self
    }

    /// The process exits
    pub fn end_process(&self, pid: u32) {
        self.processes.lock().unwrap().retain(|p| p.pid != pid);
    }

    pub fn with_module(mut self, pid: u32, name: &str, base: u64) -> Self {
        self.modules.entry(pid).or_default().push(ModuleEntry {
            name: name.to_string(),
            base,
        });
        self
    }
}

impl ProcessLocator for MockLocator {
    fn processes(&self) -> Vec<ProcessEntry> {
        self.processes.lock().unwrap().clone()
    }

    fn find_module_base(&self, pid: u32, module: &str) -> u64 {
        self.modules
            .get(&pid)
            .map(|modules| select_module(modules, module))
            .unwrap_or(0)
    }
}
