//! Native backends over the Win32 process memory API.
//!
//! The write backend holds a full-access handle and writes straight through
//! `WriteProcessMemory`. The read backend holds a read/query handle with
//! VM operation rights; its writes lift page protection around the call so
//! they still land on read-only pages.

use crate::error::Result;

use super::backend::{BackendKind, BackendOpener, MemoryBackend};

/// Opens native backends for a live process.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeOpener;

#[cfg(target_os = "windows")]
impl BackendOpener for NativeOpener {
    fn open(&self, kind: BackendKind, pid: u32) -> Result<Box<dyn MemoryBackend>> {
        Ok(Box::new(win::NativeBackend::open(kind, pid)?))
    }
}

#[cfg(not(target_os = "windows"))]
impl BackendOpener for NativeOpener {
    fn open(&self, kind: BackendKind, _pid: u32) -> Result<Box<dyn MemoryBackend>> {
        tracing::debug!("Native {} backend is only supported on Windows", kind);
        Err(crate::error::Error::BackendUnavailable(kind))
    }
}

#[cfg(target_os = "windows")]
mod win {
    use std::ffi::c_void;

    use tracing::debug;
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::System::Diagnostics::Debug::{ReadProcessMemory, WriteProcessMemory};
    use windows::Win32::System::Memory::{
        PAGE_EXECUTE_READWRITE, PAGE_PROTECTION_FLAGS, VirtualProtectEx,
    };
    use windows::Win32::System::Threading::{
        OpenProcess, PROCESS_ALL_ACCESS, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION,
        PROCESS_VM_READ, PROCESS_VM_WRITE,
    };

    use crate::error::{Error, Result};
    use crate::memory::backend::{BackendKind, MemoryBackend};

    pub(super) struct NativeBackend {
        handle: HANDLE,
        kind: BackendKind,
        pid: u32,
    }

    // SAFETY: a process handle may be used from any thread; the Win32 memory
    // calls made through it are thread-safe.
    unsafe impl Send for NativeBackend {}
    // SAFETY: see above, no interior state besides the handle value.
    unsafe impl Sync for NativeBackend {}

    impl NativeBackend {
        pub(super) fn open(kind: BackendKind, pid: u32) -> Result<Self> {
            let access = match kind {
                BackendKind::Write => PROCESS_ALL_ACCESS,
                BackendKind::Read => {
                    PROCESS_VM_READ
                        | PROCESS_QUERY_INFORMATION
                        | PROCESS_VM_WRITE
                        | PROCESS_VM_OPERATION
                }
            };

            // SAFETY: OpenProcess has no memory safety preconditions.
            let handle = unsafe { OpenProcess(access, false, pid) }.map_err(|e| {
                Error::ProcessOpenFailed(format!("pid {pid} for {kind} backend: {e}"))
            })?;

            debug!("Opened {} backend for pid {}", kind, pid);
            Ok(Self { handle, kind, pid })
        }

        fn write_unprotected(&self, address: u64, bytes: &[u8]) -> Result<()> {
            let mut old = PAGE_PROTECTION_FLAGS::default();
            // SAFETY: only changes protection of pages in the target process.
            let lifted = unsafe {
                VirtualProtectEx(
                    self.handle,
                    address as usize as *const c_void,
                    bytes.len(),
                    PAGE_EXECUTE_READWRITE,
                    &mut old,
                )
            }
            .is_ok();

            let result = self.write_direct(address, bytes);

            if lifted {
                let mut ignored = PAGE_PROTECTION_FLAGS::default();
                // SAFETY: restores the protection captured above.
                unsafe {
                    let _ = VirtualProtectEx(
                        self.handle,
                        address as usize as *const c_void,
                        bytes.len(),
                        old,
                        &mut ignored,
                    );
                }
            }

            result
        }

        fn write_direct(&self, address: u64, bytes: &[u8]) -> Result<()> {
            let mut written = 0usize;
            // SAFETY: source buffer is valid for bytes.len() bytes.
            unsafe {
                WriteProcessMemory(
                    self.handle,
                    address as usize as *const c_void,
                    bytes.as_ptr().cast(),
                    bytes.len(),
                    Some(&mut written),
                )
            }
            .map_err(|e| Error::MemoryWriteFailed {
                address,
                message: e.to_string(),
            })?;

            if written != bytes.len() {
                return Err(Error::MemoryWriteFailed {
                    address,
                    message: format!("partial write: {} of {} bytes", written, bytes.len()),
                });
            }
            Ok(())
        }
    }

    impl MemoryBackend for NativeBackend {
        fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<()> {
            let mut read = 0usize;
            // SAFETY: destination buffer is valid for buf.len() bytes.
            unsafe {
                ReadProcessMemory(
                    self.handle,
                    address as usize as *const c_void,
                    buf.as_mut_ptr().cast(),
                    buf.len(),
                    Some(&mut read),
                )
            }
            .map_err(|e| Error::MemoryReadFailed {
                address,
                message: e.to_string(),
            })?;

            if read != buf.len() {
                return Err(Error::MemoryReadFailed {
                    address,
                    message: format!("partial read: {} of {} bytes", read, buf.len()),
                });
            }
            Ok(())
        }

        fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
            match self.kind {
                BackendKind::Write => self.write_direct(address, bytes),
                BackendKind::Read => self.write_unprotected(address, bytes),
            }
        }

        fn close(&mut self) -> Result<()> {
            if self.handle.is_invalid() {
                return Ok(());
            }
            let handle = std::mem::take(&mut self.handle);
            debug!("Closing {} backend for pid {}", self.kind, self.pid);
            // SAFETY: handle came from OpenProcess and is closed once.
            unsafe { CloseHandle(handle) }.map_err(|e| {
                Error::Io(std::io::Error::other(format!("CloseHandle: {e}")))
            })
        }
    }

    impl Drop for NativeBackend {
        fn drop(&mut self) {
            let _ = self.close();
        }
    }
}
