//! Process discovery and module base lookup.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// A running process as seen in the system process list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
}

/// A module loaded in a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub name: String,
    pub base: u64,
}

/// An attached process and the bases resolved for it.
///
/// A zero base is "unresolved": no address may be derived from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessHandle {
    pub process_id: u32,
    /// Load address of the executable image
    pub image_base: u64,
    /// Load address of the configured module (0 when none is configured)
    pub module_base: u64,
}

impl ProcessHandle {
    pub fn is_active(&self) -> bool {
        self.process_id != 0 && self.image_base != 0
    }
}

/// Pick the process matching `name` (case-insensitive, exact).
///
/// When several processes share the name the first one in enumeration
/// order wins.
pub fn select_process(processes: &[ProcessEntry], name: &str) -> Option<u32> {
    processes
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .map(|p| p.pid)
}

/// Base of the first module matching `name` (case-insensitive), or 0.
pub fn select_module(modules: &[ModuleEntry], name: &str) -> u64 {
    modules
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
        .map(|m| m.base)
        .unwrap_or(0)
}

pub trait ProcessLocator: Send + Sync {
    /// Snapshot of running processes
    fn processes(&self) -> Vec<ProcessEntry>;

    /// Base of `module` inside `pid`, or 0 on any failure.
    fn find_module_base(&self, pid: u32, module: &str) -> u64;

    fn find_process_id(&self, name: &str) -> Result<u32> {
        let processes = self.processes();
        debug!("Scanning {} processes for {}", processes.len(), name);
        select_process(&processes, name).ok_or_else(|| Error::ProcessNotFound(name.to_string()))
    }
}

/// Locator backed by the operating system process list.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessLocator;

#[cfg(target_os = "windows")]
impl ProcessLocator for SystemProcessLocator {
    fn processes(&self) -> Vec<ProcessEntry> {
        match win::enumerate_processes() {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Failed to enumerate processes: {}", e);
                Vec::new()
            }
        }
    }

    fn find_module_base(&self, pid: u32, module: &str) -> u64 {
        match win::enumerate_modules(pid) {
            Ok(modules) => select_module(&modules, module),
            Err(e) => {
                debug!("Failed to enumerate modules of pid {}: {}", pid, e);
                0
            }
        }
    }
}

#[cfg(not(target_os = "windows"))]
impl ProcessLocator for SystemProcessLocator {
    fn processes(&self) -> Vec<ProcessEntry> {
        debug!("Process enumeration is only supported on Windows");
        Vec::new()
    }

    fn find_module_base(&self, _pid: u32, _module: &str) -> u64 {
        0
    }
}

#[cfg(target_os = "windows")]
mod win {
    use windows::Win32::Foundation::{CloseHandle, HANDLE, HMODULE};
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW,
        TH32CS_SNAPPROCESS,
    };
    use windows::Win32::System::ProcessStatus::{
        EnumProcessModulesEx, GetModuleBaseNameW, LIST_MODULES_ALL,
    };
    use windows::Win32::System::Threading::{
        OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
    };

    use super::{ModuleEntry, ProcessEntry};

    /// Closes the wrapped handle when dropped.
    struct ScopedHandle(HANDLE);

    impl Drop for ScopedHandle {
        fn drop(&mut self) {
            // SAFETY: the handle was returned by a successful Win32 call and is
            // closed exactly once here.
            unsafe {
                let _ = CloseHandle(self.0);
            }
        }
    }

    fn wide_to_string(wide: &[u16]) -> String {
        let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
        String::from_utf16_lossy(&wide[..len])
    }

    pub(super) fn enumerate_processes() -> windows::core::Result<Vec<ProcessEntry>> {
        // SAFETY: snapshot of all processes, closed by ScopedHandle.
        let snapshot = ScopedHandle(unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)? });

        let mut entry = PROCESSENTRY32W {
            dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };
        let mut processes = Vec::new();

        // SAFETY: entry.dwSize is initialized as the API requires.
        let mut next = unsafe { Process32FirstW(snapshot.0, &mut entry) };
        while next.is_ok() {
            processes.push(ProcessEntry {
                pid: entry.th32ProcessID,
                name: wide_to_string(&entry.szExeFile),
            });
            // SAFETY: same entry buffer, same snapshot.
            next = unsafe { Process32NextW(snapshot.0, &mut entry) };
        }

        Ok(processes)
    }

    pub(super) fn enumerate_modules(pid: u32) -> windows::core::Result<Vec<ModuleEntry>> {
        // SAFETY: query + read access only, closed by ScopedHandle on every path.
        let process = ScopedHandle(unsafe {
            OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, pid)?
        });

        let mut handles = vec![HMODULE::default(); 1024];
        let mut needed = 0u32;
        // SAFETY: the buffer size passed matches the allocation in bytes.
        unsafe {
            EnumProcessModulesEx(
                process.0,
                handles.as_mut_ptr(),
                (handles.len() * std::mem::size_of::<HMODULE>()) as u32,
                &mut needed,
                LIST_MODULES_ALL,
            )?;
        }
        let count = (needed as usize / std::mem::size_of::<HMODULE>()).min(handles.len());

        let mut modules = Vec::with_capacity(count);
        let mut name = [0u16; 260];
        for module in &handles[..count] {
            // SAFETY: module handles come from EnumProcessModulesEx on the same process.
            let len = unsafe { GetModuleBaseNameW(process.0, *module, &mut name) } as usize;
            if len == 0 {
                continue;
            }
            modules.push(ModuleEntry {
                name: String::from_utf16_lossy(&name[..len]),
                base: module.0 as usize as u64,
            });
        }

        Ok(modules)
    }
}
