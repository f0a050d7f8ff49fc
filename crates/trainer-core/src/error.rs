use thiserror::Error;

use crate::memory::BackendKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Failed to attach to process {pid}: write backend: {write}; read backend: {read}")]
    Attach {
        pid: u32,
        write: String,
        read: String,
    },

    #[error("{0} backend is not available")]
    BackendUnavailable(BackendKind),

    #[error("Pointer chain broken at hop {hop} (address {address:#x}): {message}")]
    ChainBroken {
        hop: usize,
        address: u64,
        message: String,
    },

    #[error("No working write backend for address {address:#x}{}", cause_suffix(.cause))]
    NoWriteBackend {
        address: u64,
        cause: Option<String>,
    },

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Failed to write process memory at address {address:#x}: {message}")]
    MemoryWriteFailed { address: u64, message: String },

    #[error("Base address unresolved: {0}")]
    BaseUnresolved(&'static str),

    #[error("{field} value {value} out of range ({min}..={max})")]
    ValueOutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

fn cause_suffix(cause: &Option<String>) -> String {
    cause.as_ref().map(|c| format!(": {c}")).unwrap_or_default()
}

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Errors the caller can recover from by retrying with another offset list.
    pub fn is_chain_broken(&self) -> bool {
        matches!(self, Error::ChainBroken { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.is_not_found());

        let other_io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err2 = Error::Io(other_io_err);
        assert!(!err2.is_not_found());
    }

    #[test]
    fn test_no_write_backend_message() {
        let err = Error::NoWriteBackend {
            address: 0x10,
            cause: None,
        };
        assert_eq!(err.to_string(), "No working write backend for address 0x10");

        let err = Error::NoWriteBackend {
            address: 0x10,
            cause: Some("access denied".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "No working write backend for address 0x10: access denied"
        );
    }

    #[test]
    fn test_attach_keeps_open_failures_apart() {
        let err = Error::Attach {
            pid: 1200,
            write: Error::ProcessOpenFailed("pid 1200: access denied".to_string()).to_string(),
            read: Error::ProcessOpenFailed("pid 1200: invalid parameter".to_string()).to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("write backend: Failed to open process: pid 1200: access denied"));
        assert!(message.contains("read backend: Failed to open process: pid 1200: invalid parameter"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_backend_unavailable_message() {
        let err = Error::BackendUnavailable(BackendKind::Read);
        assert_eq!(err.to_string(), "read backend is not available");
        assert!(!err.is_chain_broken());
    }
}
