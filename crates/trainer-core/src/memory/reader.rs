use crate::error::{Error, Result};

use super::scalar::{Scalar, ScalarKind};

/// Typed reads on top of a raw byte reader.
pub trait ReadMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    fn read_array<const N: usize>(&self, address: u64) -> Result<[u8; N]> {
        let bytes = self.read_bytes(address, N)?;
        bytes
            .try_into()
            .map_err(|b: Vec<u8>| Error::MemoryReadFailed {
                address,
                message: format!("short read: expected {} bytes, got {}", N, b.len()),
            })
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array(address)?))
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array(address)?))
    }

    fn read_f32(&self, address: u64) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array(address)?))
    }

    /// Read a 32-bit pointer value
    fn read_pointer(&self, address: u64) -> Result<u64> {
        self.read_u32(address).map(u64::from)
    }

    fn read_scalar(&self, address: u64, kind: ScalarKind) -> Result<Scalar> {
        Ok(Scalar::from_le_bytes(kind, self.read_array(address)?))
    }
}
