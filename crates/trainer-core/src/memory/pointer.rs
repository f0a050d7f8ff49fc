//! Multi-level pointer chains over a 32-bit address space.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::reader::ReadMemory;

/// Ordered signed offsets applied through successive 4-byte dereferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointerChain(Vec<i32>);

impl PointerChain {
    pub fn new(offsets: impl Into<Vec<i32>>) -> Self {
        Self(offsets.into())
    }

    pub fn offsets(&self) -> &[i32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// First offset of the chain, if any
    pub fn first(&self) -> Option<i32> {
        self.0.first().copied()
    }
}

impl FromIterator<i32> for PointerChain {
    fn from_iter<T: IntoIterator<Item = i32>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for PointerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, off) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if *off < 0 {
                write!(f, "-{:#X}", off.unsigned_abs())?;
            } else {
                write!(f, "{:#X}", off)?;
            }
        }
        write!(f, "]")
    }
}

/// A chain anchored at a fixed offset from a module base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPath {
    pub base_offset: u64,
    pub chain: PointerChain,
}

impl PointerPath {
    pub fn new(base_offset: u64, chain: impl Into<Vec<i32>>) -> Self {
        Self {
            base_offset,
            chain: PointerChain::new(chain),
        }
    }
}

/// Resolve `chain` starting at `base`.
///
/// Each step reads a 4-byte pointer at the current address. A zero pointer
/// means the node is not allocated yet: the offset is applied to the current
/// address instead of the pointer. Any failed read aborts the resolution.
pub fn resolve_pointer_chain<R: ReadMemory + ?Sized>(
    reader: &R,
    base: u64,
    chain: &PointerChain,
) -> Result<u64> {
    let mut cur = base;

    for (hop, &offset) in chain.offsets().iter().enumerate() {
        let value = reader
            .read_pointer(cur)
            .map_err(|e| Error::ChainBroken {
                hop,
                address: cur,
                message: e.to_string(),
            })?;

        let next_base = if value == 0 { cur } else { value };
        let next = next_base.wrapping_add_signed(i64::from(offset));
        debug!(
            "hop {}: [{:#x}] = {:#x}, offset {:+} -> {:#x}",
            hop, cur, value, offset, next
        );
        cur = next;
    }

    Ok(cur)
}
