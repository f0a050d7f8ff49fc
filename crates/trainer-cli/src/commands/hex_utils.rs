//! Address, offset and value parsing.

use anyhow::{Result, bail};
use trainer_core::{Scalar, ScalarKind};

/// Parse a hex address string (with or without 0x prefix).
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let s = s.trim();
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(digits, 16).map_err(|e| anyhow::anyhow!("Invalid hex address {s:?}: {e}"))
}

/// Parse a signed hex offset such as `0x2A8`, `E4` or `-0x10`.
pub fn parse_offset(s: &str) -> Result<i32> {
    let s = s.trim();
    let (negative, magnitude) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let digits = magnitude
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    if digits.starts_with(['-', '+']) {
        bail!("Invalid hex offset {s:?}");
    }
    let value = i64::from_str_radix(digits, 16)
        .map_err(|e| anyhow::anyhow!("Invalid hex offset {s:?}: {e}"))?;
    let value = if negative { -value } else { value };

    i32::try_from(value).map_err(|_| anyhow::anyhow!("Offset {s:?} does not fit in 32 bits"))
}

/// Parse a value for `kind`. Integers accept decimal or 0x-prefixed hex.
pub fn parse_scalar(kind: ScalarKind, s: &str) -> Result<Scalar> {
    let s = s.trim();
    let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"));

    let scalar = match kind {
        ScalarKind::I32 => Scalar::I32(match hex {
            Some(h) => u32::from_str_radix(h, 16)? as i32,
            None => s.parse()?,
        }),
        ScalarKind::U32 => Scalar::U32(match hex {
            Some(h) => u32::from_str_radix(h, 16)?,
            None => s.parse()?,
        }),
        ScalarKind::F32 => {
            let v: f32 = s.parse()?;
            if !v.is_finite() {
                bail!("Float value must be finite, got {s}");
            }
            Scalar::F32(v)
        }
    };
    Ok(scalar)
}

/// Format an address as a hex string with 0x prefix.
pub fn format_hex_address(addr: u64) -> String {
    format!("0x{:X}", addr)
}
