//! Fixed-width scalar values as they are laid out in target memory.
//!
//! Every supported width is 4 bytes, little-endian. Integers are two's
//! complement, floats are IEEE-754 binary32.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Width and interpretation of a scalar read or write.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    I32,
    U32,
    F32,
}

/// A typed scalar value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    I32(i32),
    U32(u32),
    F32(f32),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::I32(_) => ScalarKind::I32,
            Self::U32(_) => ScalarKind::U32,
            Self::F32(_) => ScalarKind::F32,
        }
    }

    /// Encode into the exact bytes written to target memory.
    pub fn to_le_bytes(&self) -> [u8; 4] {
        match *self {
            Self::I32(v) => v.to_le_bytes(),
            Self::U32(v) => v.to_le_bytes(),
            Self::F32(v) => v.to_le_bytes(),
        }
    }

    /// Decode bytes read from target memory.
    pub fn from_le_bytes(kind: ScalarKind, bytes: [u8; 4]) -> Self {
        match kind {
            ScalarKind::I32 => Self::I32(i32::from_le_bytes(bytes)),
            ScalarKind::U32 => Self::U32(u32::from_le_bytes(bytes)),
            ScalarKind::F32 => Self::F32(f32::from_le_bytes(bytes)),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I32(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v:.2}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_encoding_is_stable() {
        // 100.0f32 == 0x42C80000
        let bytes = Scalar::F32(100.0).to_le_bytes();
        assert_eq!(bytes, [0x00, 0x00, 0xC8, 0x42]);
        assert_eq!(Scalar::F32("100.00".parse().unwrap()).to_le_bytes(), bytes);
    }

    #[test]
    fn test_signed_encoding_is_twos_complement() {
        assert_eq!(Scalar::I32(-1).to_le_bytes(), [0xFF; 4]);
        assert_eq!(
            Scalar::from_le_bytes(ScalarKind::U32, [0xFF; 4]),
            Scalar::U32(u32::MAX)
        );
        assert_eq!(Scalar::I32(100_000_000).to_le_bytes(), 100_000_000u32.to_le_bytes());
    }

    #[test]
    fn test_kind_parse_and_display() {
        assert_eq!("f32".parse::<ScalarKind>().unwrap(), ScalarKind::F32);
        assert_eq!("U32".parse::<ScalarKind>().unwrap(), ScalarKind::U32);
        assert!("i64".parse::<ScalarKind>().is_err());
        assert_eq!(ScalarKind::I32.to_string(), "i32");
        assert_eq!(Scalar::F32(100.0).kind(), ScalarKind::F32);
    }

    #[test]
    fn test_display() {
        assert_eq!(Scalar::F32(100.0).to_string(), "100.00");
        assert_eq!(Scalar::I32(-5).to_string(), "-5");
    }
}
