//! Stable 64-bit asset identifiers.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Opaque identifier of one asset. Persisted in packages and the UUID cache
/// so it survives across runs.
///
/// Zero is reserved as [`AssetUuid::NONE`]; generated values are never zero.
/// Serialized as a plain JSON number.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AssetUuid(u64);

impl AssetUuid {
    /// "No asset".
    pub const NONE: AssetUuid = AssetUuid(0);

    /// Draw a fresh random identifier.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let value: u64 = rng.gen();
            if value != 0 {
                return Self(value);
            }
        }
    }

    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn to_raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for AssetUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for AssetUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetUuid({:016x})", self.0)
    }
}

impl FromStr for AssetUuid {
    type Err = std::num::ParseIntError;

    /// Parses the hex form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16).map(Self)
    }
}

impl From<u64> for AssetUuid {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
