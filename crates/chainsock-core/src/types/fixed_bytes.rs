//! Fixed-length byte strings (`bytes4` .. `bytes32`).

use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{check_byte_len, parse_exact_hex, FixedWidth};
use crate::error::ValueError;

/// Exactly `N` bytes. Supports equality only; there is no ordering or
/// arithmetic on byte strings.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BytesN<const N: usize>([u8; N]);

pub type Bytes4 = BytesN<4>;
pub type Bytes8 = BytesN<8>;
pub type Bytes16 = BytesN<16>;
pub type Bytes32 = BytesN<32>;

impl<const N: usize> BytesN<N> {
    const WIDTH_OK: () = assert!(N > 0 && N <= 32, "bytesN width must be in 1..=32");

    /// ABI type name, e.g. `"bytes32"`.
    pub fn type_name() -> String {
        format!("bytes{N}")
    }

    pub const fn from_array(bytes: [u8; N]) -> Self {
        Self(bytes)
    }

    /// Build from exactly `N` bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ValueError> {
        #[allow(clippy::let_unit_value)]
        let () = Self::WIDTH_OK;
        check_byte_len(&Self::type_name(), bytes, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    /// Build from a hex string whose data portion is exactly `2 * N` digits.
    pub fn from_hex(s: &str) -> Result<Self, ValueError> {
        let bytes = parse_exact_hex(&Self::type_name(), s, N * 2)?;
        Self::from_bytes(&bytes)
    }

    pub fn as_array(&self) -> &[u8; N] {
        &self.0
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Big-endian numeric interpretation.
    pub fn as_u256(&self) -> U256 {
        U256::from_be_slice(&self.0)
    }

    /// `0x`-prefixed canonical form.
    pub fn as_str(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl<const N: usize> FixedWidth for BytesN<N> {
    fn type_name(&self) -> String {
        Self::type_name()
    }

    fn as_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl<const N: usize> AsRef<[u8]> for BytesN<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> fmt::Display for BytesN<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl<const N: usize> fmt::Debug for BytesN<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes{N}({})", self.as_str())
    }
}

impl<const N: usize> Serialize for BytesN<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str())
    }
}

impl<'de, const N: usize> Deserialize<'de> for BytesN<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
