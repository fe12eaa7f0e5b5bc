//! 20-byte account address.

use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{check_byte_len, parse_exact_hex, FixedWidth};
use crate::error::ValueError;

const TYPE_NAME: &str = "address";

/// An account or contract address. Checksummed input is accepted; the
/// canonical form is lowercase.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const LEN: usize = 20;

    /// The zero address (`0x000…0`).
    pub const ZERO: Self = Self([0u8; 20]);

    pub const fn from_array(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ValueError> {
        check_byte_len(TYPE_NAME, bytes, Self::LEN)?;
        let mut out = [0u8; 20];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    /// Build from exactly 40 hex digits, `0x` optional.
    pub fn from_hex(s: &str) -> Result<Self, ValueError> {
        let bytes = parse_exact_hex(TYPE_NAME, s, Self::LEN * 2)?;
        Self::from_bytes(&bytes)
    }

    pub fn as_array(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn as_u256(&self) -> U256 {
        U256::from_be_slice(&self.0)
    }

    pub fn as_str(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl FixedWidth for Address {
    fn type_name(&self) -> String {
        TYPE_NAME.to_string()
    }

    fn as_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl From<alloy_primitives::Address> for Address {
    fn from(a: alloy_primitives::Address) -> Self {
        Self(a.0 .0)
    }
}

impl From<Address> for alloy_primitives::Address {
    fn from(a: Address) -> Self {
        alloy_primitives::Address::from(a.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.as_str())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
