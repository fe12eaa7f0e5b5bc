//! Unsigned integers of a fixed bit width (`uint8` .. `uint256`).

use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{check_byte_len, parse_exact_hex, FixedWidth};
use crate::error::ValueError;
use crate::hex::strip_0x;

/// An unsigned integer that always fits in `BITS` bits.
///
/// Equality and ordering compare the numeric value. Arithmetic is checked
/// and returns a value of the same width, or an error instead of wrapping.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FixedUint<const BITS: usize> {
    value: U256,
}

pub type Uint8 = FixedUint<8>;
pub type Uint16 = FixedUint<16>;
pub type Uint32 = FixedUint<32>;
pub type Uint64 = FixedUint<64>;
pub type Uint128 = FixedUint<128>;
pub type Uint256 = FixedUint<256>;

impl<const BITS: usize> FixedUint<BITS> {
    const WIDTH_OK: () = assert!(
        BITS > 0 && BITS <= 256 && BITS % 8 == 0,
        "uint width must be a multiple of 8 in 8..=256"
    );

    /// Number of hex digits in the canonical form.
    pub const DIGITS: usize = BITS / 4;

    /// The zero value.
    pub const ZERO: Self = Self { value: U256::ZERO };

    /// ABI type name, e.g. `"uint64"`.
    pub fn type_name() -> String {
        format!("uint{BITS}")
    }

    /// Build from a 256-bit integer, failing if it exceeds `BITS` bits.
    pub fn from_u256(value: U256) -> Result<Self, ValueError> {
        #[allow(clippy::let_unit_value)]
        let () = Self::WIDTH_OK;
        if value.bit_len() > BITS {
            return Err(ValueError::Range {
                ty: Self::type_name(),
                bits: BITS,
                value: value.to_string(),
            });
        }
        Ok(Self { value })
    }

    /// Build from a hex string whose data portion is exactly `BITS / 4` digits.
    pub fn from_hex(s: &str) -> Result<Self, ValueError> {
        let bytes = parse_exact_hex(&Self::type_name(), s, Self::DIGITS)?;
        Self::from_u256(U256::from_be_slice(&bytes))
    }

    /// Build from a JSON-RPC quantity (`"0x1a"`): variable length, range checked.
    pub fn from_quantity(s: &str) -> Result<Self, ValueError> {
        let digits = strip_0x(s);
        if digits.is_empty() {
            return Err(ValueError::Length {
                ty: Self::type_name(),
                expected: Self::DIGITS,
                got: 0,
            });
        }
        let value = U256::from_str_radix(digits, 16).map_err(|e| ValueError::InvalidHex {
            ty: Self::type_name(),
            reason: e.to_string(),
        })?;
        Self::from_u256(value)
    }

    /// Build from exactly `BITS / 8` big-endian bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ValueError> {
        check_byte_len(&Self::type_name(), bytes, BITS / 8)?;
        Self::from_u256(U256::from_be_slice(bytes))
    }

    /// Numeric form.
    pub fn as_u256(&self) -> U256 {
        self.value
    }

    /// Numeric form narrowed to `u64`, if it fits.
    pub fn as_u64(&self) -> Option<u64> {
        u64::try_from(self.value).ok()
    }

    /// Big-endian byte form, exactly `BITS / 8` bytes.
    pub fn as_bytes(&self) -> Vec<u8> {
        let full: [u8; 32] = self.value.to_be_bytes();
        full[32 - BITS / 8..].to_vec()
    }

    /// `0x`-prefixed canonical form, zero-padded to the full width.
    pub fn as_str(&self) -> String {
        format!("0x{}", hex::encode(self.as_bytes()))
    }

    /// Minimal JSON-RPC quantity form (`"0x0"`, `"0x1a"`).
    pub fn to_quantity(&self) -> String {
        format!("0x{:x}", self.value)
    }

    pub fn checked_add(&self, other: &Self) -> Result<Self, ValueError> {
        let sum = self.value.checked_add(other.value).ok_or_else(|| self.overflow("add"))?;
        Self::from_u256(sum)
    }

    /// `self - other`; a negative result is an error.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, ValueError> {
        let diff = self
            .value
            .checked_sub(other.value)
            .ok_or_else(|| ValueError::Negative {
                ty: Self::type_name(),
            })?;
        Self::from_u256(diff)
    }

    pub fn checked_mul(&self, other: &Self) -> Result<Self, ValueError> {
        let product = self.value.checked_mul(other.value).ok_or_else(|| self.overflow("mul"))?;
        Self::from_u256(product)
    }

    fn overflow(&self, op: &str) -> ValueError {
        ValueError::Range {
            ty: Self::type_name(),
            bits: BITS,
            value: format!("{} {op} overflow", self.value),
        }
    }
}

impl<const BITS: usize> FixedWidth for FixedUint<BITS> {
    fn type_name(&self) -> String {
        Self::type_name()
    }

    fn as_bytes(&self) -> Vec<u8> {
        FixedUint::as_bytes(self)
    }
}

impl<const BITS: usize> TryFrom<u64> for FixedUint<BITS> {
    type Error = ValueError;

    fn try_from(n: u64) -> Result<Self, Self::Error> {
        Self::from_u256(U256::from(n))
    }
}

impl<const BITS: usize> TryFrom<u128> for FixedUint<BITS> {
    type Error = ValueError;

    fn try_from(n: u128) -> Result<Self, Self::Error> {
        Self::from_u256(U256::from(n))
    }
}

impl<const BITS: usize> TryFrom<i128> for FixedUint<BITS> {
    type Error = ValueError;

    fn try_from(n: i128) -> Result<Self, Self::Error> {
        if n < 0 {
            return Err(ValueError::Negative {
                ty: Self::type_name(),
            });
        }
        Self::from_u256(U256::from(n as u128))
    }
}

impl<const BITS: usize> fmt::Display for FixedUint<BITS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl<const BITS: usize> fmt::Debug for FixedUint<BITS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uint{BITS}({})", self.value)
    }
}

impl<const BITS: usize> Serialize for FixedUint<BITS> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_quantity())
    }
}

impl<'de, const BITS: usize> Deserialize<'de> for FixedUint<BITS> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Quantity {
            Hex(String),
            Number(u64),
        }

        match Quantity::deserialize(deserializer)? {
            Quantity::Hex(s) => Self::from_quantity(&s),
            Quantity::Number(n) => Self::try_from(n),
        }
        .map_err(serde::de::Error::custom)
    }
}
