//! Type tags for the fixed-width codec types.

use std::fmt;

use alloy_primitives::U256;

use super::{Address, Bytes16, Bytes32, Bytes4, Bytes8, Value};
use super::{Uint128, Uint16, Uint256, Uint32, Uint64, Uint8};
use crate::error::ValueError;

const UINT_WIDTHS: [usize; 6] = [8, 16, 32, 64, 128, 256];
const BYTES_WIDTHS: [usize; 4] = [4, 8, 16, 32];

/// A codec type name: `uint8`..`uint256`, `bytes4`/`8`/`16`/`32` or `address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolType {
    /// Unsigned integer of the given bit width.
    Uint(usize),
    /// Fixed byte string of the given byte width.
    Bytes(usize),
    Address,
}

impl SolType {
    /// Parse an ABI type name. Returns `None` for types with no codec
    /// counterpart (`bool`, `int256`, `uint24`, `string`, ...).
    ///
    /// `uint` is accepted as an alias of `uint256`.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if name == "address" {
            return Some(Self::Address);
        }
        if name == "uint" {
            return Some(Self::Uint(256));
        }
        if let Some(bits) = name.strip_prefix("uint") {
            let bits: usize = bits.parse().ok()?;
            return UINT_WIDTHS.contains(&bits).then_some(Self::Uint(bits));
        }
        if let Some(width) = name.strip_prefix("bytes") {
            let width: usize = width.parse().ok()?;
            return BYTES_WIDTHS.contains(&width).then_some(Self::Bytes(width));
        }
        None
    }

    /// Like [`SolType::parse`] but fails with [`ValueError::UnknownType`].
    pub fn from_name(name: &str) -> Result<Self, ValueError> {
        Self::parse(name).ok_or_else(|| ValueError::UnknownType(name.to_string()))
    }

    /// Canonical ABI name, e.g. `"uint256"`.
    pub fn name(&self) -> String {
        match self {
            Self::Uint(bits) => format!("uint{bits}"),
            Self::Bytes(n) => format!("bytes{n}"),
            Self::Address => "address".to_string(),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Uint(_))
    }

    /// Width in bytes.
    pub fn byte_width(&self) -> usize {
        match self {
            Self::Uint(bits) => bits / 8,
            Self::Bytes(n) => *n,
            Self::Address => Address::LEN,
        }
    }

    /// Build an integer value of this type; range checked.
    pub fn from_u256(&self, n: U256) -> Result<Value, ValueError> {
        Ok(match self {
            Self::Uint(8) => Uint8::from_u256(n)?.into(),
            Self::Uint(16) => Uint16::from_u256(n)?.into(),
            Self::Uint(32) => Uint32::from_u256(n)?.into(),
            Self::Uint(64) => Uint64::from_u256(n)?.into(),
            Self::Uint(128) => Uint128::from_u256(n)?.into(),
            Self::Uint(256) => Uint256::from_u256(n)?.into(),
            other => {
                return Err(ValueError::BadInitialType {
                    ty: other.name(),
                    input: format!("integer {n}"),
                })
            }
        })
    }

    /// Build a value of this type from exactly `byte_width()` bytes.
    pub fn from_bytes(&self, bytes: &[u8]) -> Result<Value, ValueError> {
        Ok(match self {
            Self::Uint(8) => Uint8::from_bytes(bytes)?.into(),
            Self::Uint(16) => Uint16::from_bytes(bytes)?.into(),
            Self::Uint(32) => Uint32::from_bytes(bytes)?.into(),
            Self::Uint(64) => Uint64::from_bytes(bytes)?.into(),
            Self::Uint(128) => Uint128::from_bytes(bytes)?.into(),
            Self::Uint(256) => Uint256::from_bytes(bytes)?.into(),
            Self::Bytes(4) => Bytes4::from_bytes(bytes)?.into(),
            Self::Bytes(8) => Bytes8::from_bytes(bytes)?.into(),
            Self::Bytes(16) => Bytes16::from_bytes(bytes)?.into(),
            Self::Bytes(32) => Bytes32::from_bytes(bytes)?.into(),
            Self::Address => Address::from_bytes(bytes)?.into(),
            other => return Err(ValueError::UnknownType(other.name())),
        })
    }

    /// Build a value of this type from a hex string with exactly the
    /// declared number of digits.
    pub fn from_hex(&self, s: &str) -> Result<Value, ValueError> {
        let digits = self.byte_width() * 2;
        let bytes = super::parse_exact_hex(&self.name(), s, digits)?;
        self.from_bytes(&bytes)
    }

    /// Build a value from JSON.
    ///
    /// Integers accept a JSON number or a hex quantity of any length up to
    /// the width; byte types and addresses accept only a full-width hex
    /// string.
    pub fn from_json(&self, json: &serde_json::Value) -> Result<Value, ValueError> {
        match (self, json) {
            (Self::Uint(_), serde_json::Value::Number(n)) => {
                let n = n.as_u64().ok_or_else(|| self.bad_input(json))?;
                self.from_u256(U256::from(n))
            }
            (Self::Uint(_), serde_json::Value::String(s)) => {
                let q = Uint256::from_quantity(s)?;
                self.from_u256(q.as_u256())
            }
            (_, serde_json::Value::String(s)) => self.from_hex(s),
            _ => Err(self.bad_input(json)),
        }
    }

    /// Convert `value` into this type.
    ///
    /// Integer targets go through the numeric form and byte-like targets
    /// through the byte form; every width check still applies, so a
    /// `uint256` holding a large number will not coerce into `uint8` and a
    /// `bytes4` will not coerce into `bytes32`.
    pub fn coerce(&self, value: &Value) -> Result<Value, ValueError> {
        if value.sol_type() == Some(*self) {
            return Ok(value.clone());
        }
        if self.is_integer() {
            let n = value.as_u256().ok_or_else(|| ValueError::BadInitialType {
                ty: self.name(),
                input: value.type_name(),
            })?;
            self.from_u256(n)
        } else {
            let bytes = value.as_bytes().ok_or_else(|| ValueError::BadInitialType {
                ty: self.name(),
                input: value.type_name(),
            })?;
            self.from_bytes(&bytes)
        }
    }

    fn bad_input(&self, json: &serde_json::Value) -> ValueError {
        ValueError::BadInitialType {
            ty: self.name(),
            input: json.to_string(),
        }
    }
}

impl fmt::Display for SolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
