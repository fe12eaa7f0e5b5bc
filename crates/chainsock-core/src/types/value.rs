//! Dynamically typed ABI value.

use std::cmp::Ordering;
use std::fmt;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::U256;

use super::{Address, Bytes16, Bytes32, Bytes4, Bytes8, FixedWidth, SolType};
use super::{Uint128, Uint16, Uint256, Uint32, Uint64, Uint8};
use crate::error::ValueError;

/// A decoded or user-supplied ABI value whose type is only known at runtime.
///
/// Codec types get their own variant; everything else the ABI can express
/// (`bool`, `intN`, `string`, `bytes`, odd widths) passes through as
/// [`Value::Other`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Uint8(Uint8),
    Uint16(Uint16),
    Uint32(Uint32),
    Uint64(Uint64),
    Uint128(Uint128),
    Uint256(Uint256),
    Bytes4(Bytes4),
    Bytes8(Bytes8),
    Bytes16(Bytes16),
    Bytes32(Bytes32),
    Address(Address),
    Other(DynSolValue),
}

macro_rules! impl_from {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Value {
                fn from(v: $variant) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from!(Uint8, Uint16, Uint32, Uint64, Uint128, Uint256);
impl_from!(Bytes4, Bytes8, Bytes16, Bytes32, Address);

impl From<DynSolValue> for Value {
    fn from(v: DynSolValue) -> Self {
        Value::Other(v)
    }
}

impl Value {
    /// Codec type of this value, `None` for [`Value::Other`].
    pub fn sol_type(&self) -> Option<SolType> {
        Some(match self {
            Self::Uint8(_) => SolType::Uint(8),
            Self::Uint16(_) => SolType::Uint(16),
            Self::Uint32(_) => SolType::Uint(32),
            Self::Uint64(_) => SolType::Uint(64),
            Self::Uint128(_) => SolType::Uint(128),
            Self::Uint256(_) => SolType::Uint(256),
            Self::Bytes4(_) => SolType::Bytes(4),
            Self::Bytes8(_) => SolType::Bytes(8),
            Self::Bytes16(_) => SolType::Bytes(16),
            Self::Bytes32(_) => SolType::Bytes(32),
            Self::Address(_) => SolType::Address,
            Self::Other(_) => return None,
        })
    }

    /// ABI type name of the value.
    pub fn type_name(&self) -> String {
        match self {
            Self::Other(v) => v
                .sol_type_name()
                .map(|name| name.into_owned())
                .unwrap_or_else(|| "unknown".to_string()),
            codec => codec.fixed().map(|f| f.type_name()).unwrap_or_default(),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Uint8(_)
                | Self::Uint16(_)
                | Self::Uint32(_)
                | Self::Uint64(_)
                | Self::Uint128(_)
                | Self::Uint256(_)
        )
    }

    /// Numeric form. Byte types and addresses read big-endian; passthrough
    /// values only have one when they are unsigned integers.
    pub fn as_u256(&self) -> Option<U256> {
        match self {
            Self::Uint8(v) => Some(v.as_u256()),
            Self::Uint16(v) => Some(v.as_u256()),
            Self::Uint32(v) => Some(v.as_u256()),
            Self::Uint64(v) => Some(v.as_u256()),
            Self::Uint128(v) => Some(v.as_u256()),
            Self::Uint256(v) => Some(v.as_u256()),
            Self::Bytes4(v) => Some(v.as_u256()),
            Self::Bytes8(v) => Some(v.as_u256()),
            Self::Bytes16(v) => Some(v.as_u256()),
            Self::Bytes32(v) => Some(v.as_u256()),
            Self::Address(v) => Some(v.as_u256()),
            Self::Other(DynSolValue::Uint(n, _)) => Some(*n),
            Self::Other(_) => None,
        }
    }

    /// Byte form at the declared width.
    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Self::Other(DynSolValue::FixedBytes(word, size)) => Some(word[..*size].to_vec()),
            Self::Other(DynSolValue::Address(a)) => Some(a.to_vec()),
            Self::Other(_) => None,
            codec => codec.fixed().map(|f| f.as_bytes()),
        }
    }

    /// Equality that refuses to compare values of different types.
    pub fn try_eq(&self, other: &Value) -> Result<bool, ValueError> {
        self.check_same_type(other)?;
        Ok(self == other)
    }

    /// Ordering for integer values of the same type.
    ///
    /// Different types fail with [`ValueError::TypeMismatch`]; byte types,
    /// addresses and non-numeric passthrough values fail with
    /// [`ValueError::Unordered`].
    pub fn try_cmp(&self, other: &Value) -> Result<Ordering, ValueError> {
        self.check_same_type(other)?;
        match (self, other) {
            (Self::Other(DynSolValue::Int(a, _)), Self::Other(DynSolValue::Int(b, _))) => {
                Ok(a.cmp(b))
            }
            (Self::Other(DynSolValue::Uint(a, _)), Self::Other(DynSolValue::Uint(b, _))) => {
                Ok(a.cmp(b))
            }
            (a, b) if a.is_integer() => match (a.as_u256(), b.as_u256()) {
                (Some(x), Some(y)) => Ok(x.cmp(&y)),
                _ => Err(ValueError::Unordered { ty: a.type_name() }),
            },
            (a, _) => Err(ValueError::Unordered { ty: a.type_name() }),
        }
    }

    fn check_same_type(&self, other: &Value) -> Result<(), ValueError> {
        let (left, right) = (self.type_name(), other.type_name());
        if left != right {
            return Err(ValueError::TypeMismatch { left, right });
        }
        Ok(())
    }

    fn fixed(&self) -> Option<&dyn FixedWidth> {
        let fw: &dyn FixedWidth = match self {
            Self::Uint8(v) => v,
            Self::Uint16(v) => v,
            Self::Uint32(v) => v,
            Self::Uint64(v) => v,
            Self::Uint128(v) => v,
            Self::Uint256(v) => v,
            Self::Bytes4(v) => v,
            Self::Bytes8(v) => v,
            Self::Bytes16(v) => v,
            Self::Bytes32(v) => v,
            Self::Address(v) => v,
            Self::Other(_) => return None,
        };
        Some(fw)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(v) => write!(f, "{v:?}"),
            codec => match codec.fixed() {
                Some(fw) => write!(f, "0x{}", fw.digits()),
                None => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u256(n: u64) -> Value {
        Value::from(Uint256::try_from(n).unwrap())
    }

    #[test]
    fn same_type_compares_numerically() {
        assert_eq!(u256(3).try_cmp(&u256(7)).unwrap(), Ordering::Less);
        assert!(u256(7).try_eq(&u256(7)).unwrap());
        assert!(!u256(7).try_eq(&u256(8)).unwrap());
    }

    #[test]
    fn cross_type_comparison_is_an_error() {
        let small = Value::from(Uint8::try_from(7u64).unwrap());
        assert!(matches!(
            small.try_eq(&u256(7)),
            Err(ValueError::TypeMismatch { .. })
        ));
        assert!(matches!(
            small.try_cmp(&u256(7)),
            Err(ValueError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn bytes_are_unordered() {
        let a = Value::from(Bytes4::from_array([0, 0, 0, 1]));
        let b = Value::from(Bytes4::from_array([0, 0, 0, 2]));
        assert!(!a.try_eq(&b).unwrap());
        assert!(matches!(a.try_cmp(&b), Err(ValueError::Unordered { .. })));
    }

    #[test]
    fn passthrough_values() {
        let t = Value::from(DynSolValue::Bool(true));
        assert_eq!(t.type_name(), "bool");
        assert_eq!(t.sol_type(), None);
        assert!(t.try_eq(&Value::from(DynSolValue::Bool(true))).unwrap());
        assert!(t.try_eq(&u256(1)).is_err());
        assert!(t.as_u256().is_none());
    }

    #[test]
    fn display_is_full_width_hex() {
        let v = Value::from(Uint16::try_from(1u64).unwrap());
        assert_eq!(v.to_string(), "0x0001");
        assert_eq!(v.type_name(), "uint16");
        assert_eq!(v.as_bytes(), Some(vec![0, 1]));
    }
}
