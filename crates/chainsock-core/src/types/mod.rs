//! Fixed-width ABI value types.
//!
//! Every wire value carries its width in its type, so a call can never
//! silently truncate or widen a parameter: width is validated once, at
//! construction.
//!
//! | Type | Width | Ordered | Arithmetic |
//! |------|-------|---------|------------|
//! | [`Uint8`] .. [`Uint256`] | 8..256 bits | yes | checked add/sub/mul |
//! | [`Bytes4`] .. [`Bytes32`] | 4..32 bytes | no | no |
//! | [`Address`] | 20 bytes | no | no |
//!
//! [`Value`] is the dynamic counterpart used when the type is only known at
//! runtime (decoded ABI data, filter predicates); comparing two `Value`s of
//! different declared types fails with [`ValueError::TypeMismatch`].

pub mod address;
pub mod fixed_bytes;
pub mod sol_type;
pub mod uint;
pub mod value;

pub use address::Address;
pub use fixed_bytes::{Bytes16, Bytes32, Bytes4, Bytes8, BytesN};
pub use sol_type::SolType;
pub use uint::{FixedUint, Uint128, Uint16, Uint256, Uint32, Uint64, Uint8};
pub use value::Value;

use crate::error::ValueError;
use crate::hex::strip_0x;
use crate::keccak;

/// Behaviour shared by every fixed-width value.
pub trait FixedWidth {
    /// ABI type name, e.g. `"uint256"`, `"bytes32"`, `"address"`.
    fn type_name(&self) -> String;

    /// Big-endian byte form, exactly the declared width.
    fn as_bytes(&self) -> Vec<u8>;

    /// Canonical zero-padded lowercase hex digits (no prefix).
    fn digits(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// `keccak256` of the byte form.
    fn hash(&self) -> Bytes32 {
        Bytes32::from_array(keccak::keccak256(self.as_bytes()))
    }

    /// Hash combining the declared type name and the content; two values
    /// with identical bytes but different types never share an identity.
    fn identity_hash(&self) -> Bytes32
    where
        Self: Sized,
    {
        keccak::identity_hash(self)
    }
}

/// Decode a hex string whose data portion must be exactly `digits` long.
pub(crate) fn parse_exact_hex(ty: &str, s: &str, digits: usize) -> Result<Vec<u8>, ValueError> {
    let data = strip_0x(s);
    if data.len() != digits {
        return Err(ValueError::Length {
            ty: ty.to_string(),
            expected: digits,
            got: data.len(),
        });
    }
    hex::decode(data).map_err(|e| ValueError::InvalidHex {
        ty: ty.to_string(),
        reason: e.to_string(),
    })
}

/// Check a byte string is exactly `len` bytes long.
pub(crate) fn check_byte_len(ty: &str, bytes: &[u8], len: usize) -> Result<(), ValueError> {
    if bytes.len() != len {
        return Err(ValueError::Length {
            ty: ty.to_string(),
            expected: len * 2,
            got: bytes.len() * 2,
        });
    }
    Ok(())
}
