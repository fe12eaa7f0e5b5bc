//! Keccak-256 hashing primitive.
//!
//! Selectors, event topics and value identity hashes are all derived from
//! `keccak256`. For a canonical signature string such as
//! `"transfer(address,uint256)"` the selector is the first four bytes of the
//! digest (`0xa9059cbb`).

use tiny_keccak::{Hasher, Keccak};

use crate::types::{Bytes32, Bytes4, FixedWidth};

/// Hash an arbitrary byte string.
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data.as_ref());
    hasher.finalize(&mut output);
    output
}

/// Hash the concatenation of several byte strings, like Solidity's
/// `keccak256(abi.encodePacked(a, b, ...))` for fixed-width operands.
pub fn keccak256_concat<I, B>(parts: I) -> [u8; 32]
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut hasher = Keccak::v256();
    for part in parts {
        hasher.update(part.as_ref());
    }
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Topic of a canonical signature string, e.g. `"Transfer(address,address,uint256)"`.
pub fn signature_hash(signature: &str) -> Bytes32 {
    Bytes32::from_array(keccak256(signature.as_bytes()))
}

/// Four-byte selector of a canonical function signature.
pub fn selector(signature: &str) -> Bytes4 {
    let digest = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    Bytes4::from_array(out)
}

/// Identity hash of a typed value: `keccak(keccak(type_name) ++ keccak(bytes))`.
pub fn identity_hash<V: FixedWidth>(value: &V) -> Bytes32 {
    let type_hash = keccak256(value.type_name().as_bytes());
    let data_hash = keccak256(value.as_bytes());
    Bytes32::from_array(keccak256_concat([type_hash, data_hash]))
}
