//! Stateless hex helpers used by the value codec and the ABI layer.

use crate::error::ValueError;

/// Strip a leading `0x`/`0X` if present.
pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Prefix a digit string with `0x`.
pub fn add_0x(digits: &str) -> String {
    format!("0x{digits}")
}

/// Encode bytes as a `0x`-prefixed lowercase hex string.
pub fn encode_prefixed(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode a hex string (with or without `0x`) into bytes.
///
/// An empty payload (`"0x"`) decodes to an empty vector.
pub fn decode(s: &str) -> Result<Vec<u8>, ValueError> {
    hex::decode(strip_0x(s)).map_err(|e| ValueError::InvalidHex {
        ty: "bytes".into(),
        reason: e.to_string(),
    })
}

/// Hex-encode the UTF-8 bytes of a string (no prefix).
pub fn utf8_to_hex(s: &str) -> String {
    hex::encode(s.as_bytes())
}
