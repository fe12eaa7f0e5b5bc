//! Bridges declared parameter types, codec [`Value`]s and the positional
//! encoding in `alloy-dyn-abi`.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::B256;
use chainsock_core::{SolType, Value};

use crate::entry::AbiParam;
use crate::error::AbiError;

/// A resolved parameter: its name, canonical type string and the codec
/// type, if the declared type has one.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    /// Canonical type name used in signatures (`uint` becomes `uint256`).
    pub ty: String,
    pub indexed: bool,
    pub(crate) dyn_ty: DynSolType,
    pub(crate) sol: Option<SolType>,
}

impl Param {
    /// Resolve a raw parameter. `context` names the owning entry in errors.
    pub fn resolve(param: &AbiParam, context: &str) -> Result<Self, AbiError> {
        let ty = canonical_type(&param.ty);
        if param.components.is_some()
            || ty.contains('[')
            || ty.starts_with("tuple")
            || ty.starts_with('(')
        {
            return Err(AbiError::UnsupportedType {
                ty,
                context: context.to_string(),
            });
        }
        let dyn_ty: DynSolType = ty.parse().map_err(|e: alloy_dyn_abi::Error| {
            AbiError::InvalidType {
                ty: ty.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            name: param.name.clone(),
            sol: SolType::parse(&ty),
            ty,
            indexed: param.indexed,
            dyn_ty,
        })
    }

    /// Codec type, `None` for passthrough types like `bool` or `string`.
    pub fn sol_type(&self) -> Option<SolType> {
        self.sol
    }

    /// `string` and `bytes` are hashed when indexed.
    pub fn is_dynamic(&self) -> bool {
        matches!(self.dyn_ty, DynSolType::String | DynSolType::Bytes)
    }

    /// Convert a caller-supplied value for encoding; `None` if it does not
    /// match the declared type.
    pub(crate) fn to_dyn(&self, value: &Value) -> Option<DynSolValue> {
        match (self.sol, value) {
            (Some(sol), v) if v.sol_type() == Some(sol) => Some(match v {
                Value::Address(a) => DynSolValue::Address((*a).into()),
                v if v.is_integer() => DynSolValue::Uint(v.as_u256()?, sol.byte_width() * 8),
                v => {
                    let bytes = v.as_bytes()?;
                    let mut word = [0u8; 32];
                    word[..bytes.len()].copy_from_slice(&bytes);
                    DynSolValue::FixedBytes(B256::from(word), bytes.len())
                }
            }),
            (None, Value::Other(v)) if self.dyn_ty.matches(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Apply the codec constructor to a decoded value, or pass it through.
    pub(crate) fn from_dyn(&self, value: DynSolValue) -> Result<Value, AbiError> {
        let Some(sol) = self.sol else {
            return Ok(Value::Other(value));
        };
        match value {
            DynSolValue::Uint(n, _) => Ok(sol.from_u256(n)?),
            DynSolValue::FixedBytes(word, size) => Ok(sol.from_bytes(&word[..size])?),
            DynSolValue::Address(a) => Ok(Value::Address(a.into())),
            other => Err(AbiError::Decode {
                reason: format!("{}: unexpected decoded value {other:?}", self.ty),
            }),
        }
    }
}

/// `uint` → `uint256`, `int` → `int256`; everything else unchanged.
pub fn canonical_type(ty: &str) -> String {
    match ty.trim() {
        "uint" => "uint256".to_string(),
        "int" => "int256".to_string(),
        other => other.to_string(),
    }
}

/// `name(t1,t2,...)` over canonical types.
pub fn signature(name: &str, params: &[Param]) -> String {
    let types: Vec<&str> = params.iter().map(|p| p.ty.as_str()).collect();
    format!("{name}({})", types.join(","))
}

pub(crate) fn resolve_all(params: &[AbiParam], context: &str) -> Result<Vec<Param>, AbiError> {
    params.iter().map(|p| Param::resolve(p, context)).collect()
}

/// Positional encoding of `values` against `params`.
pub(crate) fn encode_params(
    context: &str,
    params: &[Param],
    values: &[Value],
) -> Result<Vec<u8>, AbiError> {
    if params.len() != values.len() {
        return Err(AbiError::ArgumentCount {
            function: context.to_string(),
            expected: params.len(),
            got: values.len(),
        });
    }
    let tokens = params
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (param, value))| {
            param.to_dyn(value).ok_or_else(|| AbiError::ArgumentType {
                function: context.to_string(),
                index,
                name: param.name.clone(),
                expected: param.ty.clone(),
                got: value.type_name(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    Ok(DynSolValue::Tuple(tokens).abi_encode_params())
}

/// Positional decoding of `data` against `params`.
pub(crate) fn decode_params(params: &[Param], data: &[u8]) -> Result<Vec<Value>, AbiError> {
    if params.is_empty() {
        return Ok(Vec::new());
    }
    let tuple = DynSolType::Tuple(params.iter().map(|p| p.dyn_ty.clone()).collect());
    let decoded = tuple
        .abi_decode_params(data)
        .map_err(|e| AbiError::Decode {
            reason: e.to_string(),
        })?;
    let values = match decoded {
        DynSolValue::Tuple(vals) => vals,
        other => vec![other],
    };
    params
        .iter()
        .zip(values)
        .map(|(param, value)| param.from_dyn(value))
        .collect()
}

/// Name used for a parameter in decoded maps; unnamed ones become `argN`.
pub(crate) fn field_name(param: &Param, index: usize) -> String {
    if param.name.is_empty() {
        format!("arg{index}")
    } else {
        param.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainsock_core::{Address, Uint256, Uint8};

    fn param(ty: &str) -> Param {
        Param::resolve(&AbiParam::new("x", ty), "test").unwrap()
    }

    #[test]
    fn uint_alias_is_canonicalised() {
        let p = param("uint");
        assert_eq!(p.ty, "uint256");
        assert_eq!(p.sol_type(), Some(SolType::Uint(256)));
        assert_eq!(param("int").ty, "int256");
    }

    #[test]
    fn arrays_and_tuples_are_rejected() {
        for ty in ["uint256[]", "address[2]", "tuple", "(uint256,bool)"] {
            let res = Param::resolve(&AbiParam::new("x", ty), "f");
            assert!(matches!(res, Err(AbiError::UnsupportedType { .. })), "{ty}");
        }
    }

    #[test]
    fn passthrough_types_have_no_codec() {
        assert_eq!(param("bool").sol_type(), None);
        assert_eq!(param("uint24").sol_type(), None);
        assert!(param("string").is_dynamic());
        assert!(!param("bytes32").is_dynamic());
    }

    #[test]
    fn codec_params_require_exact_variant() {
        let p = param("uint256");
        let ok = Value::from(Uint256::try_from(1u64).unwrap());
        let narrow = Value::from(Uint8::try_from(1u64).unwrap());
        assert!(p.to_dyn(&ok).is_some());
        assert!(p.to_dyn(&narrow).is_none());
        assert!(p.to_dyn(&Value::Other(DynSolValue::Bool(true))).is_none());

        let b = param("bool");
        assert!(b.to_dyn(&Value::Other(DynSolValue::Bool(true))).is_some());
        assert!(b.to_dyn(&Value::from(Address::ZERO)).is_none());
    }

    #[test]
    fn encode_decode_static_params() {
        let params = vec![param("address"), param("uint256")];
        let addr = Address::from_array([0xaa; 20]);
        let amount = Uint256::try_from(1_000_000u64).unwrap();
        let data = encode_params("f", &params, &[addr.into(), amount.into()]).unwrap();
        assert_eq!(data.len(), 64);
        let back = decode_params(&params, &data).unwrap();
        assert_eq!(back, vec![Value::from(addr), Value::from(amount)]);
    }
}
