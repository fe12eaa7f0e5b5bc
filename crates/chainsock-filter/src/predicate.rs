//! Predicates an event log must satisfy before its handler fires.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chainsock_abi::{AbiEvent, DecodedEvent};
use chainsock_core::{Address, Log, SolType, Uint256, Value, ValueError};
use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Comparison applied between a field value and a reference value.
///
/// Every operator is strict about types: comparing values of different
/// declared types is an error, and ordering operators fail on byte and
/// address types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
    Ne,
}

impl CompareOp {
    pub const ALL: [CompareOp; 6] = [Self::Eq, Self::Gt, Self::Lt, Self::Ge, Self::Le, Self::Ne];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Ge => "ge",
            Self::Le => "le",
            Self::Ne => "ne",
        }
    }

    /// Evaluate `lhs <op> rhs`.
    pub fn apply(&self, lhs: &Value, rhs: &Value) -> Result<bool, ValueError> {
        match self {
            Self::Eq => lhs.try_eq(rhs),
            Self::Ne => Ok(!lhs.try_eq(rhs)?),
            Self::Gt => Ok(lhs.try_cmp(rhs)? == Ordering::Greater),
            Self::Lt => Ok(lhs.try_cmp(rhs)? == Ordering::Less),
            Self::Ge => Ok(Self::Gt.apply(lhs, rhs)? || lhs.try_eq(rhs)?),
            Self::Le => Ok(Self::Lt.apply(lhs, rhs)? || lhs.try_eq(rhs)?),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompareOp {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| FilterError::Other(format!("unknown operator '{s}'")))
    }
}

/// `field <op> rvalue`, with the field coerced to `ty` first.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPredicate {
    pub name: String,
    pub ty: SolType,
    pub op: CompareOp,
    pub rvalue: Value,
}

impl FieldPredicate {
    /// Build a predicate, coercing `rvalue` into `ty`.
    pub fn new(
        name: impl Into<String>,
        ty: SolType,
        op: CompareOp,
        rvalue: impl Into<Value>,
    ) -> Result<Self, FilterError> {
        let rvalue = ty.coerce(&rvalue.into())?;
        Ok(Self {
            name: name.into(),
            ty,
            op,
            rvalue,
        })
    }

    /// Build a predicate from its textual parts, e.g. `("value", "uint256",
    /// "gt", 1000)`. Integers accept a JSON number or a quantity string;
    /// other types take a full-width hex string.
    pub fn parse(
        name: &str,
        ty: &str,
        op: &str,
        rvalue: &serde_json::Value,
    ) -> Result<Self, FilterError> {
        let ty = SolType::from_name(ty)?;
        Ok(Self {
            name: name.to_string(),
            ty,
            op: op.parse()?,
            rvalue: ty.from_json(rvalue)?,
        })
    }

    pub fn test(&self, event: &DecodedEvent) -> Result<bool, FilterError> {
        let field = event.get(&self.name).ok_or_else(|| FilterError::UnknownField {
            event: event.name.clone(),
            field: self.name.clone(),
        })?;
        let lvalue = self.ty.coerce(field)?;
        Ok(self.op.apply(&lvalue, &self.rvalue)?)
    }
}

/// `log.blockNumber <op> rvalue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPredicate {
    pub op: CompareOp,
    pub rvalue: Uint256,
}

impl BlockPredicate {
    pub fn new(op: CompareOp, rvalue: Uint256) -> Self {
        Self { op, rvalue }
    }

    pub fn test(&self, log: &Log) -> Result<bool, FilterError> {
        let number = log.block_number.ok_or_else(|| FilterError::Missing {
            kind: "block number",
            id: "log".into(),
        })?;
        Ok(self
            .op
            .apply(&Value::Uint256(number), &Value::Uint256(self.rvalue))?)
    }
}

/// Conditions attached to an event registration. All must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub fields: Vec<FieldPredicate>,
    pub address: Option<Address>,
    pub block_number: Option<BlockPredicate>,
}

impl EventFilter {
    /// A filter that accepts every decoded log.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, predicate: FieldPredicate) -> Self {
        self.fields.push(predicate);
        self
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn block_number(mut self, op: CompareOp, rvalue: Uint256) -> Self {
        self.block_number = Some(BlockPredicate::new(op, rvalue));
        self
    }

    /// Check every field predicate names a field of `event`.
    pub fn validate(&self, event: &AbiEvent) -> Result<(), FilterError> {
        match self.fields.iter().find(|p| event.field(&p.name).is_none()) {
            Some(p) => Err(FilterError::UnknownField {
                event: event.name().to_string(),
                field: p.name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Field predicates first, then the emitter address, then the block
    /// number. Stops at the first predicate that fails or errors.
    pub fn test(&self, event: &DecodedEvent, log: &Log) -> Result<bool, FilterError> {
        for predicate in &self.fields {
            if !predicate.test(event)? {
                return Ok(false);
            }
        }
        if let Some(address) = self.address {
            if log.address != address {
                return Ok(false);
            }
        }
        match &self.block_number {
            Some(predicate) => predicate.test(log),
            None => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainsock_core::{Bytes32, Uint64, Uint8};
    use serde_json::json;

    fn u64v(n: u64) -> Value {
        Value::Uint64(Uint64::try_from(n).unwrap())
    }

    #[test]
    fn operators_at_equal_operands() {
        let a = u64v(7);
        let expected = [
            (CompareOp::Eq, true),
            (CompareOp::Gt, false),
            (CompareOp::Lt, false),
            (CompareOp::Ge, true),
            (CompareOp::Le, true),
            (CompareOp::Ne, false),
        ];
        for (op, want) in expected {
            assert_eq!(op.apply(&a, &a.clone()).unwrap(), want, "{op}(a, a)");
        }
    }

    #[test]
    fn lt_is_strict() {
        assert!(CompareOp::Lt.apply(&u64v(1), &u64v(2)).unwrap());
        assert!(!CompareOp::Lt.apply(&u64v(2), &u64v(2)).unwrap());
        assert!(!CompareOp::Lt.apply(&u64v(3), &u64v(2)).unwrap());
    }

    #[test]
    fn ge_matches_gt_or_eq() {
        for (a, b) in [(1, 2), (2, 2), (3, 2)] {
            let (a, b) = (u64v(a), u64v(b));
            let composed =
                CompareOp::Gt.apply(&a, &b).unwrap() || CompareOp::Eq.apply(&a, &b).unwrap();
            assert_eq!(CompareOp::Ge.apply(&a, &b).unwrap(), composed);
        }
    }

    #[test]
    fn mixed_types_are_rejected() {
        let small = Value::Uint8(Uint8::try_from(7u64).unwrap());
        assert!(CompareOp::Eq.apply(&small, &u64v(7)).is_err());
    }

    #[test]
    fn bytes_support_equality_only() {
        let h = Value::Bytes32(Bytes32::from_array([1; 32]));
        assert!(CompareOp::Eq.apply(&h, &h.clone()).unwrap());
        assert!(CompareOp::Gt.apply(&h, &h.clone()).is_err());
    }

    #[test]
    fn parse_operator_names() {
        assert_eq!("le".parse::<CompareOp>().unwrap(), CompareOp::Le);
        assert!("lte".parse::<CompareOp>().is_err());
        let op: CompareOp = serde_json::from_value(json!("ne")).unwrap();
        assert_eq!(op, CompareOp::Ne);
    }

    #[test]
    fn parse_field_predicate() {
        let p = FieldPredicate::parse("value", "uint256", "ge", &json!(1000)).unwrap();
        assert_eq!(p.ty, SolType::Uint(256));
        assert!(FieldPredicate::parse("value", "int256", "ge", &json!(1)).is_err());
    }
}
