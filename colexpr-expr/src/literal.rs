//! Scalar literal values carried by `Literal` nodes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, UInt64Array, new_null_array,
};
use arrow::datatypes::DataType;
use colexpr_compute::cast_to;
use colexpr_result::{Error, Result};

/// A single typed-at-evaluation scalar.
///
/// The value is stored in its widest natural representation and converted to
/// the node's declared type when materialised.
#[derive(Debug, Clone)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
}

macro_rules! impl_from_for_literal {
    ($variant:ident, $($t:ty),*) => {
        $(
            impl From<$t> for LiteralValue {
                fn from(v: $t) -> Self {
                    LiteralValue::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_literal!(Int, i8, i16, i32, i64);
impl_from_for_literal!(UInt, u8, u16, u32, u64);
impl_from_for_literal!(Float, f32, f64);
impl_from_for_literal!(Boolean, bool);
impl_from_for_literal!(String, String);

impl From<&str> for LiteralValue {
    fn from(v: &str) -> Self {
        LiteralValue::String(v.to_string())
    }
}

impl<T: Into<LiteralValue>> From<Option<T>> for LiteralValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(LiteralValue::Null, Into::into)
    }
}

impl LiteralValue {
    pub fn is_null(&self) -> bool {
        matches!(self, LiteralValue::Null)
    }

    /// Integer view of the value, if it is an integer that fits in `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            LiteralValue::Int(v) => Some(*v),
            LiteralValue::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LiteralValue::Int(v) => Some(*v as f64),
            LiteralValue::UInt(v) => Some(*v as f64),
            LiteralValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Materialise as a length-one array of type `dtype`.
    pub fn to_array(&self, dtype: &DataType) -> Result<ArrayRef> {
        let natural: ArrayRef = match self {
            LiteralValue::Null => return Ok(new_null_array(dtype, 1)),
            LiteralValue::Boolean(v) => Arc::new(BooleanArray::from(vec![*v])),
            LiteralValue::Int(v) => Arc::new(Int64Array::from(vec![*v])),
            LiteralValue::UInt(v) => Arc::new(UInt64Array::from(vec![*v])),
            LiteralValue::Float(v) => Arc::new(Float64Array::from(vec![*v])),
            LiteralValue::String(v) => Arc::new(StringArray::from(vec![v.as_str()])),
        };
        cast_to(&natural, dtype).map_err(|_| {
            Error::invalid_argument(format!("literal {self} cannot be represented as {dtype}"))
        })
    }

    fn tag(&self) -> u8 {
        match self {
            LiteralValue::Null => 0,
            LiteralValue::Boolean(_) => 1,
            LiteralValue::Int(_) => 2,
            LiteralValue::UInt(_) => 3,
            LiteralValue::Float(_) => 4,
            LiteralValue::String(_) => 5,
        }
    }
}

// Floats compare by bit pattern so that equality stays reflexive for NaN.
impl PartialEq for LiteralValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LiteralValue::Null, LiteralValue::Null) => true,
            (LiteralValue::Boolean(a), LiteralValue::Boolean(b)) => a == b,
            (LiteralValue::Int(a), LiteralValue::Int(b)) => a == b,
            (LiteralValue::UInt(a), LiteralValue::UInt(b)) => a == b,
            (LiteralValue::Float(a), LiteralValue::Float(b)) => a.to_bits() == b.to_bits(),
            (LiteralValue::String(a), LiteralValue::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for LiteralValue {}

impl Hash for LiteralValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.tag());
        match self {
            LiteralValue::Null => {}
            LiteralValue::Boolean(v) => v.hash(state),
            LiteralValue::Int(v) => v.hash(state),
            LiteralValue::UInt(v) => v.hash(state),
            LiteralValue::Float(v) => v.to_bits().hash(state),
            LiteralValue::String(v) => v.hash(state),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Null => f.write_str("null"),
            LiteralValue::Boolean(v) => write!(f, "{v}"),
            LiteralValue::Int(v) => write!(f, "{v}"),
            LiteralValue::UInt(v) => write!(f, "{v}"),
            LiteralValue::Float(v) => write!(f, "{v:?}"),
            LiteralValue::String(v) => write!(f, "{v:?}"),
        }
    }
}
