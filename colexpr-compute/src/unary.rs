//! Elementwise math and rounding.

use std::fmt;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, ArrowNativeTypeOp, AsArray, PrimitiveArray};
use arrow::compute::kernels::bitwise::bitwise_not;
use arrow::compute::not;
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type,
    Int64Type, UInt8Type, UInt16Type, UInt32Type, UInt64Type,
};
use colexpr_result::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathOp {
    Sin,
    Cos,
    Tan,
    Arcsin,
    Arccos,
    Arctan,
    Sinh,
    Cosh,
    Tanh,
    Arcsinh,
    Arccosh,
    Arctanh,
    Exp,
    Sqrt,
    Cbrt,
    Ceil,
    Floor,
    Abs,
    BitInvert,
    Not,
}

impl MathOp {
    /// Parse the function name used by the query language.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => MathOp::Sin,
            "cos" => MathOp::Cos,
            "tan" => MathOp::Tan,
            "arcsin" => MathOp::Arcsin,
            "arccos" => MathOp::Arccos,
            "arctan" => MathOp::Arctan,
            "sinh" => MathOp::Sinh,
            "cosh" => MathOp::Cosh,
            "tanh" => MathOp::Tanh,
            "arcsinh" => MathOp::Arcsinh,
            "arccosh" => MathOp::Arccosh,
            "arctanh" => MathOp::Arctanh,
            "exp" => MathOp::Exp,
            "sqrt" => MathOp::Sqrt,
            "cbrt" => MathOp::Cbrt,
            "ceil" => MathOp::Ceil,
            "floor" => MathOp::Floor,
            "abs" => MathOp::Abs,
            "bit_invert" => MathOp::BitInvert,
            "not" => MathOp::Not,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            MathOp::Sin => "sin",
            MathOp::Cos => "cos",
            MathOp::Tan => "tan",
            MathOp::Arcsin => "arcsin",
            MathOp::Arccos => "arccos",
            MathOp::Arctan => "arctan",
            MathOp::Sinh => "sinh",
            MathOp::Cosh => "cosh",
            MathOp::Tanh => "tanh",
            MathOp::Arcsinh => "arcsinh",
            MathOp::Arccosh => "arccosh",
            MathOp::Arctanh => "arctanh",
            MathOp::Exp => "exp",
            MathOp::Sqrt => "sqrt",
            MathOp::Cbrt => "cbrt",
            MathOp::Ceil => "ceil",
            MathOp::Floor => "floor",
            MathOp::Abs => "abs",
            MathOp::BitInvert => "bit_invert",
            MathOp::Not => "not",
        }
    }

    fn float_fn(self) -> Option<fn(f64) -> f64> {
        Some(match self {
            MathOp::Sin => f64::sin,
            MathOp::Cos => f64::cos,
            MathOp::Tan => f64::tan,
            MathOp::Arcsin => f64::asin,
            MathOp::Arccos => f64::acos,
            MathOp::Arctan => f64::atan,
            MathOp::Sinh => f64::sinh,
            MathOp::Cosh => f64::cosh,
            MathOp::Tanh => f64::tanh,
            MathOp::Arcsinh => f64::asinh,
            MathOp::Arccosh => f64::acosh,
            MathOp::Arctanh => f64::atanh,
            MathOp::Exp => f64::exp,
            MathOp::Sqrt => f64::sqrt,
            MathOp::Cbrt => f64::cbrt,
            MathOp::Ceil => f64::ceil,
            MathOp::Floor => f64::floor,
            MathOp::Abs => f64::abs,
            MathOp::BitInvert | MathOp::Not => return None,
        })
    }
}

impl fmt::Display for MathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn int_abs<T: ArrowPrimitiveType>(array: &PrimitiveArray<T>) -> PrimitiveArray<T> {
    array.unary(|v| {
        if v.is_lt(T::Native::ZERO) {
            v.neg_wrapping()
        } else {
            v
        }
    })
}

macro_rules! int_dispatch {
    ($values:expr, $body:ident) => {
        match $values.data_type() {
            DataType::Int8 => $body!($values, Int8Type),
            DataType::Int16 => $body!($values, Int16Type),
            DataType::Int32 => $body!($values, Int32Type),
            DataType::Int64 => $body!($values, Int64Type),
            DataType::UInt8 => $body!($values, UInt8Type),
            DataType::UInt16 => $body!($values, UInt16Type),
            DataType::UInt32 => $body!($values, UInt32Type),
            DataType::UInt64 => $body!($values, UInt64Type),
            other => return Err(Error::unsupported(format!("integer kernel over {other}"))),
        }
    };
}

macro_rules! abs_typed {
    ($values:expr, $ty:ty) => {
        Arc::new(int_abs::<$ty>($values.as_primitive::<$ty>())) as ArrayRef
    };
}

macro_rules! invert_typed {
    ($values:expr, $ty:ty) => {
        Arc::new(bitwise_not($values.as_primitive::<$ty>())?) as ArrayRef
    };
}

/// Apply `op` to every row. The input must already have the output type.
pub fn unary_math(values: &ArrayRef, op: MathOp) -> Result<ArrayRef> {
    let dtype = values.data_type();
    match op {
        MathOp::Not => match dtype {
            DataType::Boolean => Ok(Arc::new(not(values.as_boolean())?)),
            other => Err(Error::unsupported(format!("not over {other}"))),
        },
        MathOp::BitInvert => match dtype {
            DataType::Boolean => Ok(Arc::new(not(values.as_boolean())?)),
            _ => Ok(int_dispatch!(values, invert_typed)),
        },
        MathOp::Abs if dtype.is_integer() => Ok(int_dispatch!(values, abs_typed)),
        MathOp::Ceil | MathOp::Floor if dtype.is_integer() => Ok(values.clone()),
        _ => {
            let f = op
                .float_fn()
                .ok_or_else(|| Error::internal(format!("{op} has no float kernel")))?;
            match dtype {
                DataType::Float64 => Ok(Arc::new(
                    values.as_primitive::<Float64Type>().unary::<_, Float64Type>(f),
                )),
                DataType::Float32 => Ok(Arc::new(
                    values
                        .as_primitive::<Float32Type>()
                        .unary::<_, Float32Type>(|v| f(f64::from(v)) as f32),
                )),
                other => Err(Error::unsupported(format!("{op} over {other}"))),
            }
        }
    }
}

/// Round half away from zero to `decimals` places. Integers are unchanged.
pub fn round(values: &ArrayRef, decimals: u32) -> Result<ArrayRef> {
    let dtype = values.data_type();
    if dtype.is_integer() {
        return Ok(values.clone());
    }
    let factor = 10f64.powi(decimals as i32);
    let round_f64 = move |v: f64| (v * factor).round() / factor;
    match dtype {
        DataType::Float64 => Ok(Arc::new(
            values
                .as_primitive::<Float64Type>()
                .unary::<_, Float64Type>(round_f64),
        )),
        DataType::Float32 => Ok(Arc::new(
            values
                .as_primitive::<Float32Type>()
                .unary::<_, Float32Type>(|v| round_f64(f64::from(v)) as f32),
        )),
        other => Err(Error::unsupported(format!("round over {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BooleanArray, Float64Array, Int32Array};

    #[test]
    fn abs_and_invert_on_integers() {
        let values: ArrayRef = Arc::new(Int32Array::from(vec![Some(-3), None, Some(4)]));
        let abs = unary_math(&values, MathOp::Abs).unwrap();
        let abs = abs.as_primitive::<Int32Type>();
        assert_eq!(abs.value(0), 3);
        assert!(abs.is_null(1));
        assert_eq!(abs.value(2), 4);

        let inv = unary_math(&values, MathOp::BitInvert).unwrap();
        assert_eq!(inv.as_primitive::<Int32Type>().value(2), !4);
    }

    #[test]
    fn float_functions() {
        let values: ArrayRef = Arc::new(Float64Array::from(vec![0.0, 4.0]));
        let sqrt = unary_math(&values, MathOp::Sqrt).unwrap();
        assert_eq!(sqrt.as_primitive::<Float64Type>().values(), &[0.0, 2.0]);
        let cos = unary_math(&values, MathOp::Cos).unwrap();
        assert_eq!(cos.as_primitive::<Float64Type>().value(0), 1.0);
        assert!(unary_math(&values, MathOp::Not).is_err());
    }

    #[test]
    fn not_on_booleans() {
        let values: ArrayRef = Arc::new(BooleanArray::from(vec![Some(true), None]));
        let out = unary_math(&values, MathOp::Not).unwrap();
        assert!(!out.as_boolean().value(0));
        assert!(out.is_null(1));
    }

    #[test]
    fn round_half_away_from_zero() {
        let values: ArrayRef = Arc::new(Float64Array::from(vec![0.125, -2.5, 1.0]));
        let out = round(&values, 2).unwrap();
        assert_eq!(out.as_primitive::<Float64Type>().value(0), 0.13);
        let out = round(&values, 0).unwrap();
        assert_eq!(out.as_primitive::<Float64Type>().values(), &[0.0, -3.0, 1.0]);
    }

    #[test]
    fn names_round_trip() {
        for op in [MathOp::Arcsinh, MathOp::BitInvert, MathOp::Cbrt] {
            assert_eq!(MathOp::from_name(op.name()), Some(op));
        }
        assert_eq!(MathOp::from_name("gamma"), None);
    }
}
