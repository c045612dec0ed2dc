//! Elementwise binary operators and their capability table.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, ArrowNativeTypeOp, AsArray, BooleanArray, PrimitiveArray};
use arrow::compute::kernels::bitwise::{bitwise_and, bitwise_or, bitwise_xor};
use arrow::compute::kernels::boolean::{and, and_kleene, or, or_kleene};
use arrow::compute::kernels::{cmp, numeric};
use arrow::compute::cast;
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type,
    UInt8Type, UInt16Type, UInt32Type, UInt64Type,
};
use colexpr_result::{Error, Result};

use crate::operand::{Operand, broadcast, pair};

/// Binary operators understood by [`binary_operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Eq,
    /// Equality where two nulls compare equal and the result is never null.
    NullEquals,
    NotEq,
    NullNotEquals,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    /// Division in the output type; integer division truncates.
    Div,
    /// Division carried out in floating point.
    TrueDiv,
    FloorDiv,
    /// Remainder with the sign of the divisor.
    PyMod,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    LogicalAnd,
    LogicalOr,
    /// Kleene AND: `false AND null` is `false`.
    NullLogicalAnd,
    /// Kleene OR: `true OR null` is `true`.
    NullLogicalOr,
}

impl BinaryOperator {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::NullEquals
                | BinaryOperator::NotEq
                | BinaryOperator::NullNotEquals
                | BinaryOperator::Lt
                | BinaryOperator::LtEq
                | BinaryOperator::Gt
                | BinaryOperator::GtEq
        )
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Sub
                | BinaryOperator::Mul
                | BinaryOperator::Div
                | BinaryOperator::TrueDiv
                | BinaryOperator::FloorDiv
                | BinaryOperator::PyMod
        )
    }

    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinaryOperator::BitwiseAnd | BinaryOperator::BitwiseOr | BinaryOperator::BitwiseXor
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(
            self,
            BinaryOperator::LogicalAnd
                | BinaryOperator::LogicalOr
                | BinaryOperator::NullLogicalAnd
                | BinaryOperator::NullLogicalOr
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            BinaryOperator::Eq => "EQUAL",
            BinaryOperator::NullEquals => "NULL_EQUALS",
            BinaryOperator::NotEq => "NOT_EQUAL",
            BinaryOperator::NullNotEquals => "NULL_NOT_EQUALS",
            BinaryOperator::Lt => "LESS",
            BinaryOperator::LtEq => "LESS_EQUAL",
            BinaryOperator::Gt => "GREATER",
            BinaryOperator::GtEq => "GREATER_EQUAL",
            BinaryOperator::Add => "ADD",
            BinaryOperator::Sub => "SUB",
            BinaryOperator::Mul => "MUL",
            BinaryOperator::Div => "DIV",
            BinaryOperator::TrueDiv => "TRUE_DIV",
            BinaryOperator::FloorDiv => "FLOOR_DIV",
            BinaryOperator::PyMod => "PYMOD",
            BinaryOperator::BitwiseAnd => "BITWISE_AND",
            BinaryOperator::BitwiseOr => "BITWISE_OR",
            BinaryOperator::BitwiseXor => "BITWISE_XOR",
            BinaryOperator::LogicalAnd => "LOGICAL_AND",
            BinaryOperator::LogicalOr => "LOGICAL_OR",
            BinaryOperator::NullLogicalAnd => "NULL_LOGICAL_AND",
            BinaryOperator::NullLogicalOr => "NULL_LOGICAL_OR",
        }
    }
}

#[inline]
pub fn is_numeric(dtype: &DataType) -> bool {
    dtype.is_integer() || matches!(dtype, DataType::Float32 | DataType::Float64)
}

fn is_stringish(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    )
}

/// Whether `op` can run on `lhs`/`rhs` producing `out`.
pub fn is_supported_operation(
    out: &DataType,
    lhs: &DataType,
    rhs: &DataType,
    op: BinaryOperator,
) -> bool {
    if op.is_comparison() {
        return *out == DataType::Boolean
            && (lhs == rhs
                || (is_numeric(lhs) && is_numeric(rhs))
                || (is_stringish(lhs) && is_stringish(rhs)));
    }
    if op.is_logical() {
        let operand_ok = |dt: &DataType| *dt == DataType::Boolean || dt.is_integer();
        return *out == DataType::Boolean && operand_ok(lhs) && operand_ok(rhs);
    }
    if op.is_bitwise() {
        return (out.is_integer() && lhs.is_integer() && rhs.is_integer())
            || (*out == DataType::Boolean
                && *lhs == DataType::Boolean
                && *rhs == DataType::Boolean);
    }
    if is_numeric(lhs) && is_numeric(rhs) {
        return is_numeric(out);
    }
    temporal_result(lhs, rhs, op).is_some_and(|dt| dt == *out)
}

/// Result type of timestamp/duration arithmetic, when defined.
fn temporal_result(lhs: &DataType, rhs: &DataType, op: BinaryOperator) -> Option<DataType> {
    use DataType::{Duration, Timestamp};
    match (lhs, rhs, op) {
        (Timestamp(a, _), Timestamp(b, _), BinaryOperator::Sub) if a == b => Some(Duration(*a)),
        (Timestamp(a, tz), Duration(b), BinaryOperator::Add | BinaryOperator::Sub) if a == b => {
            Some(Timestamp(*a, tz.clone()))
        }
        (Duration(a), Timestamp(b, tz), BinaryOperator::Add) if a == b => {
            Some(Timestamp(*b, tz.clone()))
        }
        (Duration(a), Duration(b), BinaryOperator::Add | BinaryOperator::Sub) if a == b => {
            Some(Duration(*a))
        }
        _ => None,
    }
}

/// Evaluate `lhs op rhs` producing an array of type `out`.
///
/// A length-one operand facing a longer one is applied in scalar form.
pub fn binary_operation(
    lhs: &ArrayRef,
    rhs: &ArrayRef,
    op: BinaryOperator,
    out: &DataType,
) -> Result<ArrayRef> {
    if !is_supported_operation(out, lhs.data_type(), rhs.data_type(), op) {
        return Err(Error::unsupported(format!(
            "binary operator {} on {} and {} producing {out}",
            op.name(),
            lhs.data_type(),
            rhs.data_type()
        )));
    }
    let result = if op.is_comparison() {
        compute_compare(lhs, rhs, op)?
    } else if op.is_logical() {
        compute_logical(lhs, rhs, op)?
    } else if op.is_bitwise() {
        compute_bitwise(lhs, rhs, op, out)?
    } else {
        compute_arithmetic(lhs, rhs, op, out)?
    };
    if result.data_type() == out {
        Ok(result)
    } else {
        Ok(cast(&result, out)?)
    }
}

fn compute_compare(lhs: &ArrayRef, rhs: &ArrayRef, op: BinaryOperator) -> Result<ArrayRef> {
    let (lhs, rhs) = coerce_types(lhs, rhs)?;
    let (l, r, _) = pair(&lhs, &rhs)?;
    let result = match op {
        BinaryOperator::Eq => cmp::eq(&l, &r)?,
        BinaryOperator::NotEq => cmp::neq(&l, &r)?,
        BinaryOperator::NullEquals => cmp::not_distinct(&l, &r)?,
        BinaryOperator::NullNotEquals => cmp::distinct(&l, &r)?,
        BinaryOperator::Lt => cmp::lt(&l, &r)?,
        BinaryOperator::LtEq => cmp::lt_eq(&l, &r)?,
        BinaryOperator::Gt => cmp::gt(&l, &r)?,
        BinaryOperator::GtEq => cmp::gt_eq(&l, &r)?,
        other => return Err(Error::internal(format!("{} is not a comparison", other.name()))),
    };
    Ok(Arc::new(result))
}

fn compute_logical(lhs: &ArrayRef, rhs: &ArrayRef, op: BinaryOperator) -> Result<ArrayRef> {
    let (l, r) = boolean_pair(lhs, rhs)?;
    let result = match op {
        BinaryOperator::LogicalAnd => and(&l, &r)?,
        BinaryOperator::LogicalOr => or(&l, &r)?,
        BinaryOperator::NullLogicalAnd => and_kleene(&l, &r)?,
        BinaryOperator::NullLogicalOr => or_kleene(&l, &r)?,
        other => return Err(Error::internal(format!("{} is not logical", other.name()))),
    };
    Ok(Arc::new(result))
}

/// Both operands as equal-length boolean arrays.
fn boolean_pair(lhs: &ArrayRef, rhs: &ArrayRef) -> Result<(BooleanArray, BooleanArray)> {
    let len = lhs.len().max(rhs.len());
    let to_bool = |array: &ArrayRef| -> Result<BooleanArray> {
        let array = broadcast(array, len)?;
        let array = if *array.data_type() == DataType::Boolean {
            array
        } else {
            cast(&array, &DataType::Boolean)?
        };
        Ok(array.as_boolean().clone())
    };
    Ok((to_bool(lhs)?, to_bool(rhs)?))
}

macro_rules! bitwise_dispatch {
    ($out:expr, $l:expr, $r:expr, $kernel:ident) => {
        match $out {
            DataType::Int8 => bitwise_typed!($l, $r, $kernel, Int8Type),
            DataType::Int16 => bitwise_typed!($l, $r, $kernel, Int16Type),
            DataType::Int32 => bitwise_typed!($l, $r, $kernel, Int32Type),
            DataType::Int64 => bitwise_typed!($l, $r, $kernel, Int64Type),
            DataType::UInt8 => bitwise_typed!($l, $r, $kernel, UInt8Type),
            DataType::UInt16 => bitwise_typed!($l, $r, $kernel, UInt16Type),
            DataType::UInt32 => bitwise_typed!($l, $r, $kernel, UInt32Type),
            DataType::UInt64 => bitwise_typed!($l, $r, $kernel, UInt64Type),
            other => {
                return Err(Error::internal(format!(
                    "bitwise operator on non-integer type {other}"
                )))
            }
        }
    };
}

macro_rules! bitwise_typed {
    ($l:expr, $r:expr, $kernel:ident, $ty:ty) => {
        Arc::new($kernel($l.as_primitive::<$ty>(), $r.as_primitive::<$ty>())?) as ArrayRef
    };
}

fn compute_bitwise(
    lhs: &ArrayRef,
    rhs: &ArrayRef,
    op: BinaryOperator,
    out: &DataType,
) -> Result<ArrayRef> {
    if *out == DataType::Boolean {
        let (l, r) = boolean_pair(lhs, rhs)?;
        let result = match op {
            BinaryOperator::BitwiseAnd => and(&l, &r)?,
            BinaryOperator::BitwiseOr => or(&l, &r)?,
            _ => cmp::neq(&l, &r)?,
        };
        return Ok(Arc::new(result));
    }
    let len = lhs.len().max(rhs.len());
    let l = cast(&broadcast(lhs, len)?, out)?;
    let r = cast(&broadcast(rhs, len)?, out)?;
    let result = match op {
        BinaryOperator::BitwiseAnd => bitwise_dispatch!(out, l, r, bitwise_and),
        BinaryOperator::BitwiseOr => bitwise_dispatch!(out, l, r, bitwise_or),
        _ => bitwise_dispatch!(out, l, r, bitwise_xor),
    };
    Ok(result)
}

fn compute_arithmetic(
    lhs: &ArrayRef,
    rhs: &ArrayRef,
    op: BinaryOperator,
    out: &DataType,
) -> Result<ArrayRef> {
    if temporal_result(lhs.data_type(), rhs.data_type(), op).is_some() {
        let (l, r, _) = pair(lhs, rhs)?;
        return Ok(match op {
            BinaryOperator::Add => numeric::add_wrapping(&l, &r)?,
            _ => numeric::sub_wrapping(&l, &r)?,
        });
    }

    match op {
        BinaryOperator::TrueDiv => {
            let l = cast(lhs, &DataType::Float64)?;
            let r = cast(rhs, &DataType::Float64)?;
            let (l, r, _) = pair(&l, &r)?;
            Ok(numeric::div(&l, &r)?)
        }
        BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul => {
            let (l, r, _) = cast_pair(lhs, rhs, out)?;
            Ok(match op {
                BinaryOperator::Add => numeric::add_wrapping(&l, &r)?,
                BinaryOperator::Sub => numeric::sub_wrapping(&l, &r)?,
                _ => numeric::mul_wrapping(&l, &r)?,
            })
        }
        BinaryOperator::Div if out.is_floating() => {
            let (l, r, _) = cast_pair(lhs, rhs, out)?;
            Ok(numeric::div(&l, &r)?)
        }
        BinaryOperator::Div | BinaryOperator::FloorDiv | BinaryOperator::PyMod => {
            let len = lhs.len().max(rhs.len());
            let l = cast(&broadcast(lhs, len)?, out)?;
            let r = cast(&broadcast(rhs, len)?, out)?;
            if out.is_floating() {
                let l = cast(&l, &DataType::Float64)?;
                let r = cast(&r, &DataType::Float64)?;
                let result = float_binary(&l, &r, op);
                return Ok(Arc::new(result));
            }
            integer_division(&l, &r, op, out)
        }
        other => Err(Error::internal(format!(
            "{} is not an arithmetic operator",
            other.name()
        ))),
    }
}

fn cast_pair(lhs: &ArrayRef, rhs: &ArrayRef, out: &DataType) -> Result<(Operand, Operand, usize)> {
    let l = cast(lhs, out)?;
    let r = cast(rhs, out)?;
    pair(&l, &r)
}

fn float_binary(lhs: &ArrayRef, rhs: &ArrayRef, op: BinaryOperator) -> PrimitiveArray<Float64Type> {
    let l = lhs.as_primitive::<Float64Type>();
    let r = rhs.as_primitive::<Float64Type>();
    l.iter()
        .zip(r.iter())
        .map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => Some(match op {
                BinaryOperator::FloorDiv => (a / b).floor(),
                _ => {
                    let rem = a % b;
                    if rem != 0.0 && (rem < 0.0) != (b < 0.0) {
                        rem + b
                    } else {
                        rem
                    }
                }
            }),
            _ => None,
        })
        .collect()
}

fn int_binary<T: ArrowPrimitiveType>(
    lhs: &PrimitiveArray<T>,
    rhs: &PrimitiveArray<T>,
    op: fn(T::Native, T::Native) -> Option<T::Native>,
) -> PrimitiveArray<T> {
    lhs.iter()
        .zip(rhs.iter())
        .map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => op(a, b),
            _ => None,
        })
        .collect()
}

fn truncating_div<N: ArrowNativeTypeOp>(a: N, b: N) -> Option<N> {
    (!b.is_zero()).then(|| a.div_wrapping(b))
}

fn floor_div<N: ArrowNativeTypeOp>(a: N, b: N) -> Option<N> {
    if b.is_zero() {
        return None;
    }
    let quotient = a.div_wrapping(b);
    let rem = a.mod_wrapping(b);
    if !rem.is_zero() && (rem.is_lt(N::ZERO) != b.is_lt(N::ZERO)) {
        Some(quotient.sub_wrapping(N::ONE))
    } else {
        Some(quotient)
    }
}

fn py_mod<N: ArrowNativeTypeOp>(a: N, b: N) -> Option<N> {
    if b.is_zero() {
        return None;
    }
    let rem = a.mod_wrapping(b);
    if !rem.is_zero() && (rem.is_lt(N::ZERO) != b.is_lt(N::ZERO)) {
        Some(rem.add_wrapping(b))
    } else {
        Some(rem)
    }
}

macro_rules! int_division_typed {
    ($l:expr, $r:expr, $op:expr, $ty:ty) => {{
        let f: fn(
            <$ty as ArrowPrimitiveType>::Native,
            <$ty as ArrowPrimitiveType>::Native,
        ) -> Option<<$ty as ArrowPrimitiveType>::Native> = match $op {
            BinaryOperator::Div => truncating_div,
            BinaryOperator::FloorDiv => floor_div,
            _ => py_mod,
        };
        Arc::new(int_binary::<$ty>($l.as_primitive(), $r.as_primitive(), f)) as ArrayRef
    }};
}

/// Integer division family. Division by zero yields null.
fn integer_division(
    lhs: &ArrayRef,
    rhs: &ArrayRef,
    op: BinaryOperator,
    out: &DataType,
) -> Result<ArrayRef> {
    let result = match out {
        DataType::Int8 => int_division_typed!(lhs, rhs, op, Int8Type),
        DataType::Int16 => int_division_typed!(lhs, rhs, op, Int16Type),
        DataType::Int32 => int_division_typed!(lhs, rhs, op, Int32Type),
        DataType::Int64 => int_division_typed!(lhs, rhs, op, Int64Type),
        DataType::UInt8 => int_division_typed!(lhs, rhs, op, UInt8Type),
        DataType::UInt16 => int_division_typed!(lhs, rhs, op, UInt16Type),
        DataType::UInt32 => int_division_typed!(lhs, rhs, op, UInt32Type),
        DataType::UInt64 => int_division_typed!(lhs, rhs, op, UInt64Type),
        other => {
            return Err(Error::internal(format!(
                "integer division producing {other}"
            )));
        }
    };
    Ok(result)
}

/// Bring two arrays to a common type for comparison.
pub fn coerce_types(lhs: &ArrayRef, rhs: &ArrayRef) -> Result<(ArrayRef, ArrayRef)> {
    let lhs_type = lhs.data_type();
    let rhs_type = rhs.data_type();

    if lhs_type == rhs_type {
        return Ok((lhs.clone(), rhs.clone()));
    }

    let target_type = match common_type(lhs_type, rhs_type) {
        Some(dt) => dt,
        None => lhs_type.clone(),
    };

    let lhs_casted = cast(lhs, &target_type)?;
    let rhs_casted = cast(rhs, &target_type)?;
    Ok((lhs_casted, rhs_casted))
}

fn common_type(lhs: &DataType, rhs: &DataType) -> Option<DataType> {
    if is_stringish(lhs) && is_stringish(rhs) {
        return Some(DataType::Utf8);
    }
    if !(is_numeric(lhs) && is_numeric(rhs)) {
        return None;
    }
    if lhs.is_floating() || rhs.is_floating() {
        return Some(DataType::Float64);
    }
    let width = |dt: &DataType| dt.primitive_width().unwrap_or(8);
    let (lw, rw) = (width(lhs), width(rhs));
    let signed = |dt: &DataType| dt.is_signed_integer();
    Some(match (signed(lhs), signed(rhs)) {
        (true, true) | (false, false) => {
            if lw >= rw {
                lhs.clone()
            } else {
                rhs.clone()
            }
        }
        _ => {
            let unsigned_width = if signed(lhs) { rw } else { lw };
            if unsigned_width < 8 {
                DataType::Int64
            } else {
                DataType::Float64
            }
        }
    })
}
