//! Inclusive cumulative scans.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, ArrowNativeTypeOp, AsArray, PrimitiveArray};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type,
    Int64Type, UInt8Type, UInt16Type, UInt32Type, UInt64Type,
};
use colexpr_result::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanOp {
    Min,
    Max,
    Sum,
    Product,
}

fn combine<N: ArrowNativeTypeOp>(acc: N, v: N, op: ScanOp) -> N {
    match op {
        ScanOp::Min => {
            if v.is_lt(acc) {
                v
            } else {
                acc
            }
        }
        ScanOp::Max => {
            if v.is_gt(acc) {
                v
            } else {
                acc
            }
        }
        ScanOp::Sum => acc.add_wrapping(v),
        ScanOp::Product => acc.mul_wrapping(v),
    }
}

fn scan_primitive<T: ArrowPrimitiveType>(array: &PrimitiveArray<T>, op: ScanOp) -> PrimitiveArray<T> {
    let mut acc: Option<T::Native> = None;
    let out: PrimitiveArray<T> = array
        .iter()
        .map(|v| {
            v.map(|v| {
                let next = match acc {
                    Some(a) => combine(a, v, op),
                    None => v,
                };
                acc = Some(next);
                next
            })
        })
        .collect();
    out.with_data_type(array.data_type().clone())
}

macro_rules! scan_typed {
    ($array:expr, $op:expr, $ty:ty) => {
        Arc::new(scan_primitive::<$ty>($array.as_primitive::<$ty>(), $op)) as ArrayRef
    };
}

/// Running `op` over `values`. Null rows stay null and do not reset the accumulator.
pub fn inclusive_scan(values: &ArrayRef, op: ScanOp) -> Result<ArrayRef> {
    let out = match values.data_type() {
        DataType::Int8 => scan_typed!(values, op, Int8Type),
        DataType::Int16 => scan_typed!(values, op, Int16Type),
        DataType::Int32 => scan_typed!(values, op, Int32Type),
        DataType::Int64 => scan_typed!(values, op, Int64Type),
        DataType::UInt8 => scan_typed!(values, op, UInt8Type),
        DataType::UInt16 => scan_typed!(values, op, UInt16Type),
        DataType::UInt32 => scan_typed!(values, op, UInt32Type),
        DataType::UInt64 => scan_typed!(values, op, UInt64Type),
        DataType::Float32 => scan_typed!(values, op, Float32Type),
        DataType::Float64 => scan_typed!(values, op, Float64Type),
        other => return Err(Error::unsupported(format!("cumulative {op:?} over {other}"))),
    };
    Ok(out)
}
