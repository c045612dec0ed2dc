//! Gather, mask compaction and elementwise selection.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, UInt64Array};
use arrow::compute::kernels::zip::zip;
use arrow::compute::{TakeOptions, cast, filter, is_not_null, is_null, take};
use arrow::datatypes::{DataType, Int64Type};
use colexpr_result::{Error, Result};

use crate::operand::{Operand, broadcast};

/// Gather `values` at `indices`, which may be negative (counting from the end).
///
/// Every valid index must lie in `[-n, n)` for `n = values.len()`; the check
/// runs before any data is moved. Null indices produce null rows.
pub fn gather(values: &ArrayRef, indices: &ArrayRef) -> Result<ArrayRef> {
    if !indices.data_type().is_integer() {
        return Err(Error::invalid_argument(format!(
            "gather indices must be integers, got {}",
            indices.data_type()
        )));
    }
    let indices = cast(indices, &DataType::Int64)?;
    let indices = indices.as_primitive::<Int64Type>();
    let n = values.len() as i64;
    let (lo, hi) = indices
        .iter()
        .flatten()
        .fold((i64::MAX, i64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if indices.len() > indices.null_count() && (lo < -n || hi >= n) {
        return Err(Error::OutOfBounds(format!(
            "gather indices [{lo}, {hi}] outside [-{n}, {n})"
        )));
    }
    let normalized: UInt64Array = indices
        .iter()
        .map(|v| v.map(|v| if v < 0 { (v + n) as u64 } else { v as u64 }))
        .collect();
    let options = TakeOptions { check_bounds: true };
    take(values.as_ref(), &normalized, Some(options))
        .map_err(|err| Error::OutOfBounds(err.to_string()))
}

/// Keep the rows where `mask` is true; null mask entries count as false.
pub fn apply_mask(values: &ArrayRef, mask: &BooleanArray) -> Result<ArrayRef> {
    Ok(filter(values.as_ref(), mask)?)
}

pub fn drop_nulls(values: &ArrayRef) -> Result<ArrayRef> {
    if values.null_count() == 0 {
        return Ok(values.clone());
    }
    apply_mask(values, &is_not_null(values.as_ref())?)
}

/// Replace nulls in `values` with `fill`, either a scalar or a column of equal length.
pub fn fill_null(values: &ArrayRef, fill: &ArrayRef) -> Result<ArrayRef> {
    if values.null_count() == 0 {
        return Ok(values.clone());
    }
    let fill = if fill.data_type() == values.data_type() {
        fill.clone()
    } else {
        cast(fill, values.data_type())?
    };
    let mask = is_null(values.as_ref())?;
    let fill = operand_for(&fill, values.len())?;
    Ok(zip(&mask, &fill, values)?)
}

/// `mask ? truthy : falsy`, with length-one inputs broadcast. A null mask entry selects `falsy`.
pub fn copy_if_else(mask: &ArrayRef, truthy: &ArrayRef, falsy: &ArrayRef) -> Result<ArrayRef> {
    let len = mask.len().max(truthy.len()).max(falsy.len());
    let mask = broadcast(mask, len)?;
    let mask = mask
        .as_any()
        .downcast_ref::<BooleanArray>()
        .ok_or_else(|| Error::invalid_argument("ternary predicate must be boolean"))?;
    let falsy = if falsy.data_type() == truthy.data_type() {
        falsy.clone()
    } else {
        cast(falsy, truthy.data_type())?
    };
    let truthy = operand_for(truthy, len)?;
    let falsy = operand_for(&falsy, len)?;
    Ok(zip(mask, &truthy, &falsy)?)
}

fn operand_for(array: &ArrayRef, len: usize) -> Result<Operand> {
    if array.len() == len {
        Ok(Operand::Array(array.clone()))
    } else if array.len() == 1 {
        Ok(Operand::Scalar(array.clone()))
    } else {
        Err(Error::invalid_argument(format!(
            "column of length {} does not match {len} rows",
            array.len()
        )))
    }
}

/// A constant boolean column of `len` rows.
pub fn constant_bool(value: bool, len: usize) -> ArrayRef {
    Arc::new(BooleanArray::from(vec![value; len]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, Int64Array};
    use arrow::datatypes::Int32Type;

    fn ints(values: Vec<Option<i32>>) -> ArrayRef {
        Arc::new(Int32Array::from(values))
    }

    #[test]
    fn gather_negative_and_null_indices() {
        let values = ints(vec![Some(10), Some(20), Some(30)]);
        let indices: ArrayRef = Arc::new(Int64Array::from(vec![Some(-1), None, Some(0)]));
        let out = gather(&values, &indices).unwrap();
        let out = out.as_primitive::<Int32Type>();
        assert_eq!(out.value(0), 30);
        assert!(out.is_null(1));
        assert_eq!(out.value(2), 10);
    }

    #[test]
    fn gather_out_of_bounds() {
        let values = ints(vec![Some(10), Some(20)]);
        let indices: ArrayRef = Arc::new(Int64Array::from(vec![2]));
        assert!(matches!(
            gather(&values, &indices),
            Err(Error::OutOfBounds(_))
        ));
        let indices: ArrayRef = Arc::new(Int64Array::from(vec![-3]));
        assert!(matches!(
            gather(&values, &indices),
            Err(Error::OutOfBounds(_))
        ));
    }

    #[test]
    fn fill_null_with_scalar_and_column() {
        let values = ints(vec![Some(1), None, Some(3)]);
        let out = fill_null(&values, &ints(vec![Some(0)])).unwrap();
        assert_eq!(out.as_primitive::<Int32Type>().values(), &[1, 0, 3]);
        assert_eq!(out.null_count(), 0);

        let fill = ints(vec![Some(7), Some(8), Some(9)]);
        let out = fill_null(&values, &fill).unwrap();
        assert_eq!(out.as_primitive::<Int32Type>().values(), &[1, 8, 3]);
    }

    #[test]
    fn drop_nulls_and_mask() {
        let values = ints(vec![Some(1), None, Some(3), None, Some(5)]);
        let out = drop_nulls(&values).unwrap();
        assert_eq!(out.as_primitive::<Int32Type>().values(), &[1, 3, 5]);

        let mask = BooleanArray::from(vec![Some(true), None, Some(false), Some(true), None]);
        let out = apply_mask(&values, &mask).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn copy_if_else_broadcasts() {
        let mask: ArrayRef = Arc::new(BooleanArray::from(vec![Some(true), None, Some(false)]));
        let out = copy_if_else(&mask, &ints(vec![Some(1)]), &ints(vec![Some(4), Some(5), Some(6)]))
            .unwrap();
        assert_eq!(out.as_primitive::<Int32Type>().values(), &[1, 5, 6]);
    }
}
