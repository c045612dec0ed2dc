//! Broadcast-aware operand handling for binary kernels.

use arrow::array::{Array, ArrayRef, Datum, UInt32Array};
use arrow::compute::take;
use colexpr_result::{Error, Result};

/// One side of a binary kernel: a full column or a length-one scalar.
#[derive(Debug, Clone)]
pub enum Operand {
    Array(ArrayRef),
    /// A length-one array applied to every row of the other side.
    Scalar(ArrayRef),
}

impl Operand {
    pub fn array(&self) -> &ArrayRef {
        match self {
            Operand::Array(array) | Operand::Scalar(array) => array,
        }
    }
}

impl Datum for Operand {
    fn get(&self) -> (&dyn Array, bool) {
        match self {
            Operand::Array(array) => (array.as_ref(), false),
            Operand::Scalar(array) => (array.as_ref(), true),
        }
    }
}

/// Pair up two arrays for a binary kernel.
///
/// When the lengths differ the length-one side is passed in scalar form
/// instead of being materialized. Returns the output length.
pub fn pair(lhs: &ArrayRef, rhs: &ArrayRef) -> Result<(Operand, Operand, usize)> {
    let (l, r) = (lhs.len(), rhs.len());
    if l == r {
        return Ok((Operand::Array(lhs.clone()), Operand::Array(rhs.clone()), l));
    }
    match (l, r) {
        (1, n) => Ok((
            Operand::Scalar(lhs.clone()),
            Operand::Array(rhs.clone()),
            n,
        )),
        (n, 1) => Ok((
            Operand::Array(lhs.clone()),
            Operand::Scalar(rhs.clone()),
            n,
        )),
        _ => Err(Error::invalid_argument(format!(
            "operand lengths {l} and {r} cannot be broadcast"
        ))),
    }
}

/// Repeat a length-one array `len` times. Arrays already of length `len` are returned as is.
pub fn broadcast(array: &ArrayRef, len: usize) -> Result<ArrayRef> {
    if array.len() == len {
        return Ok(array.clone());
    }
    if array.len() != 1 {
        return Err(Error::invalid_argument(format!(
            "cannot broadcast column of length {} to {len} rows",
            array.len()
        )));
    }
    let indices = UInt32Array::from(vec![0u32; len]);
    Ok(take(array.as_ref(), &indices, None)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{AsArray, Int32Array};
    use arrow::datatypes::Int32Type;
    use std::sync::Arc;

    #[test]
    fn pair_uses_scalar_form_for_short_side() {
        let lhs: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3]));
        let rhs: ArrayRef = Arc::new(Int32Array::from(vec![7]));
        let (l, r, len) = pair(&lhs, &rhs).unwrap();
        assert_eq!(len, 3);
        assert!(matches!(l, Operand::Array(_)));
        assert!(r.get().1);

        let bad: ArrayRef = Arc::new(Int32Array::from(vec![1, 2]));
        assert!(pair(&lhs, &bad).is_err());
    }

    #[test]
    fn broadcast_repeats_value() {
        let one: ArrayRef = Arc::new(Int32Array::from(vec![Some(4)]));
        let out = broadcast(&one, 3).unwrap();
        assert_eq!(out.as_primitive::<Int32Type>().values(), &[4, 4, 4]);
    }
}
