//! Whole-column reductions and the per-group aggregation vocabulary.
//!
//! Every reduction returns a length-one array so that results for several
//! groups can be concatenated into one column.

use std::fmt;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, ListArray, UInt64Array,
    new_null_array,
};
use arrow::buffer::OffsetBuffer;
use arrow::compute::kernels::aggregate::{bool_and, bool_or, sum_array};
use arrow::compute::{SortOptions, cast, filter, is_not_null, sort_to_indices, take};
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, UInt64Type};
use colexpr_result::{Error, Result};

use crate::distinct::count_distinct;

/// Interpolation between the two ranks bracketing a quantile position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interpolation {
    Nearest,
    Higher,
    Lower,
    Midpoint,
    Linear,
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Interpolation::Nearest => "nearest",
            Interpolation::Higher => "higher",
            Interpolation::Lower => "lower",
            Interpolation::Midpoint => "midpoint",
            Interpolation::Linear => "linear",
        };
        f.write_str(name)
    }
}

/// A reduction applied to the rows of one group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroupAggregation {
    /// Gather the group's values into a single list value.
    CollectList,
    Count { include_nulls: bool },
    /// The `n`th row of the group; negative `n` counts from the end.
    NthElement { n: i64, include_nulls: bool },
    Min,
    Max,
    Median,
    NUnique { include_nulls: bool },
    Mean,
    Sum,
    Std { ddof: u8 },
    Var { ddof: u8 },
    Quantile {
        quantile: f64,
        interpolation: Interpolation,
    },
}

impl GroupAggregation {
    pub fn is_collect_list(&self) -> bool {
        matches!(self, GroupAggregation::CollectList)
    }
}

/// Reduce `values` to a length-one array.
///
/// Counts are `Int64`, statistics are `Float64`, sums keep the widened input
/// type; callers cast to their declared output type.
pub fn reduce(values: &ArrayRef, agg: &GroupAggregation) -> Result<ArrayRef> {
    match *agg {
        GroupAggregation::CollectList => collect_list(values),
        GroupAggregation::Count { include_nulls } => {
            let n = if include_nulls {
                values.len()
            } else {
                values.len() - values.null_count()
            };
            Ok(Arc::new(Int64Array::from(vec![n as i64])))
        }
        GroupAggregation::NthElement { n, include_nulls } => {
            nth_element(values, n, include_nulls)
        }
        GroupAggregation::Min => extremum(values, false),
        GroupAggregation::Max => extremum(values, true),
        GroupAggregation::Median => quantile(values, 0.5, Interpolation::Linear),
        GroupAggregation::NUnique { include_nulls } => {
            let mut n = count_distinct(values)?;
            if !include_nulls && values.null_count() > 0 {
                n -= 1;
            }
            Ok(Arc::new(Int64Array::from(vec![n as i64])))
        }
        GroupAggregation::Mean => {
            let data = valid_f64(values)?;
            let mean = (!data.is_empty()).then(|| data.iter().sum::<f64>() / data.len() as f64);
            Ok(Arc::new(Float64Array::from(vec![mean])))
        }
        GroupAggregation::Sum => sum(values),
        GroupAggregation::Var { ddof } => {
            Ok(Arc::new(Float64Array::from(vec![variance(values, ddof)?])))
        }
        GroupAggregation::Std { ddof } => {
            let var = variance(values, ddof)?;
            Ok(Arc::new(Float64Array::from(vec![var.map(f64::sqrt)])))
        }
        GroupAggregation::Quantile {
            quantile: q,
            interpolation,
        } => quantile(values, q, interpolation),
    }
}

fn collect_list(values: &ArrayRef) -> Result<ArrayRef> {
    let field = Arc::new(Field::new_list_field(values.data_type().clone(), true));
    let offsets = OffsetBuffer::from_lengths([values.len()]);
    Ok(Arc::new(ListArray::try_new(
        field,
        offsets,
        values.clone(),
        None,
    )?))
}

fn nth_element(values: &ArrayRef, n: i64, include_nulls: bool) -> Result<ArrayRef> {
    let values = if include_nulls || values.null_count() == 0 {
        values.clone()
    } else {
        filter(values.as_ref(), &is_not_null(values.as_ref())?)?
    };
    let len = values.len() as i64;
    let idx = if n < 0 { len + n } else { n };
    if idx < 0 || idx >= len {
        return Ok(new_null_array(values.data_type(), 1));
    }
    Ok(values.slice(idx as usize, 1))
}

fn extremum(values: &ArrayRef, descending: bool) -> Result<ArrayRef> {
    if values.is_empty() {
        return Ok(new_null_array(values.data_type(), 1));
    }
    let options = SortOptions {
        descending,
        nulls_first: false,
    };
    let indices = sort_to_indices(values.as_ref(), Some(options), Some(1))?;
    Ok(take(values.as_ref(), &indices, None)?)
}

fn sum(values: &ArrayRef) -> Result<ArrayRef> {
    let dtype = values.data_type();
    let result: ArrayRef = if dtype.is_floating() {
        let floats = cast(values, &DataType::Float64)?;
        let total = sum_array::<Float64Type, _>(floats.as_primitive::<Float64Type>());
        Arc::new(Float64Array::from(vec![total.unwrap_or(0.0)]))
    } else if dtype.is_unsigned_integer() {
        let wide = cast(values, &DataType::UInt64)?;
        let total = sum_array::<UInt64Type, _>(wide.as_primitive::<UInt64Type>());
        Arc::new(UInt64Array::from(vec![total.unwrap_or(0)]))
    } else if dtype.is_signed_integer() || *dtype == DataType::Boolean || *dtype == DataType::Null
    {
        let wide = cast(values, &DataType::Int64)?;
        let total = sum_array::<Int64Type, _>(wide.as_primitive::<Int64Type>());
        Arc::new(Int64Array::from(vec![total.unwrap_or(0)]))
    } else {
        return Err(Error::unsupported(format!("sum over {dtype}")));
    };
    Ok(result)
}

/// Valid values as `f64`, nulls dropped.
fn valid_f64(values: &ArrayRef) -> Result<Vec<f64>> {
    let floats = cast(values, &DataType::Float64)?;
    Ok(floats.as_primitive::<Float64Type>().iter().flatten().collect())
}

fn variance(values: &ArrayRef, ddof: u8) -> Result<Option<f64>> {
    let data = valid_f64(values)?;
    let n = data.len() as f64;
    let denom = n - f64::from(ddof);
    if data.is_empty() || denom <= 0.0 {
        return Ok(None);
    }
    let mean = data.iter().sum::<f64>() / n;
    let ss: f64 = data.iter().map(|v| (v - mean) * (v - mean)).sum();
    Ok(Some(ss / denom))
}

fn quantile(values: &ArrayRef, q: f64, interpolation: Interpolation) -> Result<ArrayRef> {
    if !(0.0..=1.0).contains(&q) {
        return Err(Error::invalid_argument(format!(
            "quantile must lie in [0, 1], got {q}"
        )));
    }
    let mut data = valid_f64(values)?;
    if data.is_empty() {
        return Ok(Arc::new(Float64Array::from(vec![None::<f64>])));
    }
    data.sort_by(f64::total_cmp);
    let pos = q * (data.len() - 1) as f64;
    let lo = data[pos.floor() as usize];
    let hi = data[pos.ceil() as usize];
    let value = match interpolation {
        Interpolation::Lower => lo,
        Interpolation::Higher => hi,
        Interpolation::Nearest => data[pos.round_ties_even() as usize],
        Interpolation::Midpoint => (lo + hi) / 2.0,
        Interpolation::Linear => lo + (hi - lo) * (pos - pos.floor()),
    };
    Ok(Arc::new(Float64Array::from(vec![value])))
}

/// `any` over a boolean column.
///
/// With `ignore_nulls == false` the result follows Kleene logic: when nulls are
/// present and no `true` was seen the answer is unknown and a null is returned.
pub fn any(values: &BooleanArray, ignore_nulls: bool) -> ArrayRef {
    let result = bool_or(values).unwrap_or(false);
    if !ignore_nulls && values.null_count() > 0 && !result {
        return Arc::new(BooleanArray::from(vec![None]));
    }
    Arc::new(BooleanArray::from(vec![result]))
}

/// `all` over a boolean column; see [`any`] for the null handling.
pub fn all(values: &BooleanArray, ignore_nulls: bool) -> ArrayRef {
    let result = bool_and(values).unwrap_or(true);
    if !ignore_nulls && values.null_count() > 0 && result {
        return Arc::new(BooleanArray::from(vec![None]));
    }
    Arc::new(BooleanArray::from(vec![result]))
}
