//! Type conversion capability table.

use arrow::array::ArrayRef;
use arrow::compute::{can_cast_types, cast};
use arrow::datatypes::DataType;
use colexpr_result::{Error, Result};

use crate::kernels::is_numeric;

fn is_temporal(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Timestamp(..) | DataType::Date32 | DataType::Date64 | DataType::Duration(_)
    )
}

fn is_string(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View)
}

/// Whether a column of type `from` may be converted to `to`.
///
/// Allowed: identity, anything from `Null`, numeric and boolean conversions,
/// numbers to and from strings, and unit changes within the temporal types.
pub fn can_cast(from: &DataType, to: &DataType) -> bool {
    if from == to || *from == DataType::Null {
        return true;
    }
    let family_ok = match (from, to) {
        (f, t) if (is_numeric(f) || *f == DataType::Boolean)
            && (is_numeric(t) || *t == DataType::Boolean) => true,
        (f, t) if is_string(f) && (is_numeric(t) || is_string(t)) => true,
        (f, t) if is_numeric(f) && is_string(t) => true,
        (DataType::Timestamp(..), DataType::Timestamp(..) | DataType::Date32 | DataType::Date64) => {
            true
        }
        (DataType::Date32 | DataType::Date64, DataType::Timestamp(..) | DataType::Date32 | DataType::Date64) => {
            true
        }
        (DataType::Duration(_), DataType::Duration(_)) => true,
        (f, t) if is_temporal(f) && t.is_integer() => true,
        _ => false,
    };
    family_ok && can_cast_types(from, to)
}

/// Convert `array` to `to`, skipping the kernel when the type already matches.
pub fn cast_to(array: &ArrayRef, to: &DataType) -> Result<ArrayRef> {
    if array.data_type() == to {
        return Ok(array.clone());
    }
    if !can_cast(array.data_type(), to) {
        return Err(Error::unsupported(format!(
            "cast from {} to {to}",
            array.data_type()
        )));
    }
    Ok(cast(array, to)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, AsArray, Int32Array, StringArray};
    use arrow::datatypes::{Int64Type, TimeUnit};
    use std::sync::Arc;

    #[test]
    fn capability_table() {
        assert!(can_cast(&DataType::Int32, &DataType::Int64));
        assert!(can_cast(&DataType::Utf8, &DataType::Float64));
        assert!(can_cast(&DataType::Boolean, &DataType::UInt8));
        assert!(can_cast(
            &DataType::Timestamp(TimeUnit::Millisecond, None),
            &DataType::Timestamp(TimeUnit::Microsecond, None)
        ));
        assert!(!can_cast(&DataType::Utf8, &DataType::Date32));
        assert!(!can_cast(&DataType::Float64, &DataType::Duration(TimeUnit::Second)));
    }

    #[test]
    fn cast_to_widens_and_parses() {
        let ints: ArrayRef = Arc::new(Int32Array::from(vec![Some(1), None]));
        let wide = cast_to(&ints, &DataType::Int64).unwrap();
        assert_eq!(wide.as_primitive::<Int64Type>().value(0), 1);
        assert!(wide.is_null(1));

        let text: ArrayRef = Arc::new(StringArray::from(vec!["7", "42"]));
        let parsed = cast_to(&text, &DataType::Int64).unwrap();
        assert_eq!(parsed.as_primitive::<Int64Type>().values(), &[7, 42]);

        assert!(cast_to(&text, &DataType::Date32).unwrap_err().is_unsupported());
    }
}
