//! Calendar and clock component extraction.
//!
//! Components are computed in the column's own timezone.

use std::sync::Arc;

use arrow::array::{ArrayRef, AsArray, Int32Array};
use arrow::compute::kernels::temporal::{DatePart, date_part};
use arrow::datatypes::{DataType, Int32Type};
use colexpr_result::{Error, Result};

/// A single component of a date or timestamp.
///
/// The sub-second components are each bounded to their own unit (0-999):
/// `Microsecond` does not include the milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateComponent {
    Year,
    Month,
    Day,
    /// ISO weekday, Monday = 1.
    Weekday,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl DateComponent {
    fn date_part(self) -> DatePart {
        match self {
            DateComponent::Year => DatePart::Year,
            DateComponent::Month => DatePart::Month,
            DateComponent::Day => DatePart::Day,
            DateComponent::Weekday => DatePart::DayOfWeekMonday0,
            DateComponent::Hour => DatePart::Hour,
            DateComponent::Minute => DatePart::Minute,
            DateComponent::Second => DatePart::Second,
            DateComponent::Millisecond => DatePart::Millisecond,
            DateComponent::Microsecond => DatePart::Microsecond,
            DateComponent::Nanosecond => DatePart::Nanosecond,
        }
    }

    fn needs_time(self) -> bool {
        !matches!(
            self,
            DateComponent::Year | DateComponent::Month | DateComponent::Day | DateComponent::Weekday
        )
    }
}

/// Extract `component` from a date or timestamp column as `Int32`.
pub fn extract_datetime_component(values: &ArrayRef, component: DateComponent) -> Result<ArrayRef> {
    match values.data_type() {
        DataType::Timestamp(..) => {}
        DataType::Date32 | DataType::Date64 if !component.needs_time() => {}
        other => {
            return Err(Error::unsupported(format!(
                "extracting {component:?} from {other}"
            )));
        }
    }
    let raw = date_part(values.as_ref(), component.date_part())?;
    let raw = raw.as_primitive::<Int32Type>();
    // date_part counts microseconds and nanoseconds from the start of the second.
    let out: Int32Array = match component {
        DateComponent::Weekday => raw.unary(|d| d + 1),
        DateComponent::Microsecond | DateComponent::Nanosecond => raw.unary(|v| v % 1_000),
        _ => raw.clone(),
    };
    Ok(Arc::new(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Date32Array, TimestampMicrosecondArray, TimestampNanosecondArray};

    fn component(values: &ArrayRef, c: DateComponent) -> Vec<Option<i32>> {
        extract_datetime_component(values, c)
            .unwrap()
            .as_primitive::<Int32Type>()
            .iter()
            .collect()
    }

    #[test]
    fn timestamp_components() {
        // 2024-01-02T03:04:05.006007008 (a Tuesday)
        let ns = 1_704_164_645_006_007_008i64;
        let values: ArrayRef = Arc::new(TimestampNanosecondArray::from(vec![Some(ns), None]));
        assert_eq!(component(&values, DateComponent::Year), vec![Some(2024), None]);
        assert_eq!(component(&values, DateComponent::Month)[0], Some(1));
        assert_eq!(component(&values, DateComponent::Day)[0], Some(2));
        assert_eq!(component(&values, DateComponent::Weekday)[0], Some(2));
        assert_eq!(component(&values, DateComponent::Hour)[0], Some(3));
        assert_eq!(component(&values, DateComponent::Minute)[0], Some(4));
        assert_eq!(component(&values, DateComponent::Second)[0], Some(5));
        assert_eq!(component(&values, DateComponent::Millisecond)[0], Some(6));
        assert_eq!(component(&values, DateComponent::Microsecond)[0], Some(7));
        assert_eq!(component(&values, DateComponent::Nanosecond)[0], Some(8));
    }

    #[test]
    fn dates_reject_clock_components() {
        let values: ArrayRef = Arc::new(Date32Array::from(vec![19_724]));
        assert_eq!(component(&values, DateComponent::Day), vec![Some(2)]);
        assert!(extract_datetime_component(&values, DateComponent::Hour).is_err());
    }

    #[test]
    fn zoned_timestamps_use_local_time() {
        // 2024-01-01T23:30:00Z is 2024-01-02T01:30 at +02:00.
        let us = 1_704_151_800_000_000i64;
        let values: ArrayRef =
            Arc::new(TimestampMicrosecondArray::from(vec![us]).with_timezone("+02:00"));
        assert_eq!(component(&values, DateComponent::Hour), vec![Some(1)]);
        assert_eq!(component(&values, DateComponent::Day), vec![Some(2)]);
        assert_eq!(component(&values, DateComponent::Minute), vec![Some(30)]);
    }
}
