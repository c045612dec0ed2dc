use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array};
use arrow::datatypes::DataType;
use colexpr_column::{Column, DataFrame};
use colexpr_compute::{
    BinaryOperator, DateComponent, binary_operation, cast_to, extract_datetime_component,
};
use colexpr_result::{Error, Result};

use crate::context::ExecutionContext;
use crate::eval::ExprMapping;
use crate::expr::{Expr, ExprRef, expect_arity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalFunction {
    Year,
    Month,
    Day,
    WeekDay,
    Hour,
    Minute,
    Second,
    Millisecond,
    /// Total microseconds within the second.
    Microsecond,
    /// Total nanoseconds within the second.
    Nanosecond,
}

impl TemporalFunction {
    pub fn name(&self) -> &'static str {
        match self {
            TemporalFunction::Year => "year",
            TemporalFunction::Month => "month",
            TemporalFunction::Day => "day",
            TemporalFunction::WeekDay => "weekday",
            TemporalFunction::Hour => "hour",
            TemporalFunction::Minute => "minute",
            TemporalFunction::Second => "second",
            TemporalFunction::Millisecond => "millisecond",
            TemporalFunction::Microsecond => "microsecond",
            TemporalFunction::Nanosecond => "nanosecond",
        }
    }

    fn component(self) -> DateComponent {
        match self {
            TemporalFunction::Year => DateComponent::Year,
            TemporalFunction::Month => DateComponent::Month,
            TemporalFunction::Day => DateComponent::Day,
            TemporalFunction::WeekDay => DateComponent::Weekday,
            TemporalFunction::Hour => DateComponent::Hour,
            TemporalFunction::Minute => DateComponent::Minute,
            TemporalFunction::Second => DateComponent::Second,
            TemporalFunction::Millisecond => DateComponent::Millisecond,
            TemporalFunction::Microsecond => DateComponent::Microsecond,
            TemporalFunction::Nanosecond => DateComponent::Nanosecond,
        }
    }
}

pub(crate) fn validate(function: &TemporalFunction, children: &[ExprRef]) -> Result<()> {
    expect_arity(function.name(), children, 1)?;
    match children[0].dtype() {
        DataType::Timestamp(..) => Ok(()),
        DataType::Date32 | DataType::Date64
            if matches!(
                function,
                TemporalFunction::Year
                    | TemporalFunction::Month
                    | TemporalFunction::Day
                    | TemporalFunction::WeekDay
            ) =>
        {
            Ok(())
        }
        other => Err(Error::unsupported(format!(
            "{} over {other}",
            function.name()
        ))),
    }
}

/// `sum(component * scale)` over the given sub-second components, in `Int64`.
fn scaled_sum(values: &ArrayRef, parts: &[(DateComponent, i64)]) -> Result<ArrayRef> {
    let mut total: Option<ArrayRef> = None;
    for &(component, scale) in parts {
        let part = cast_to(&extract_datetime_component(values, component)?, &DataType::Int64)?;
        let scale: ArrayRef = Arc::new(Int64Array::from(vec![scale]));
        let scaled = binary_operation(&part, &scale, BinaryOperator::Mul, &DataType::Int64)?;
        total = Some(match total {
            None => scaled,
            Some(acc) => binary_operation(&acc, &scaled, BinaryOperator::Add, &DataType::Int64)?,
        });
    }
    total.ok_or_else(|| Error::internal("no components to combine"))
}

pub(crate) fn evaluate(
    expr: &Expr,
    function: &TemporalFunction,
    df: &DataFrame,
    context: ExecutionContext,
    mapping: Option<&ExprMapping>,
) -> Result<Column> {
    let column = expr.children()[0].evaluate(df, context, mapping)?;
    let values = column.array();
    let out = match function {
        TemporalFunction::Microsecond => scaled_sum(
            values,
            &[
                (DateComponent::Millisecond, 1_000),
                (DateComponent::Microsecond, 1),
            ],
        )?,
        TemporalFunction::Nanosecond => scaled_sum(
            values,
            &[
                (DateComponent::Millisecond, 1_000_000),
                (DateComponent::Microsecond, 1_000),
                (DateComponent::Nanosecond, 1),
            ],
        )?,
        other => extract_datetime_component(values, other.component())?,
    };
    Ok(Column::new(cast_to(&out, expr.dtype())?))
}
