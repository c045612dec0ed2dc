use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray};
use arrow::compute::{cast, is_not_null, is_null, not};
use arrow::datatypes::{DataType, Float64Type};
use colexpr_column::{Column, DataFrame};
use colexpr_compute::reduce::{all, any};
use colexpr_compute::select::constant_bool;
use colexpr_compute::{
    BinaryOperator, DuplicateKeep, binary_operation, distinct_indices, is_in, scatter_flags,
};
use colexpr_result::{Error, Result};

use crate::context::ExecutionContext;
use crate::eval::ExprMapping;
use crate::expr::{Expr, ExprRef, expect_arity};

/// Which bounds of an `is_between` range are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClosedInterval {
    None,
    Left,
    Right,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanFunction {
    Any { ignore_nulls: bool },
    All { ignore_nulls: bool },
    IsNull,
    IsNotNull,
    IsNan,
    IsNotNan,
    IsFinite,
    IsInfinite,
    IsFirstDistinct,
    IsLastDistinct,
    IsUnique,
    IsDuplicated,
    AllHorizontal,
    AnyHorizontal,
    IsIn,
    IsBetween { closed: ClosedInterval },
    Not,
}

impl BooleanFunction {
    pub fn name(&self) -> &'static str {
        match self {
            BooleanFunction::Any { .. } => "any",
            BooleanFunction::All { .. } => "all",
            BooleanFunction::IsNull => "is_null",
            BooleanFunction::IsNotNull => "is_not_null",
            BooleanFunction::IsNan => "is_nan",
            BooleanFunction::IsNotNan => "is_not_nan",
            BooleanFunction::IsFinite => "is_finite",
            BooleanFunction::IsInfinite => "is_infinite",
            BooleanFunction::IsFirstDistinct => "is_first_distinct",
            BooleanFunction::IsLastDistinct => "is_last_distinct",
            BooleanFunction::IsUnique => "is_unique",
            BooleanFunction::IsDuplicated => "is_duplicated",
            BooleanFunction::AllHorizontal => "all_horizontal",
            BooleanFunction::AnyHorizontal => "any_horizontal",
            BooleanFunction::IsIn => "is_in",
            BooleanFunction::IsBetween { .. } => "is_between",
            BooleanFunction::Not => "not",
        }
    }
}

pub(crate) fn validate(
    function: &BooleanFunction,
    dtype: &DataType,
    children: &[ExprRef],
) -> Result<()> {
    let name = function.name();
    if *dtype != DataType::Boolean {
        return Err(Error::unsupported(format!(
            "{name} must produce Boolean, not {dtype}"
        )));
    }
    match function {
        BooleanFunction::AllHorizontal | BooleanFunction::AnyHorizontal => {
            if children.is_empty() {
                return Err(Error::invalid_argument(format!("{name} needs at least one input")));
            }
            Ok(())
        }
        BooleanFunction::IsIn => {
            expect_arity(name, children, 2)?;
            if children[0].dtype() != children[1].dtype() {
                return Err(Error::unsupported(format!(
                    "is_in over mismatched types {} and {}",
                    children[0].dtype(),
                    children[1].dtype()
                )));
            }
            Ok(())
        }
        BooleanFunction::IsBetween { .. } => expect_arity(name, children, 3),
        BooleanFunction::Any { .. } | BooleanFunction::All { .. } | BooleanFunction::Not => {
            expect_arity(name, children, 1)?;
            if *children[0].dtype() != DataType::Boolean {
                return Err(Error::unsupported(format!(
                    "{name} over {}",
                    children[0].dtype()
                )));
            }
            Ok(())
        }
        _ => expect_arity(name, children, 1),
    }
}

fn boolean(column: &Column) -> Result<&BooleanArray> {
    column
        .array()
        .as_boolean_opt()
        .ok_or_else(|| Error::internal(format!("expected Boolean, got {}", column.data_type())))
}

/// Apply `f` to every valid float, keeping nulls.
fn float_predicate(array: &ArrayRef, f: fn(f64) -> bool) -> Result<BooleanArray> {
    let floats = cast(array, &DataType::Float64)?;
    Ok(floats
        .as_primitive::<Float64Type>()
        .iter()
        .map(|v| v.map(f))
        .collect())
}

fn combine(columns: &[Column], op: BinaryOperator) -> Result<ArrayRef> {
    let mut iter = columns.iter();
    let first = iter
        .next()
        .ok_or_else(|| Error::internal("horizontal reduction without inputs"))?;
    let mut acc = first.array().clone();
    for column in iter {
        acc = binary_operation(&acc, column.array(), op, &DataType::Boolean)?;
    }
    Ok(acc)
}

pub(crate) fn evaluate(
    expr: &Expr,
    function: &BooleanFunction,
    df: &DataFrame,
    context: ExecutionContext,
    mapping: Option<&ExprMapping>,
) -> Result<Column> {
    let children = expr.children();
    // Non-float inputs can hold neither NaN nor infinity.
    if matches!(
        function,
        BooleanFunction::IsFinite | BooleanFunction::IsInfinite
    ) && !children[0].dtype().is_floating()
    {
        let value = matches!(function, BooleanFunction::IsFinite);
        return Ok(Column::new(constant_bool(value, df.num_rows())));
    }

    let columns = expr.evaluate_children(df, context, mapping)?;
    let column = &columns[0];
    let array: ArrayRef = match function {
        BooleanFunction::Any { ignore_nulls } => any(boolean(column)?, *ignore_nulls),
        BooleanFunction::All { ignore_nulls } => all(boolean(column)?, *ignore_nulls),
        BooleanFunction::IsNull => Arc::new(is_null(column.array().as_ref())?),
        BooleanFunction::IsNotNull => Arc::new(is_not_null(column.array().as_ref())?),
        BooleanFunction::IsNan | BooleanFunction::IsNotNan => {
            let nans = match column.nan_mask() {
                Some(mask) => mask,
                None => (0..column.len())
                    .map(|i| column.array().is_valid(i).then_some(false))
                    .collect(),
            };
            if matches!(function, BooleanFunction::IsNan) {
                Arc::new(nans)
            } else {
                Arc::new(not(&nans)?)
            }
        }
        BooleanFunction::IsFinite => Arc::new(float_predicate(column.array(), f64::is_finite)?),
        BooleanFunction::IsInfinite => {
            Arc::new(float_predicate(column.array(), f64::is_infinite)?)
        }
        BooleanFunction::IsFirstDistinct
        | BooleanFunction::IsLastDistinct
        | BooleanFunction::IsUnique
        | BooleanFunction::IsDuplicated => {
            let keep = match function {
                BooleanFunction::IsFirstDistinct => DuplicateKeep::First,
                BooleanFunction::IsLastDistinct => DuplicateKeep::Last,
                _ => DuplicateKeep::None,
            };
            let indices = distinct_indices(std::slice::from_ref(column.array()), keep)?;
            let value = !matches!(function, BooleanFunction::IsDuplicated);
            Arc::new(scatter_flags(column.len(), &indices, value))
        }
        BooleanFunction::AllHorizontal => combine(&columns, BinaryOperator::NullLogicalAnd)?,
        BooleanFunction::AnyHorizontal => combine(&columns, BinaryOperator::NullLogicalOr)?,
        BooleanFunction::IsIn => Arc::new(is_in(column.array(), columns[1].array())?),
        BooleanFunction::IsBetween { closed } => {
            let (lower_op, upper_op) = match closed {
                ClosedInterval::None => (BinaryOperator::Gt, BinaryOperator::Lt),
                ClosedInterval::Left => (BinaryOperator::GtEq, BinaryOperator::Lt),
                ClosedInterval::Right => (BinaryOperator::Gt, BinaryOperator::LtEq),
                ClosedInterval::Both => (BinaryOperator::GtEq, BinaryOperator::LtEq),
            };
            let lower =
                binary_operation(column.array(), columns[1].array(), lower_op, &DataType::Boolean)?;
            let upper =
                binary_operation(column.array(), columns[2].array(), upper_op, &DataType::Boolean)?;
            binary_operation(&lower, &upper, BinaryOperator::NullLogicalAnd, &DataType::Boolean)?
        }
        BooleanFunction::Not => Arc::new(not(boolean(column)?)?),
    };
    Ok(Column::new(array))
}
