use arrow::array::Array;
use arrow::datatypes::DataType;
use colexpr_column::{Column, DataFrame, Sorted, sort_order};
use colexpr_compute::{
    MathOp, ScanOp, cast_to, drop_nulls, fill_null, inclusive_scan, round, unary_math, unique,
};
use colexpr_result::{Error, Result};

use crate::context::ExecutionContext;
use crate::eval::ExprMapping;
use crate::expr::{Expr, ExprRef, expect_arity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryFunction {
    Math(MathOp),
    DropNulls,
    /// Replace nulls with the second child (a literal or any expression).
    FillNull,
    MaskNans,
    Round { decimals: u32 },
    SetSorted { descending: bool },
    Unique { maintain_order: bool },
    CumMin { reverse: bool },
    CumMax { reverse: bool },
    CumProd { reverse: bool },
    CumSum { reverse: bool },
}

impl UnaryFunction {
    pub fn name(&self) -> &'static str {
        match self {
            UnaryFunction::Math(op) => op.name(),
            UnaryFunction::DropNulls => "drop_nulls",
            UnaryFunction::FillNull => "fill_null",
            UnaryFunction::MaskNans => "mask_nans",
            UnaryFunction::Round { .. } => "round",
            UnaryFunction::SetSorted { .. } => "set_sorted",
            UnaryFunction::Unique { .. } => "unique",
            UnaryFunction::CumMin { .. } => "cum_min",
            UnaryFunction::CumMax { .. } => "cum_max",
            UnaryFunction::CumProd { .. } => "cum_prod",
            UnaryFunction::CumSum { .. } => "cum_sum",
        }
    }

    fn scan(&self) -> Option<(ScanOp, bool)> {
        match *self {
            UnaryFunction::CumMin { reverse } => Some((ScanOp::Min, reverse)),
            UnaryFunction::CumMax { reverse } => Some((ScanOp::Max, reverse)),
            UnaryFunction::CumProd { reverse } => Some((ScanOp::Product, reverse)),
            UnaryFunction::CumSum { reverse } => Some((ScanOp::Sum, reverse)),
            _ => None,
        }
    }

    /// Functions that change the number of rows or depend on row order
    /// across the whole column, and so have no per-group rewrite.
    pub fn is_groupby_unsupported(&self) -> bool {
        matches!(
            self,
            UnaryFunction::Unique { .. } | UnaryFunction::DropNulls
        ) || self.scan().is_some()
    }
}

/// Accumulator type used by a cumulative scan over `input`.
pub fn scan_accumulator_type(op: ScanOp, input: &DataType) -> DataType {
    match (op, input) {
        (ScanOp::Sum, DataType::Int8 | DataType::UInt8 | DataType::Int16 | DataType::UInt16) => {
            DataType::Int64
        }
        (ScanOp::Sum, DataType::Boolean) => DataType::UInt32,
        (
            ScanOp::Product,
            DataType::Int8
            | DataType::UInt8
            | DataType::Int16
            | DataType::UInt16
            | DataType::Int32
            | DataType::UInt32
            | DataType::Boolean,
        ) => DataType::Int64,
        (_, other) => other.clone(),
    }
}

pub(crate) fn validate(function: &UnaryFunction, children: &[ExprRef]) -> Result<()> {
    let name = function.name();
    match function {
        UnaryFunction::FillNull => expect_arity(name, children, 2),
        UnaryFunction::Math(MathOp::Not) => {
            expect_arity(name, children, 1)?;
            if *children[0].dtype() != DataType::Boolean {
                return Err(Error::unsupported(format!(
                    "not over {}",
                    children[0].dtype()
                )));
            }
            Ok(())
        }
        _ => {
            expect_arity(name, children, 1)?;
            if let Some((_, true)) = function.scan() {
                return Err(Error::unsupported(format!("{name} with reverse=true")));
            }
            Ok(())
        }
    }
}

pub(crate) fn evaluate(
    expr: &Expr,
    function: &UnaryFunction,
    df: &DataFrame,
    context: ExecutionContext,
    mapping: Option<&ExprMapping>,
) -> Result<Column> {
    let children = expr.children();
    let column = children[0].evaluate(df, context, mapping)?;
    match function {
        UnaryFunction::Math(op) => {
            let input = cast_to(column.array(), expr.dtype())?;
            Ok(Column::new(unary_math(&input, *op)?))
        }
        UnaryFunction::DropNulls => {
            Ok(Column::new(drop_nulls(column.array())?).sorted_like(&column))
        }
        UnaryFunction::FillNull => {
            let fill = match children[1].literal_value() {
                Some(value) => value.to_array(column.data_type())?,
                None => children[1].evaluate(df, context, mapping)?.into_array(),
            };
            Ok(Column::new(fill_null(column.array(), &fill)?))
        }
        UnaryFunction::MaskNans => column.mask_nans(),
        UnaryFunction::Round { decimals } => {
            Ok(Column::new(round(column.array(), *decimals)?).sorted_like(&column))
        }
        UnaryFunction::SetSorted { descending } => {
            let nulls_last = column.null_count() > 0 && column.array().is_null(column.len() - 1);
            let (order, null_order) = sort_order(&[*descending], &[nulls_last], 1)?;
            Ok(column.set_sorted(Sorted::Yes, order[0], null_order[0]))
        }
        UnaryFunction::Unique { maintain_order } => {
            if column.is_sorted() {
                Ok(Column::new(unique(column.array(), true)?).sorted_like(&column))
            } else {
                Ok(Column::new(unique(column.array(), *maintain_order)?))
            }
        }
        UnaryFunction::CumMin { .. }
        | UnaryFunction::CumMax { .. }
        | UnaryFunction::CumProd { .. }
        | UnaryFunction::CumSum { .. } => {
            let (op, _) = function
                .scan()
                .ok_or_else(|| Error::internal("scan function without scan operator"))?;
            let acc_type = scan_accumulator_type(op, column.data_type());
            let input = cast_to(column.array(), &acc_type)?;
            let out = inclusive_scan(&input, op)?;
            Ok(Column::new(cast_to(&out, expr.dtype())?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_widening() {
        assert_eq!(
            scan_accumulator_type(ScanOp::Sum, &DataType::Int8),
            DataType::Int64
        );
        assert_eq!(
            scan_accumulator_type(ScanOp::Sum, &DataType::Boolean),
            DataType::UInt32
        );
        assert_eq!(
            scan_accumulator_type(ScanOp::Sum, &DataType::Int32),
            DataType::Int32
        );
        assert_eq!(
            scan_accumulator_type(ScanOp::Product, &DataType::UInt32),
            DataType::Int64
        );
        assert_eq!(
            scan_accumulator_type(ScanOp::Max, &DataType::Int8),
            DataType::Int8
        );
    }

    #[test]
    fn groupby_support() {
        assert!(UnaryFunction::DropNulls.is_groupby_unsupported());
        assert!(UnaryFunction::CumSum { reverse: false }.is_groupby_unsupported());
        assert!(!UnaryFunction::Math(MathOp::Abs).is_groupby_unsupported());
    }
}
