//! Reduction nodes.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, new_null_array};
use arrow::datatypes::DataType;
use colexpr_column::{Column, DataFrame};
use colexpr_compute::{GroupAggregation, Interpolation, cast_to, reduce};
use colexpr_result::{Error, Result};

use crate::context::ExecutionContext;
use crate::eval::ExprMapping;
use crate::expr::{Expr, ExprRef, expect_arity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggFunction {
    /// With `propagate_nans` any NaN makes the result NaN; otherwise NaNs are ignored.
    Min { propagate_nans: bool },
    Max { propagate_nans: bool },
    Median,
    NUnique,
    First,
    Last,
    Mean,
    Sum,
    Count,
    Std { ddof: u8 },
    Var { ddof: u8 },
    /// The quantile itself is the second child, a float literal.
    Quantile { interpolation: Interpolation },
}

impl AggFunction {
    /// Look up a reduction by name with default options.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name {
            "min" => AggFunction::Min {
                propagate_nans: false,
            },
            "max" => AggFunction::Max {
                propagate_nans: false,
            },
            "median" => AggFunction::Median,
            "n_unique" => AggFunction::NUnique,
            "first" => AggFunction::First,
            "last" => AggFunction::Last,
            "mean" => AggFunction::Mean,
            "sum" => AggFunction::Sum,
            "count" => AggFunction::Count,
            "std" => AggFunction::Std { ddof: 1 },
            "var" => AggFunction::Var { ddof: 1 },
            "quantile" => AggFunction::Quantile {
                interpolation: Interpolation::Nearest,
            },
            other => return Err(Error::unsupported(format!("aggregation {other}"))),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggFunction::Min { .. } => "min",
            AggFunction::Max { .. } => "max",
            AggFunction::Median => "median",
            AggFunction::NUnique => "n_unique",
            AggFunction::First => "first",
            AggFunction::Last => "last",
            AggFunction::Mean => "mean",
            AggFunction::Sum => "sum",
            AggFunction::Count => "count",
            AggFunction::Std { .. } => "std",
            AggFunction::Var { .. } => "var",
            AggFunction::Quantile { .. } => "quantile",
        }
    }

    pub fn propagates_nans(&self) -> bool {
        matches!(
            self,
            AggFunction::Min {
                propagate_nans: true
            } | AggFunction::Max {
                propagate_nans: true
            }
        )
    }

    pub fn is_min_or_max(&self) -> bool {
        matches!(self, AggFunction::Min { .. } | AggFunction::Max { .. })
    }
}

pub(crate) fn validate(function: &AggFunction, children: &[ExprRef]) -> Result<()> {
    if let AggFunction::Quantile { .. } = function {
        expect_arity("quantile", children, 2)?;
        quantile_value(&children[1])?;
        return Ok(());
    }
    expect_arity(function.name(), children, 1)
}

fn quantile_value(expr: &Expr) -> Result<f64> {
    let q = expr
        .literal_value()
        .and_then(|v| v.as_f64())
        .ok_or_else(|| Error::unsupported("quantile must be a numeric literal"))?;
    if !(0.0..=1.0).contains(&q) {
        return Err(Error::unsupported(format!("quantile {q} outside [0, 1]")));
    }
    Ok(q)
}

/// The per-group reduction implementing `function` on the node `expr`.
pub(crate) fn group_request(expr: &Expr, function: &AggFunction) -> Result<GroupAggregation> {
    Ok(match *function {
        AggFunction::Min { .. } => GroupAggregation::Min,
        AggFunction::Max { .. } => GroupAggregation::Max,
        AggFunction::Median => GroupAggregation::Median,
        AggFunction::NUnique => GroupAggregation::NUnique {
            include_nulls: true,
        },
        AggFunction::First => GroupAggregation::NthElement {
            n: 0,
            include_nulls: true,
        },
        AggFunction::Last => GroupAggregation::NthElement {
            n: -1,
            include_nulls: true,
        },
        AggFunction::Mean => GroupAggregation::Mean,
        AggFunction::Sum => GroupAggregation::Sum,
        AggFunction::Count => GroupAggregation::Count {
            include_nulls: false,
        },
        AggFunction::Std { ddof } => GroupAggregation::Std { ddof },
        AggFunction::Var { ddof } => GroupAggregation::Var { ddof },
        AggFunction::Quantile { interpolation } => GroupAggregation::Quantile {
            quantile: quantile_value(&expr.children()[1])?,
            interpolation,
        },
    })
}

fn nan_scalar(dtype: &DataType) -> Result<Column> {
    let nan: ArrayRef = Arc::new(Float64Array::from(vec![f64::NAN]));
    Ok(Column::new(cast_to(&nan, dtype)?))
}

pub(crate) fn evaluate(
    expr: &Expr,
    function: &AggFunction,
    df: &DataFrame,
    context: ExecutionContext,
    mapping: Option<&ExprMapping>,
) -> Result<Column> {
    if context != ExecutionContext::Frame {
        return Err(Error::unsupported(format!(
            "aggregation {} in {context} context",
            function.name()
        )));
    }
    let column = expr.children()[0].evaluate(df, context, mapping)?;
    let out = match function {
        AggFunction::Min { propagate_nans } | AggFunction::Max { propagate_nans } => {
            if *propagate_nans && column.nan_count() > 0 {
                return nan_scalar(expr.dtype());
            }
            let masked = column.mask_nans()?;
            reduce(masked.array(), &group_request(expr, function)?)?
        }
        AggFunction::First | AggFunction::Last => {
            let values = column.array();
            if values.is_empty() {
                new_null_array(values.data_type(), 1)
            } else if matches!(function, AggFunction::First) {
                values.slice(0, 1)
            } else {
                values.slice(values.len() - 1, 1)
            }
        }
        _ => reduce(column.array(), &group_request(expr, function)?)?,
    };
    Ok(Column::new(cast_to(&out, expr.dtype())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_set_of_names() {
        assert_eq!(AggFunction::from_name("std").unwrap(), AggFunction::Std { ddof: 1 });
        let err = AggFunction::from_name("implode").unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn nan_propagation_flag() {
        assert!(AggFunction::Max {
            propagate_nans: true
        }
        .propagates_nans());
        assert!(!AggFunction::Min {
            propagate_nans: false
        }
        .propagates_nans());
        assert!(!AggFunction::Sum.propagates_nans());
    }
}
