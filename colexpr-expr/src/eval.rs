//! Evaluation of expression nodes against a [`DataFrame`].

use std::sync::Arc;

use arrow::array::{ArrayRef, AsArray, Int64Array};
use colexpr_column::{Column, DataFrame, Sorted, sort_order};
use colexpr_compute::{
    SortKeyOptions, apply_mask, binary_operation, broadcast, cast_to, copy_if_else, gather, sort,
    sort_by_key,
};
use colexpr_result::{Error, Result};
use rustc_hash::FxHashMap;

use crate::agg;
use crate::context::ExecutionContext;
use crate::expr::{Expr, ExprKind, SortByOptions};
use crate::functions::{boolean, string, temporal, unary};

/// Precomputed results keyed by node identity. A node found here is not
/// evaluated; its mapped column is returned as is.
pub type ExprMapping = FxHashMap<crate::expr::ExprRef, Column>;

impl Expr {
    /// Evaluate this node over `df`.
    ///
    /// Children are evaluated recursively with the same `context` and
    /// `mapping`.
    pub fn evaluate(
        &self,
        df: &DataFrame,
        context: ExecutionContext,
        mapping: Option<&ExprMapping>,
    ) -> Result<Column> {
        if let Some(column) = mapping.and_then(|m| m.get(self)) {
            tracing::trace!(expr = %self, "substituted from mapping");
            return Ok(column.clone());
        }
        self.do_evaluate(df, context, mapping)
    }

    /// Evaluate every child in order.
    pub fn evaluate_children(
        &self,
        df: &DataFrame,
        context: ExecutionContext,
        mapping: Option<&ExprMapping>,
    ) -> Result<Vec<Column>> {
        self.children()
            .iter()
            .map(|child| child.evaluate(df, context, mapping))
            .collect()
    }

    fn do_evaluate(
        &self,
        df: &DataFrame,
        context: ExecutionContext,
        mapping: Option<&ExprMapping>,
    ) -> Result<Column> {
        let dtype = self.dtype();
        tracing::trace!(node = self.kind().name(), %context, "evaluating");
        match self.kind() {
            ExprKind::Literal(value) => Ok(Column::new(value.to_array(dtype)?)),
            ExprKind::LiteralColumn(array) => Ok(Column::new(cast_to(array, dtype)?)),
            ExprKind::Col(name) => Ok(df.column(name)?.clone()),
            ExprKind::Len => {
                let rows = i64::try_from(df.num_rows())
                    .map_err(|_| Error::internal("row count exceeds i64"))?;
                let len: ArrayRef = Arc::new(Int64Array::from(vec![rows]));
                Ok(Column::new(cast_to(&len, dtype)?))
            }
            ExprKind::BooleanFunction(f) => boolean::evaluate(self, f, df, context, mapping),
            ExprKind::StringFunction { function, pattern } => {
                string::evaluate(self, function, pattern.as_ref(), df, context, mapping)
            }
            ExprKind::TemporalFunction(f) => temporal::evaluate(self, f, df, context, mapping),
            ExprKind::UnaryFunction(f) => unary::evaluate(self, f, df, context, mapping),
            ExprKind::Agg(f) => agg::evaluate(self, f, df, context, mapping),
            ExprKind::Sort(options) => {
                let [column] = self.evaluate_array::<1>(df, context, mapping)?;
                let sorted = sort(
                    column.array(),
                    SortKeyOptions {
                        descending: options.descending,
                        nulls_last: options.nulls_last,
                    },
                    options.stable,
                )?;
                let (order, null_order) =
                    sort_order(&[options.descending], &[options.nulls_last], 1)?;
                Ok(Column::new(sorted).set_sorted(Sorted::Yes, order[0], null_order[0]))
            }
            ExprKind::SortBy(options) => {
                let columns = self.evaluate_children(df, context, mapping)?;
                let (values, keys) = columns
                    .split_first()
                    .ok_or_else(|| Error::internal("SortBy without children"))?;
                let keys: Vec<ArrayRef> = keys.iter().map(|c| c.array().clone()).collect();
                let key_options = sort_by_options(options, keys.len());
                Ok(Column::new(sort_by_key(
                    values.array(),
                    &keys,
                    &key_options,
                    options.stable,
                )?))
            }
            ExprKind::Gather => {
                let [values, indices] = self.evaluate_array::<2>(df, context, mapping)?;
                Ok(Column::new(gather(values.array(), indices.array())?))
            }
            ExprKind::Filter => {
                let [values, mask] = self.evaluate_array::<2>(df, context, mapping)?;
                let mask = if mask.is_scalar() && !values.is_scalar() {
                    broadcast(mask.array(), values.len())?
                } else {
                    mask.array().clone()
                };
                let mask = mask
                    .as_boolean_opt()
                    .ok_or_else(|| Error::invalid_argument("filter mask must be boolean"))?;
                let filtered = apply_mask(values.array(), mask)?;
                Ok(Column::new(filtered).sorted_like(&values))
            }
            ExprKind::Cast => {
                let [column] = self.evaluate_array::<1>(df, context, mapping)?;
                // Supported casts keep the relative order of values.
                Ok(Column::new(cast_to(column.array(), dtype)?).sorted_like(&column))
            }
            ExprKind::Ternary => {
                let [when, then, otherwise] = self.evaluate_array::<3>(df, context, mapping)?;
                Ok(Column::new(copy_if_else(
                    when.array(),
                    then.array(),
                    otherwise.array(),
                )?))
            }
            ExprKind::BinOp(op) => {
                let [left, right] = self.evaluate_array::<2>(df, context, mapping)?;
                Ok(Column::new(binary_operation(
                    left.array(),
                    right.array(),
                    *op,
                    dtype,
                )?))
            }
        }
    }

    fn evaluate_array<const N: usize>(
        &self,
        df: &DataFrame,
        context: ExecutionContext,
        mapping: Option<&ExprMapping>,
    ) -> Result<[Column; N]> {
        let columns = self.evaluate_children(df, context, mapping)?;
        columns.try_into().map_err(|columns: Vec<Column>| {
            Error::internal(format!(
                "{} expected {N} children, found {}",
                self.kind().name(),
                columns.len()
            ))
        })
    }
}

fn sort_by_options(options: &SortByOptions, num_keys: usize) -> Vec<SortKeyOptions> {
    let flag = |flags: &[bool], i: usize| {
        if flags.len() == 1 {
            flags[0]
        } else {
            flags.get(i).copied().unwrap_or_default()
        }
    };
    (0..num_keys)
        .map(|i| SortKeyOptions {
            descending: flag(&options.descending, i),
            nulls_last: flag(&options.nulls_last, i),
        })
        .collect()
}
