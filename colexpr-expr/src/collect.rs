//! Decomposition of expressions into per-group aggregation requests.
//!
//! A groupby evaluates each request on the rows of every group, then feeds
//! the per-group results back into the expression through an
//! [`ExprMapping`](crate::eval::ExprMapping) keyed by the request's owner.

use colexpr_compute::GroupAggregation;
use colexpr_result::{Error, Result};

use crate::agg;
use crate::expr::{Expr, ExprKind, ExprRef};
use crate::functions::UnaryFunction;

/// One per-group reduction.
#[derive(Debug, Clone)]
pub struct AggRequest {
    /// Evaluated over the whole frame before grouping. `None` reduces the
    /// group itself (only its size is observed).
    pub pre_eval: Option<ExprRef>,
    pub request: GroupAggregation,
    /// The node whose value the per-group result stands in for.
    pub owner: ExprRef,
}

#[derive(Debug, Clone, Default)]
pub struct AggInfo {
    pub requests: Vec<AggRequest>,
}

impl AggInfo {
    fn single(pre_eval: Option<ExprRef>, request: GroupAggregation, owner: ExprRef) -> Self {
        Self {
            requests: vec![AggRequest {
                pre_eval,
                request,
                owner,
            }],
        }
    }

    fn collect_list(expr: &ExprRef) -> Self {
        Self::single(
            Some(expr.clone()),
            GroupAggregation::CollectList,
            expr.clone(),
        )
    }
}

impl Expr {
    /// The aggregation requests needed to evaluate this node under a groupby.
    ///
    /// `depth` counts enclosing aggregations; nested aggregations are
    /// rejected.
    pub fn collect_agg(self: &ExprRef, depth: usize) -> Result<AggInfo> {
        match self.kind() {
            ExprKind::Col(_) => Ok(AggInfo::collect_list(self)),
            ExprKind::Literal(_) | ExprKind::LiteralColumn(_) => Ok(AggInfo::default()),
            ExprKind::Len => Ok(AggInfo::single(
                None,
                GroupAggregation::Count {
                    include_nulls: true,
                },
                self.clone(),
            )),
            ExprKind::Cast => self.children()[0].collect_agg(depth),
            ExprKind::UnaryFunction(f) => {
                if f.is_groupby_unsupported() {
                    return Err(Error::unsupported(format!("{} in groupby", f.name())));
                }
                if depth == 1 {
                    Ok(AggInfo::collect_list(self))
                } else {
                    self.children()[0].collect_agg(depth)
                }
            }
            ExprKind::BinOp(_) => {
                if depth == 1 {
                    return Ok(AggInfo::collect_list(self));
                }
                let mut requests = self.children()[0].collect_agg(depth)?.requests;
                requests.extend(self.children()[1].collect_agg(depth)?.requests);
                if requests.iter().all(|r| r.request.is_collect_list()) {
                    Ok(AggInfo::collect_list(self))
                } else {
                    Ok(AggInfo { requests })
                }
            }
            ExprKind::Agg(function) => {
                if depth >= 1 {
                    return Err(Error::unsupported("Nested aggregations in groupby"));
                }
                if function.propagates_nans() {
                    return Err(Error::unsupported(format!(
                        "NaN-propagating {} in groupby",
                        function.name()
                    )));
                }
                let child = &self.children()[0];
                let mut inner = child.collect_agg(depth + 1)?.requests;
                if inner.len() != 1 {
                    return Err(Error::unsupported(format!(
                        "{} over an expression with {} aggregation inputs",
                        function.name(),
                        inner.len()
                    )));
                }
                let AggRequest { mut pre_eval, .. } = inner.remove(0);
                let request = agg::group_request(self, function)?;
                // The grouped input decides whether NaNs can appear, not the result.
                if function.is_min_or_max() {
                    pre_eval = pre_eval
                        .map(|value| {
                            if value.dtype().is_floating() {
                                Expr::unary_function(
                                    value.dtype().clone(),
                                    UnaryFunction::MaskNans,
                                    vec![value],
                                )
                            } else {
                                Ok(value)
                            }
                        })
                        .transpose()?;
                }
                Ok(AggInfo::single(pre_eval, request, self.clone()))
            }
            other => Err(Error::unsupported(format!(
                "{} in groupby",
                other.name()
            ))),
        }
    }
}
