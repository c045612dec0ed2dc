//! Grouped execution of colexpr expressions.
//!
//! [`GroupBy`] decomposes each output expression into per-group reduction
//! requests (see [`Expr::collect_agg`](colexpr_expr::Expr::collect_agg)),
//! runs them over the rows of every group and substitutes the per-group
//! results back into the expressions.

mod groupby;

pub use groupby::{GroupBy, GroupByOptions};
