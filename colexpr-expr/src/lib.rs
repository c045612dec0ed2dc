//! Typed expression trees over columnar data.
//!
//! Nodes are immutable and compared structurally; see [`Expr`]. Trees are
//! evaluated against a [`DataFrame`](colexpr_column::DataFrame) with
//! [`Expr::evaluate`], or decomposed into per-group requests with
//! [`Expr::collect_agg`] for grouped execution.

pub mod agg;
pub mod collect;
pub mod context;
pub mod eval;
pub mod expr;
mod format;
pub mod functions;
pub mod literal;
pub mod named;

pub use agg::AggFunction;
pub use collect::{AggInfo, AggRequest};
pub use context::ExecutionContext;
pub use eval::ExprMapping;
pub use expr::{Expr, ExprKind, ExprRef, RollingOptions, SortByOptions, SortOptions};
pub use functions::{
    BooleanFunction, ClosedInterval, StringFunction, TemporalFunction, UnaryFunction,
};
pub use literal::LiteralValue;
pub use named::NamedExpr;
