//! colexpr: columnar expression evaluation over Apache Arrow.
//!
//! This crate is the entrypoint for the colexpr workspace. It re-exports the
//! expression model, the column and frame types it evaluates against, and the
//! grouped aggregation executor.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use arrow::array::{ArrayRef, Int64Array};
//! use arrow::datatypes::DataType;
//! use colexpr::{BinaryOperator, Column, DataFrame, ExecutionContext, Expr, NamedColumn};
//!
//! let a: ArrayRef = Arc::new(Int64Array::from(vec![1, 2, 3]));
//! let df = DataFrame::new(vec![NamedColumn::new("a", Column::new(a))]).unwrap();
//! let doubled = Expr::binop(
//!     DataType::Int64,
//!     BinaryOperator::Add,
//!     Expr::col(DataType::Int64, "a"),
//!     Expr::col(DataType::Int64, "a"),
//! )
//! .unwrap();
//! let out = doubled.evaluate(&df, ExecutionContext::Frame, None).unwrap();
//! assert_eq!(out.len(), 3);
//! ```
//!
//! # Architecture
//!
//! - **Errors** (`colexpr-result`): the shared error enum.
//! - **Columns** (`colexpr-column`): columns with sortedness metadata, frames.
//! - **Compute** (`colexpr-compute`): Arrow kernels behind a capability surface.
//! - **Expressions** (`colexpr-expr`): node model, evaluation, groupby decomposition.
//! - **Aggregation** (`colexpr-aggregate`): grouped execution.

pub use colexpr_aggregate::{GroupBy, GroupByOptions};
pub use colexpr_column::{
    Column, DataFrame, NamedColumn, NullOrder, Order, Sorted, Sortedness,
};
pub use colexpr_compute::{BinaryOperator, GroupAggregation, Interpolation, MathOp};
pub use colexpr_expr::{
    AggFunction, AggInfo, AggRequest, BooleanFunction, ClosedInterval, ExecutionContext, Expr,
    ExprKind, ExprMapping, ExprRef, LiteralValue, NamedExpr, RollingOptions, SortByOptions,
    SortOptions, StringFunction, TemporalFunction, UnaryFunction,
};
pub use colexpr_result::{Error, Result};

/// Lower-level building blocks.
pub mod compute {
    pub use colexpr_compute::*;
}
