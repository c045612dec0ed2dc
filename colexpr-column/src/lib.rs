//! Evaluated columns and the frames they live in.
//!
//! A [`Column`] wraps an Arrow [`ArrayRef`](arrow::array::ArrayRef) together
//! with cached metadata the expression evaluator relies on: sortedness flags
//! and a lazily computed NaN count. A [`DataFrame`] is an ordered, name-indexed
//! set of equal-length columns.

pub mod column;
pub mod frame;
pub mod sorting;

pub use column::{Column, NamedColumn};
pub use frame::DataFrame;
pub use sorting::{NullOrder, Order, Sorted, Sortedness, sort_order};
