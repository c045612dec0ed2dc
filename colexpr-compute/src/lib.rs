//! Columnar compute kernels backing expression evaluation.
//!
//! Every kernel consumes and produces Arrow arrays. Length-one arrays stand
//! in for scalars and are broadcast where a kernel pairs them with a longer
//! column. Kernels never inspect expression nodes; they only see data and
//! the options already validated by the caller.

pub mod cast;
pub mod distinct;
pub mod kernels;
pub mod operand;
pub mod reduce;
pub mod scan;
pub mod select;
pub mod sort;
pub mod strings;
pub mod temporal;
pub mod unary;

pub use cast::{can_cast, cast_to};
pub use distinct::{DuplicateKeep, distinct_indices, group_rows, is_in, scatter_flags, unique};
pub use kernels::{BinaryOperator, binary_operation, is_numeric, is_supported_operation};
pub use operand::broadcast;
pub use reduce::{GroupAggregation, Interpolation, reduce};
pub use scan::{ScanOp, inclusive_scan};
pub use select::{apply_mask, copy_if_else, drop_nulls, fill_null, gather};
pub use sort::{SortKeyOptions, sort, sort_by_key, sort_indices};
pub use temporal::{DateComponent, extract_datetime_component};
pub use unary::{MathOp, round, unary_math};
