//! Function-family nodes: each family is a closed enum of functions whose
//! options are validated when the node is built.

pub mod boolean;
pub mod string;
pub mod temporal;
pub mod unary;

pub use boolean::{BooleanFunction, ClosedInterval};
pub use string::StringFunction;
pub use temporal::TemporalFunction;
pub use unary::UnaryFunction;
