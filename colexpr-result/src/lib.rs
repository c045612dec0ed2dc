//! Error types and result definitions for the colexpr expression engine.
//!
//! All crates in the workspace share a single error enum ([`Error`]) and the
//! [`Result<T>`] alias, so failures from Arrow kernels, node construction, and
//! evaluation propagate with `?` across crate boundaries.
//!
//! # Error Categories
//!
//! - **Unsupported constructs** ([`Error::Unsupported`]): raised at node
//!   construction, before any data is touched
//! - **Data-dependent failures** ([`Error::InvalidOperation`]): e.g. strict
//!   timestamp parsing
//! - **Bounds violations** ([`Error::OutOfBounds`]): gather indices outside
//!   the frame
//! - **Lookup failures** ([`Error::ColumnNotFound`]): unknown column names
//! - **Caller errors** ([`Error::InvalidArgumentError`]): malformed inputs
//! - **Backend errors** ([`Error::Arrow`]): kernel failures
//! - **Internal errors** ([`Error::Internal`]): defects

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
