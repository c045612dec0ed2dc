use std::fmt;
use thiserror::Error;

/// Unified error type for all colexpr operations.
///
/// Every crate in the workspace returns this enum so that failures from the
/// Arrow kernels, node construction, and evaluation propagate through `?`
/// without conversion layers.
///
/// # Error Handling Strategy
///
/// Nothing in the evaluator retries or recovers locally. Construction-time
/// failures ([`Error::Unsupported`]) are raised before any data is touched,
/// so a caller can validate a whole expression tree up front and fall back to
/// another engine. Data-dependent failures ([`Error::InvalidOperation`],
/// [`Error::OutOfBounds`]) are raised during evaluation and no partial result
/// is returned.
///
/// # Thread Safety
///
/// `Error` implements `Send` and `Sync`.
#[derive(Error, Debug)]
pub enum Error {
    /// Arrow library error raised by a columnar kernel.
    ///
    /// This error occurs when:
    /// - A cast between Arrow data types fails
    /// - A compute kernel rejects its inputs (length mismatch, overflow)
    /// - Building an Arrow array from invalid parts
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An expression node, option combination, or nesting pattern that the
    /// engine does not implement.
    ///
    /// Raised from node constructors (and from `collect_agg` for nesting
    /// patterns) so that unsupported queries fail during tree building
    /// rather than mid-evaluation.
    ///
    /// # Recovery
    ///
    /// The query cannot run on this engine. Callers typically report the
    /// message or route the query to a different executor.
    #[error("unsupported expression: {0}")]
    Unsupported(String),

    /// Data-dependent evaluation failure.
    ///
    /// For example, strict timestamp parsing when at least one row does not
    /// match the format. Only raised after inspecting actual data.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Gather indices outside `[-n, n)` for a values column of `n` rows.
    #[error("index out of bounds: {0}")]
    OutOfBounds(String),

    /// Column reference that the input frame does not contain.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// Invalid caller input or API parameter.
    ///
    /// This error indicates a problem with arguments passed to colexpr APIs:
    /// - Columns of differing lengths assembled into one frame
    /// - Wrong number of children for a node kind
    /// - Literal values that cannot be represented in the declared type
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Internal error indicating a bug or unexpected state.
    ///
    /// This error should never occur during normal operation. It marks
    /// branches guarded by construction-time validation; reaching one means
    /// the validation and evaluation rules have drifted apart.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create an [`Error::Unsupported`] from any displayable message.
    ///
    /// # Examples
    ///
    /// ```
    /// use colexpr_result::Error;
    ///
    /// let err = Error::unsupported("Rolling window not implemented");
    /// assert!(matches!(err, Error::Unsupported(msg) if msg.contains("Rolling")));
    /// ```
    #[inline]
    pub fn unsupported<M: fmt::Display>(msg: M) -> Self {
        Error::Unsupported(msg.to_string())
    }

    /// Create an [`Error::Internal`] from any displayable message.
    #[inline]
    pub fn internal<M: fmt::Display>(msg: M) -> Self {
        Error::Internal(msg.to_string())
    }

    /// Create an [`Error::InvalidArgumentError`] from any displayable message.
    #[inline]
    pub fn invalid_argument<M: fmt::Display>(msg: M) -> Self {
        Error::InvalidArgumentError(msg.to_string())
    }

    /// Returns `true` for failures raised while building an expression tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use colexpr_result::Error;
    ///
    /// assert!(Error::unsupported("x").is_unsupported());
    /// assert!(!Error::internal("x").is_unsupported());
    /// ```
    #[inline]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported(_))
    }
}
