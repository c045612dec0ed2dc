use std::fmt;

/// Where an expression is being evaluated.
///
/// Aggregations may only be evaluated directly in [`ExecutionContext::Frame`];
/// under a groupby their per-group results are supplied through the
/// substitution mapping instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionContext {
    #[default]
    Frame,
    GroupBy,
    Rolling,
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExecutionContext::Frame => "frame",
            ExecutionContext::GroupBy => "groupby",
            ExecutionContext::Rolling => "rolling",
        })
    }
}
