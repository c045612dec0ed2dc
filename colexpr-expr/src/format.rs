//! Field rendering for the canonical node repr.

use crate::expr::ExprKind;

/// Append the non-child fields of `kind` to `args`.
pub(crate) fn push_fields(kind: &ExprKind, args: &mut Vec<String>) {
    match kind {
        ExprKind::Literal(value) => args.push(value.to_string()),
        ExprKind::LiteralColumn(array) => args.push(format!("{array:?}")),
        ExprKind::Col(name) => args.push(format!("{name:?}")),
        ExprKind::BooleanFunction(f) => args.push(format!("{f:?}")),
        ExprKind::StringFunction { function, .. } => args.push(format!("{function:?}")),
        ExprKind::TemporalFunction(f) => args.push(format!("{f:?}")),
        ExprKind::UnaryFunction(f) => args.push(format!("{f:?}")),
        ExprKind::Sort(options) => args.push(format!("{options:?}")),
        ExprKind::SortBy(options) => args.push(format!("{options:?}")),
        ExprKind::Agg(f) => args.push(format!("{f:?}")),
        ExprKind::BinOp(op) => args.push(op.name().to_string()),
        ExprKind::Len | ExprKind::Gather | ExprKind::Filter | ExprKind::Cast | ExprKind::Ternary => {}
    }
}
