//! Immutable expression nodes with structural identity.
//!
//! A node is `(dtype, kind, children)`. Two nodes are equal when their output
//! types, kinds (including every option) and children are equal, recursively.
//! Hash and repr are computed on first use and cached on the node; nodes are
//! never mutated after construction.
//!
//! Every constructor validates the node before returning it, so a tree that
//! builds successfully only contains operations the evaluator implements.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use arrow::array::ArrayRef;
use arrow::datatypes::DataType;
use colexpr_compute::{BinaryOperator, can_cast, is_supported_operation};
use colexpr_result::{Error, Result};
use regex::Regex;
use rustc_hash::FxHasher;

use crate::agg::{self, AggFunction};
use crate::functions::{
    BooleanFunction, StringFunction, TemporalFunction, UnaryFunction, boolean, string, temporal,
    unary,
};
use crate::literal::LiteralValue;

pub type ExprRef = Arc<Expr>;

/// Options of a single-key sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SortOptions {
    pub stable: bool,
    pub nulls_last: bool,
    pub descending: bool,
}

/// Options of a multi-key sort; a single flag applies to every key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SortByOptions {
    pub stable: bool,
    pub nulls_last: Vec<bool>,
    pub descending: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RollingOptions {
    pub window_size: usize,
    pub min_periods: usize,
    pub center: bool,
}

/// The kind of a node together with its non-child fields.
#[derive(Clone)]
pub enum ExprKind {
    Literal(LiteralValue),
    /// A pre-built column. Identity is the identity of the stored array.
    LiteralColumn(ArrayRef),
    Col(String),
    Len,
    BooleanFunction(BooleanFunction),
    StringFunction {
        function: StringFunction,
        /// Compiled at construction for regex `contains`; not part of identity.
        pattern: Option<Regex>,
    },
    TemporalFunction(TemporalFunction),
    UnaryFunction(UnaryFunction),
    Sort(SortOptions),
    /// Children: the column to reorder, then one or more sort keys.
    SortBy(SortByOptions),
    /// Children: values, indices.
    Gather,
    /// Children: values, boolean mask.
    Filter,
    Cast,
    Agg(AggFunction),
    /// Children: predicate, then, otherwise.
    Ternary,
    BinOp(BinaryOperator),
}

impl ExprKind {
    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::Literal(_) => "Literal",
            ExprKind::LiteralColumn(_) => "LiteralColumn",
            ExprKind::Col(_) => "Col",
            ExprKind::Len => "Len",
            ExprKind::BooleanFunction(_) => "BooleanFunction",
            ExprKind::StringFunction { .. } => "StringFunction",
            ExprKind::TemporalFunction(_) => "TemporalFunction",
            ExprKind::UnaryFunction(_) => "UnaryFunction",
            ExprKind::Sort(_) => "Sort",
            ExprKind::SortBy(_) => "SortBy",
            ExprKind::Gather => "Gather",
            ExprKind::Filter => "Filter",
            ExprKind::Cast => "Cast",
            ExprKind::Agg(_) => "Agg",
            ExprKind::Ternary => "Ternary",
            ExprKind::BinOp(_) => "BinOp",
        }
    }
}

impl PartialEq for ExprKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ExprKind::Literal(a), ExprKind::Literal(b)) => a == b,
            (ExprKind::LiteralColumn(a), ExprKind::LiteralColumn(b)) => Arc::ptr_eq(a, b),
            (ExprKind::Col(a), ExprKind::Col(b)) => a == b,
            (ExprKind::Len, ExprKind::Len)
            | (ExprKind::Gather, ExprKind::Gather)
            | (ExprKind::Filter, ExprKind::Filter)
            | (ExprKind::Cast, ExprKind::Cast)
            | (ExprKind::Ternary, ExprKind::Ternary) => true,
            (ExprKind::BooleanFunction(a), ExprKind::BooleanFunction(b)) => a == b,
            (
                ExprKind::StringFunction { function: a, .. },
                ExprKind::StringFunction { function: b, .. },
            ) => a == b,
            (ExprKind::TemporalFunction(a), ExprKind::TemporalFunction(b)) => a == b,
            (ExprKind::UnaryFunction(a), ExprKind::UnaryFunction(b)) => a == b,
            (ExprKind::Sort(a), ExprKind::Sort(b)) => a == b,
            (ExprKind::SortBy(a), ExprKind::SortBy(b)) => a == b,
            (ExprKind::Agg(a), ExprKind::Agg(b)) => a == b,
            (ExprKind::BinOp(a), ExprKind::BinOp(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ExprKind {}

impl Hash for ExprKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ExprKind::Literal(v) => v.hash(state),
            ExprKind::LiteralColumn(a) => (Arc::as_ptr(a) as *const () as usize).hash(state),
            ExprKind::Col(name) => name.hash(state),
            ExprKind::Len
            | ExprKind::Gather
            | ExprKind::Filter
            | ExprKind::Cast
            | ExprKind::Ternary => {}
            ExprKind::BooleanFunction(f) => f.hash(state),
            ExprKind::StringFunction { function, .. } => function.hash(state),
            ExprKind::TemporalFunction(f) => f.hash(state),
            ExprKind::UnaryFunction(f) => f.hash(state),
            ExprKind::Sort(o) => o.hash(state),
            ExprKind::SortBy(o) => o.hash(state),
            ExprKind::Agg(f) => f.hash(state),
            ExprKind::BinOp(op) => op.hash(state),
        }
    }
}

/// An expression node. Build nodes through the constructors on this type.
#[derive(Clone)]
pub struct Expr {
    dtype: DataType,
    kind: ExprKind,
    children: Vec<ExprRef>,
    hash: OnceLock<u64>,
    repr: OnceLock<String>,
}

pub(crate) fn expect_arity(name: &str, children: &[ExprRef], n: usize) -> Result<()> {
    if children.len() != n {
        return Err(Error::invalid_argument(format!(
            "{name} takes {n} inputs, got {}",
            children.len()
        )));
    }
    Ok(())
}

/// Validate `kind` for `dtype`/`children`, returning the kind to store.
fn validate(dtype: &DataType, kind: ExprKind, children: &[ExprRef]) -> Result<ExprKind> {
    let name = kind.name();
    match kind {
        ExprKind::Literal(ref value) => {
            expect_arity(name, children, 0)?;
            value.to_array(dtype)?;
            Ok(kind)
        }
        ExprKind::LiteralColumn(ref array) => {
            expect_arity(name, children, 0)?;
            if !can_cast(array.data_type(), dtype) {
                return Err(Error::unsupported(format!(
                    "literal column of {} declared as {dtype}",
                    array.data_type()
                )));
            }
            Ok(kind)
        }
        ExprKind::Col(_) | ExprKind::Len => {
            expect_arity(name, children, 0)?;
            Ok(kind)
        }
        ExprKind::BooleanFunction(ref f) => {
            boolean::validate(f, dtype, children)?;
            Ok(kind)
        }
        ExprKind::StringFunction { function, .. } => {
            let pattern = string::validate(&function, children)?;
            Ok(ExprKind::StringFunction { function, pattern })
        }
        ExprKind::TemporalFunction(ref f) => {
            temporal::validate(f, children)?;
            Ok(kind)
        }
        ExprKind::UnaryFunction(ref f) => {
            unary::validate(f, children)?;
            Ok(kind)
        }
        ExprKind::Sort(_) | ExprKind::Cast => {
            expect_arity(name, children, 1)?;
            if matches!(kind, ExprKind::Cast) && !can_cast(children[0].dtype(), dtype) {
                return Err(Error::unsupported(format!(
                    "cast from {} to {dtype}",
                    children[0].dtype()
                )));
            }
            Ok(kind)
        }
        ExprKind::SortBy(ref options) => {
            let keys = children.len().saturating_sub(1);
            if keys == 0 {
                return Err(Error::invalid_argument("SortBy needs at least one key"));
            }
            for (flags, what) in [(&options.descending, "descending"), (&options.nulls_last, "nulls_last")] {
                if flags.len() != 1 && flags.len() != keys {
                    return Err(Error::invalid_argument(format!(
                        "SortBy has {keys} keys but {} {what} flags",
                        flags.len()
                    )));
                }
            }
            Ok(kind)
        }
        ExprKind::Gather => {
            expect_arity(name, children, 2)?;
            if !children[1].dtype().is_integer() {
                return Err(Error::unsupported(format!(
                    "gather with {} indices",
                    children[1].dtype()
                )));
            }
            Ok(kind)
        }
        ExprKind::Filter => {
            expect_arity(name, children, 2)?;
            if *children[1].dtype() != DataType::Boolean {
                return Err(Error::unsupported(format!(
                    "filter with {} mask",
                    children[1].dtype()
                )));
            }
            Ok(kind)
        }
        ExprKind::Agg(ref f) => {
            agg::validate(f, children)?;
            Ok(kind)
        }
        ExprKind::Ternary => {
            expect_arity(name, children, 3)?;
            Ok(kind)
        }
        ExprKind::BinOp(op) => {
            expect_arity(name, children, 2)?;
            // Bitwise and logical AND/OR on booleans follow Kleene logic.
            let op = match op {
                BinaryOperator::BitwiseAnd | BinaryOperator::LogicalAnd
                    if *dtype == DataType::Boolean =>
                {
                    BinaryOperator::NullLogicalAnd
                }
                BinaryOperator::BitwiseOr | BinaryOperator::LogicalOr
                    if *dtype == DataType::Boolean =>
                {
                    BinaryOperator::NullLogicalOr
                }
                other => other,
            };
            let (left, right) = (children[0].dtype(), children[1].dtype());
            if !is_supported_operation(dtype, left, right, op) {
                return Err(Error::unsupported(format!(
                    "binary operator {} on {left} and {right} producing {dtype}",
                    op.name()
                )));
            }
            Ok(ExprKind::BinOp(op))
        }
    }
}

impl Expr {
    /// Build and validate a node.
    pub fn try_new(dtype: DataType, kind: ExprKind, children: Vec<ExprRef>) -> Result<ExprRef> {
        let name = kind.name();
        let kind = validate(&dtype, kind, &children).inspect_err(|err| {
            tracing::debug!(node = name, %dtype, error = %err, "rejected expression node");
        })?;
        Ok(Arc::new(Expr {
            dtype,
            kind,
            children,
            hash: OnceLock::new(),
            repr: OnceLock::new(),
        }))
    }

    pub fn literal(dtype: DataType, value: impl Into<LiteralValue>) -> Result<ExprRef> {
        Self::try_new(dtype, ExprKind::Literal(value.into()), Vec::new())
    }

    pub fn literal_column(dtype: DataType, values: ArrayRef) -> Result<ExprRef> {
        Self::try_new(dtype, ExprKind::LiteralColumn(values), Vec::new())
    }

    pub fn col(dtype: DataType, name: impl Into<String>) -> ExprRef {
        Arc::new(Expr {
            dtype,
            kind: ExprKind::Col(name.into()),
            children: Vec::new(),
            hash: OnceLock::new(),
            repr: OnceLock::new(),
        })
    }

    /// Number of rows in the frame.
    pub fn len(dtype: DataType) -> ExprRef {
        Arc::new(Expr {
            dtype,
            kind: ExprKind::Len,
            children: Vec::new(),
            hash: OnceLock::new(),
            repr: OnceLock::new(),
        })
    }

    pub fn boolean_function(
        dtype: DataType,
        function: BooleanFunction,
        children: Vec<ExprRef>,
    ) -> Result<ExprRef> {
        Self::try_new(dtype, ExprKind::BooleanFunction(function), children)
    }

    pub fn string_function(
        dtype: DataType,
        function: StringFunction,
        children: Vec<ExprRef>,
    ) -> Result<ExprRef> {
        Self::try_new(
            dtype,
            ExprKind::StringFunction {
                function,
                pattern: None,
            },
            children,
        )
    }

    pub fn temporal_function(
        dtype: DataType,
        function: TemporalFunction,
        child: ExprRef,
    ) -> Result<ExprRef> {
        Self::try_new(dtype, ExprKind::TemporalFunction(function), vec![child])
    }

    pub fn unary_function(
        dtype: DataType,
        function: UnaryFunction,
        children: Vec<ExprRef>,
    ) -> Result<ExprRef> {
        Self::try_new(dtype, ExprKind::UnaryFunction(function), children)
    }

    pub fn sort(dtype: DataType, options: SortOptions, child: ExprRef) -> Result<ExprRef> {
        Self::try_new(dtype, ExprKind::Sort(options), vec![child])
    }

    pub fn sort_by(
        dtype: DataType,
        options: SortByOptions,
        column: ExprRef,
        by: Vec<ExprRef>,
    ) -> Result<ExprRef> {
        let mut children = Vec::with_capacity(by.len() + 1);
        children.push(column);
        children.extend(by);
        Self::try_new(dtype, ExprKind::SortBy(options), children)
    }

    pub fn gather(dtype: DataType, values: ExprRef, indices: ExprRef) -> Result<ExprRef> {
        Self::try_new(dtype, ExprKind::Gather, vec![values, indices])
    }

    pub fn filter(dtype: DataType, values: ExprRef, mask: ExprRef) -> Result<ExprRef> {
        Self::try_new(dtype, ExprKind::Filter, vec![values, mask])
    }

    /// Rolling windows are not implemented; this always fails.
    pub fn rolling_window(
        dtype: DataType,
        options: RollingOptions,
        _agg: ExprRef,
    ) -> Result<ExprRef> {
        tracing::debug!(%dtype, ?options, "rejected rolling window");
        Err(Error::unsupported("Rolling window not implemented"))
    }

    /// Grouped rolling windows are not implemented; this always fails.
    pub fn grouped_rolling_window(
        dtype: DataType,
        options: RollingOptions,
        _agg: ExprRef,
        _by: Vec<ExprRef>,
    ) -> Result<ExprRef> {
        tracing::debug!(%dtype, ?options, "rejected grouped rolling window");
        Err(Error::unsupported("Grouped rolling window not implemented"))
    }

    pub fn cast(dtype: DataType, child: ExprRef) -> Result<ExprRef> {
        Self::try_new(dtype, ExprKind::Cast, vec![child])
    }

    pub fn agg(dtype: DataType, function: AggFunction, children: Vec<ExprRef>) -> Result<ExprRef> {
        Self::try_new(dtype, ExprKind::Agg(function), children)
    }

    pub fn ternary(
        dtype: DataType,
        when: ExprRef,
        then: ExprRef,
        otherwise: ExprRef,
    ) -> Result<ExprRef> {
        Self::try_new(dtype, ExprKind::Ternary, vec![when, then, otherwise])
    }

    pub fn binop(
        dtype: DataType,
        op: BinaryOperator,
        left: ExprRef,
        right: ExprRef,
    ) -> Result<ExprRef> {
        Self::try_new(dtype, ExprKind::BinOp(op), vec![left, right])
    }

    #[inline]
    pub fn dtype(&self) -> &DataType {
        &self.dtype
    }

    #[inline]
    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    #[inline]
    pub fn children(&self) -> &[ExprRef] {
        &self.children
    }

    /// The same node with `children` replaced, validated afresh.
    pub fn with_new_children(&self, children: Vec<ExprRef>) -> Result<ExprRef> {
        Self::try_new(self.dtype.clone(), self.kind.clone(), children)
    }

    pub fn literal_value(&self) -> Option<&LiteralValue> {
        match &self.kind {
            ExprKind::Literal(v) => Some(v),
            _ => None,
        }
    }

    pub fn literal_array(&self) -> Option<&ArrayRef> {
        match &self.kind {
            ExprKind::LiteralColumn(a) => Some(a),
            _ => None,
        }
    }

    /// Structural hash, computed once.
    pub fn structural_hash(&self) -> u64 {
        *self.hash.get_or_init(|| {
            let mut hasher = FxHasher::default();
            self.dtype.hash(&mut hasher);
            self.kind.hash(&mut hasher);
            hasher.write_usize(self.children.len());
            for child in &self.children {
                hasher.write_u64(child.structural_hash());
            }
            hasher.finish()
        })
    }

    /// Canonical string form, computed once.
    pub fn repr(&self) -> &str {
        self.repr.get_or_init(|| {
            let mut args = vec![self.dtype.to_string()];
            crate::format::push_fields(&self.kind, &mut args);
            args.extend(self.children.iter().map(|c| c.repr().to_string()));
            format!("{}({})", self.kind.name(), args.join(", "))
        })
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.structural_hash() == other.structural_hash()
            && self.dtype == other.dtype
            && self.kind == other.kind
            && self.children == other.children
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.structural_hash());
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.repr())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    use arrow::array::Int64Array;

    fn hash_of(expr: &Expr) -> u64 {
        let mut h = DefaultHasher::new();
        expr.hash(&mut h);
        h.finish()
    }

    fn a_plus_b() -> ExprRef {
        Expr::binop(
            DataType::Int64,
            BinaryOperator::Add,
            Expr::col(DataType::Int64, "a"),
            Expr::col(DataType::Int64, "b"),
        )
        .unwrap()
    }

    #[test]
    fn structurally_equal_trees_compare_and_hash_equal() {
        let x = a_plus_b();
        let y = a_plus_b();
        assert!(!Arc::ptr_eq(&x, &y));
        assert_eq!(x, y);
        assert_eq!(hash_of(&x), hash_of(&y));
    }

    #[test]
    fn dtype_and_options_participate_in_identity() {
        let a64 = Expr::col(DataType::Int64, "a");
        let a32 = Expr::col(DataType::Int32, "a");
        assert_ne!(a64, a32);

        let asc = Expr::sort(DataType::Int64, SortOptions::default(), a64.clone()).unwrap();
        let desc = Expr::sort(
            DataType::Int64,
            SortOptions {
                descending: true,
                ..SortOptions::default()
            },
            a64,
        )
        .unwrap();
        assert_ne!(asc, desc);
    }

    #[test]
    fn literal_columns_compare_by_identity() {
        let values: ArrayRef = Arc::new(Int64Array::from(vec![1, 2]));
        let x = Expr::literal_column(DataType::Int64, values.clone()).unwrap();
        let y = Expr::literal_column(DataType::Int64, values).unwrap();
        let z = Expr::literal_column(
            DataType::Int64,
            Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef,
        )
        .unwrap();
        assert_eq!(x, y);
        assert_ne!(x, z);
        assert!(Arc::ptr_eq(x.literal_array().unwrap(), y.literal_array().unwrap()));
        assert!(x.literal_value().is_none());
        assert!(Expr::col(DataType::Int64, "a").literal_array().is_none());
    }

    #[test]
    fn repr_is_stable_and_nested() {
        let x = a_plus_b();
        assert_eq!(
            x.repr(),
            "BinOp(Int64, ADD, Col(Int64, \"a\"), Col(Int64, \"b\"))"
        );
        assert_eq!(x.repr(), a_plus_b().repr());
        assert_eq!(format!("{x}"), x.repr());
        assert_eq!(Expr::len(DataType::Int32).repr(), "Len(Int32)");
    }

    #[test]
    fn boolean_and_or_become_kleene() {
        let p = Expr::col(DataType::Boolean, "p");
        let q = Expr::col(DataType::Boolean, "q");
        let and = Expr::binop(DataType::Boolean, BinaryOperator::BitwiseAnd, p.clone(), q.clone())
            .unwrap();
        let or = Expr::binop(DataType::Boolean, BinaryOperator::LogicalOr, p, q).unwrap();
        assert!(matches!(
            and.kind(),
            ExprKind::BinOp(BinaryOperator::NullLogicalAnd)
        ));
        assert!(matches!(or.kind(), ExprKind::BinOp(BinaryOperator::NullLogicalOr)));
    }

    #[test]
    fn unsupported_binop_is_rejected() {
        let err = Expr::binop(
            DataType::Int64,
            BinaryOperator::Add,
            Expr::col(DataType::Utf8, "s"),
            Expr::col(DataType::Int64, "a"),
        )
        .unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn is_in_requires_matching_types() {
        let err = Expr::boolean_function(
            DataType::Boolean,
            BooleanFunction::IsIn,
            vec![
                Expr::col(DataType::Int64, "a"),
                Expr::col(DataType::Utf8, "s"),
            ],
        )
        .unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn rolling_windows_are_unsupported() {
        let options = RollingOptions {
            window_size: 3,
            min_periods: 1,
            center: false,
        };
        let agg = Expr::col(DataType::Int64, "a");
        assert!(
            Expr::rolling_window(DataType::Int64, options.clone(), agg.clone())
                .unwrap_err()
                .is_unsupported()
        );
        assert!(
            Expr::grouped_rolling_window(DataType::Int64, options, agg, vec![])
                .unwrap_err()
                .is_unsupported()
        );
    }

    #[test]
    fn with_new_children_revalidates() {
        let x = a_plus_b();
        let swapped = x
            .with_new_children(vec![x.children()[1].clone(), x.children()[0].clone()])
            .unwrap();
        assert_ne!(x, swapped);
        assert!(x.with_new_children(vec![]).is_err());
    }

    #[test]
    fn sort_by_flag_counts_must_match_keys() {
        let options = SortByOptions {
            stable: true,
            nulls_last: vec![false, true, false],
            descending: vec![false],
        };
        let err = Expr::sort_by(
            DataType::Int64,
            options,
            Expr::col(DataType::Int64, "a"),
            vec![Expr::col(DataType::Int64, "b"), Expr::col(DataType::Int64, "c")],
        )
        .unwrap_err();
        assert!(!err.is_unsupported());
    }
}
