use arrow::array::AsArray;
use arrow::compute::kernels::aggregate::bool_and;
use arrow::datatypes::DataType;
use colexpr_column::{Column, DataFrame};
use colexpr_compute::cast_to;
use colexpr_compute::strings::{self, MatchKind, StripSide};
use colexpr_result::{Error, Result};
use regex::Regex;

use crate::context::ExecutionContext;
use crate::eval::ExprMapping;
use crate::expr::{Expr, ExprRef, expect_arity};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StringFunction {
    /// Substring test. With `literal == false` the pattern is a regular
    /// expression, which must be a scalar literal.
    Contains { literal: bool, strict: bool },
    StartsWith,
    EndsWith,
    Lowercase,
    Uppercase,
    /// Replace at most `n` matches per row; negative `n` replaces all.
    Replace { n: i64, literal: bool },
    ReplaceMany { ascii_case_insensitive: bool },
    Slice,
    Strptime {
        format: Option<String>,
        strict: bool,
        exact: bool,
        cache: bool,
    },
    StripChars,
    StripCharsStart,
    StripCharsEnd,
}

impl StringFunction {
    pub fn name(&self) -> &'static str {
        match self {
            StringFunction::Contains { .. } => "contains",
            StringFunction::StartsWith => "starts_with",
            StringFunction::EndsWith => "ends_with",
            StringFunction::Lowercase => "to_lowercase",
            StringFunction::Uppercase => "to_uppercase",
            StringFunction::Replace { .. } => "replace",
            StringFunction::ReplaceMany { .. } => "replace_many",
            StringFunction::Slice => "slice",
            StringFunction::Strptime { .. } => "strptime",
            StringFunction::StripChars => "strip_chars",
            StringFunction::StripCharsStart => "strip_chars_start",
            StringFunction::StripCharsEnd => "strip_chars_end",
        }
    }
}

/// The string payload of a scalar string literal node.
fn scalar_string(expr: &Expr) -> Option<&str> {
    expr.literal_value().and_then(|v| v.as_str())
}

/// Strings held by a scalar literal or a literal column; nulls yield `None`.
fn literal_strings(expr: &Expr) -> Option<Vec<Option<String>>> {
    if let Some(value) = expr.literal_value() {
        return match value.as_str() {
            Some(s) => Some(vec![Some(s.to_string())]),
            None if value.is_null() => Some(vec![None]),
            None => None,
        };
    }
    let array = strings::to_utf8(expr.literal_array()?).ok()?;
    Some(
        array
            .as_string::<i32>()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect(),
    )
}

fn is_int_literal(expr: &Expr, allow_null: bool) -> bool {
    match expr.literal_value() {
        Some(v) if v.is_null() => allow_null,
        Some(v) => v.as_i64().is_some(),
        None => false,
    }
}

/// Check a string function and compile its regular expression, if any.
pub(crate) fn validate(
    function: &StringFunction,
    children: &[ExprRef],
) -> Result<Option<Regex>> {
    let name = function.name();
    match function {
        StringFunction::Contains { literal, strict } => {
            expect_arity(name, children, 2)?;
            if *literal {
                return Ok(None);
            }
            if !strict {
                return Err(Error::unsupported(format!(
                    "strict={strict} is not supported for regex contains"
                )));
            }
            let pattern = scalar_string(&children[1]).ok_or_else(|| {
                Error::unsupported("regex contains only supports a scalar pattern")
            })?;
            let regex = Regex::new(pattern)
                .map_err(|err| Error::unsupported(format!("unsupported regex {pattern:?}: {err}")))?;
            Ok(Some(regex))
        }
        StringFunction::StartsWith | StringFunction::EndsWith => {
            expect_arity(name, children, 2)?;
            Ok(None)
        }
        StringFunction::Lowercase | StringFunction::Uppercase => {
            expect_arity(name, children, 1)?;
            Ok(None)
        }
        StringFunction::Replace { literal, .. } => {
            expect_arity(name, children, 3)?;
            if !literal {
                return Err(Error::unsupported("replace with a regex pattern"));
            }
            let target = scalar_string(&children[1]);
            let replacement = scalar_string(&children[2]);
            match (target, replacement) {
                (Some(""), _) => Err(Error::unsupported(
                    "replace with an empty target string",
                )),
                (Some(_), Some(_)) => Ok(None),
                _ => Err(Error::unsupported(
                    "replace needs scalar string literals for target and replacement",
                )),
            }
        }
        StringFunction::ReplaceMany {
            ascii_case_insensitive,
        } => {
            expect_arity(name, children, 3)?;
            if *ascii_case_insensitive {
                return Err(Error::unsupported("case-insensitive replace_many"));
            }
            let targets = literal_strings(&children[1]).ok_or_else(|| {
                Error::unsupported("replace_many targets must be string literals")
            })?;
            let replacements = literal_strings(&children[2]).ok_or_else(|| {
                Error::unsupported("replace_many replacements must be string literals")
            })?;
            if targets.iter().any(|t| t.as_deref().is_none_or(str::is_empty)) {
                return Err(Error::unsupported("replace_many with an empty target"));
            }
            if replacements.iter().any(Option::is_none) {
                return Err(Error::unsupported("replace_many with a null replacement"));
            }
            if replacements.len() != 1 && replacements.len() != targets.len() {
                return Err(Error::invalid_argument(format!(
                    "replace_many has {} targets but {} replacements",
                    targets.len(),
                    replacements.len()
                )));
            }
            Ok(None)
        }
        StringFunction::Slice => {
            expect_arity(name, children, 3)?;
            if !is_int_literal(&children[1], false) || !is_int_literal(&children[2], true) {
                return Err(Error::unsupported(
                    "slice offset and length must be integer literals",
                ));
            }
            Ok(None)
        }
        StringFunction::Strptime {
            format,
            exact,
            cache,
            ..
        } => {
            expect_arity(name, children, 1)?;
            if format.is_none() {
                return Err(Error::unsupported("strptime without an explicit format"));
            }
            if !exact {
                return Err(Error::unsupported("strptime with exact=false"));
            }
            if *cache {
                return Err(Error::unsupported("strptime with cache=true"));
            }
            Ok(None)
        }
        StringFunction::StripChars
        | StringFunction::StripCharsStart
        | StringFunction::StripCharsEnd => {
            expect_arity(name, children, 2)?;
            match children[1].literal_value() {
                Some(v) if v.is_null() || v.as_str().is_some() => Ok(None),
                _ => Err(Error::unsupported(format!(
                    "{name} needs a scalar string literal"
                ))),
            }
        }
    }
}

/// Resolve literal `(offset, length)` into a `[start, stop)` character window.
///
/// A zero length selects nothing; a negative start whose length reaches past
/// the end of the string runs to the end.
pub fn slice_bounds(start: i64, length: Option<i64>) -> (i64, Option<i64>) {
    match length {
        None => (start, None),
        Some(0) => (start, Some(start)),
        Some(len) if start < 0 && len >= -start => (start, None),
        Some(len) => (start, Some(start.saturating_add(len))),
    }
}

pub(crate) fn evaluate(
    expr: &Expr,
    function: &StringFunction,
    pattern: Option<&Regex>,
    df: &DataFrame,
    context: ExecutionContext,
    mapping: Option<&ExprMapping>,
) -> Result<Column> {
    let children = expr.children();
    let column = children[0].evaluate(df, context, mapping)?;
    let values = column.array();
    let out = match function {
        StringFunction::Contains { literal: true, .. } => {
            let needle = children[1].evaluate(df, context, mapping)?;
            strings::match_literal(values, needle.array(), MatchKind::Contains)?
        }
        StringFunction::Contains { .. } => {
            let regex = pattern
                .ok_or_else(|| Error::internal("regex contains without a compiled pattern"))?;
            strings::contains_regex(values, regex)?
        }
        StringFunction::StartsWith | StringFunction::EndsWith => {
            let affix = children[1].evaluate(df, context, mapping)?;
            let kind = if matches!(function, StringFunction::StartsWith) {
                MatchKind::StartsWith
            } else {
                MatchKind::EndsWith
            };
            strings::match_literal(values, affix.array(), kind)?
        }
        StringFunction::Lowercase => strings::lowercase(values)?,
        StringFunction::Uppercase => strings::uppercase(values)?,
        StringFunction::Replace { n, .. } => {
            let (Some(target), Some(replacement)) =
                (scalar_string(&children[1]), scalar_string(&children[2]))
            else {
                return Err(Error::internal("replace without literal arguments"));
            };
            strings::replace(values, target, replacement, *n)?
        }
        StringFunction::ReplaceMany { .. } => {
            let collect = |e: &Expr| -> Result<Vec<String>> {
                literal_strings(e)
                    .ok_or_else(|| Error::internal("replace_many without literal arguments"))
                    .map(|v| v.into_iter().flatten().collect())
            };
            strings::replace_many(values, &collect(&children[1])?, &collect(&children[2])?)?
        }
        StringFunction::Slice => {
            let offset = children[1]
                .literal_value()
                .and_then(|v| v.as_i64())
                .ok_or_else(|| Error::internal("slice without literal offset"))?;
            let length = children[2].literal_value().and_then(|v| v.as_i64());
            let (start, stop) = slice_bounds(offset, length);
            strings::slice(values, start, stop)?
        }
        StringFunction::Strptime {
            format: Some(format),
            strict,
            ..
        } => {
            if *strict {
                let valid = strings::is_timestamp(values, format)?;
                if !bool_and(&valid).unwrap_or(true) {
                    return Err(Error::InvalidOperation(
                        "conversion from `str` failed.".into(),
                    ));
                }
            }
            strings::to_timestamp(values, format, expr.dtype())?
        }
        StringFunction::Strptime { format: None, .. } => {
            return Err(Error::internal("strptime without a format"));
        }
        StringFunction::StripChars
        | StringFunction::StripCharsStart
        | StringFunction::StripCharsEnd => {
            let chars = scalar_string(&children[1]);
            let side = match function {
                StringFunction::StripChars => StripSide::Both,
                StringFunction::StripCharsStart => StripSide::Start,
                _ => StripSide::End,
            };
            strings::strip(values, chars, side)?
        }
    };
    let out = if out.data_type() == expr.dtype() || *expr.dtype() == DataType::Null {
        out
    } else {
        cast_to(&out, expr.dtype())?
    };
    Ok(Column::new(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_bounds_rules() {
        assert_eq!(slice_bounds(1, Some(0)), (1, Some(1)));
        assert_eq!(slice_bounds(-3, Some(2)), (-3, Some(-1)));
        assert_eq!(slice_bounds(-3, Some(3)), (-3, None));
        assert_eq!(slice_bounds(-3, Some(5)), (-3, None));
        assert_eq!(slice_bounds(2, Some(2)), (2, Some(4)));
        assert_eq!(slice_bounds(2, None), (2, None));
    }
}
