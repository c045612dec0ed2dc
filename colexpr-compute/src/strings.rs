//! String kernels over UTF-8 columns.
//!
//! Inputs of any string representation are normalised to `Utf8` first; the
//! results are `Utf8` or `Boolean`.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Date32Array, PrimitiveArray, StringArray,
};
use arrow::compute::cast;
use arrow::compute::kernels::comparison::{contains, ends_with, starts_with};
use arrow::datatypes::{
    DataType, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType,
};
use chrono::{NaiveDate, NaiveDateTime};
use colexpr_result::{Error, Result};
use regex::Regex;

use crate::operand::pair;

/// Which ends [`strip`] trims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StripSide {
    Both,
    Start,
    End,
}

/// Predicates comparing each string with a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    Contains,
    StartsWith,
    EndsWith,
}

pub fn to_utf8(values: &ArrayRef) -> Result<ArrayRef> {
    match values.data_type() {
        DataType::Utf8 => Ok(values.clone()),
        DataType::LargeUtf8 | DataType::Utf8View | DataType::Null => {
            Ok(cast(values, &DataType::Utf8)?)
        }
        other => Err(Error::invalid_argument(format!(
            "expected a string column, got {other}"
        ))),
    }
}

fn map_strings(values: &ArrayRef, f: impl Fn(&str) -> String) -> Result<ArrayRef> {
    let values = to_utf8(values)?;
    let out: StringArray = values
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(&f))
        .collect();
    Ok(Arc::new(out))
}

pub fn lowercase(values: &ArrayRef) -> Result<ArrayRef> {
    map_strings(values, str::to_lowercase)
}

pub fn uppercase(values: &ArrayRef) -> Result<ArrayRef> {
    map_strings(values, str::to_uppercase)
}

/// Literal substring/prefix/suffix test. `pattern` is a column of equal length or a scalar.
pub fn match_literal(values: &ArrayRef, pattern: &ArrayRef, kind: MatchKind) -> Result<ArrayRef> {
    let values = to_utf8(values)?;
    let pattern = to_utf8(pattern)?;
    let (l, r, _) = pair(&values, &pattern)?;
    let out = match kind {
        MatchKind::Contains => contains(&l, &r)?,
        MatchKind::StartsWith => starts_with(&l, &r)?,
        MatchKind::EndsWith => ends_with(&l, &r)?,
    };
    Ok(Arc::new(out))
}

pub fn contains_regex(values: &ArrayRef, pattern: &Regex) -> Result<ArrayRef> {
    let values = to_utf8(values)?;
    let out: BooleanArray = values
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(|s| pattern.is_match(s)))
        .collect();
    Ok(Arc::new(out))
}

/// Character slice `[start, stop)` with negative positions counted from the end.
///
/// `stop == None` runs to the end of the string.
pub fn slice(values: &ArrayRef, start: i64, stop: Option<i64>) -> Result<ArrayRef> {
    map_strings(values, |s| {
        let n = s.chars().count() as i64;
        let resolve = |pos: i64| if pos < 0 { (pos + n).max(0) } else { pos.min(n) };
        let begin = resolve(start);
        let end = stop.map_or(n, resolve);
        if end <= begin {
            return String::new();
        }
        s.chars()
            .skip(begin as usize)
            .take((end - begin) as usize)
            .collect()
    })
}

/// Trim characters in `chars` (whitespace when `None`) from the chosen ends.
pub fn strip(values: &ArrayRef, chars: Option<&str>, side: StripSide) -> Result<ArrayRef> {
    let set: Option<Vec<char>> = chars.map(|c| c.chars().collect());
    let hit = |c: char| match &set {
        Some(set) => set.contains(&c),
        None => c.is_whitespace(),
    };
    map_strings(values, |s| {
        let trimmed = match side {
            StripSide::Both => s.trim_matches(hit),
            StripSide::Start => s.trim_start_matches(hit),
            StripSide::End => s.trim_end_matches(hit),
        };
        trimmed.to_string()
    })
}

/// Replace up to `max_count` occurrences of `target` (all when negative).
pub fn replace(values: &ArrayRef, target: &str, replacement: &str, max_count: i64) -> Result<ArrayRef> {
    if target.is_empty() {
        return Err(Error::invalid_argument("replace target must not be empty"));
    }
    map_strings(values, |s| {
        if max_count < 0 {
            s.replace(target, replacement)
        } else {
            s.replacen(target, replacement, max_count as usize)
        }
    })
}

/// Replace every occurrence of each target with its paired replacement in a
/// single left-to-right pass; at each position the first matching target wins.
pub fn replace_many(values: &ArrayRef, targets: &[String], replacements: &[String]) -> Result<ArrayRef> {
    if targets.iter().any(String::is_empty) {
        return Err(Error::invalid_argument("replace targets must not be empty"));
    }
    let replacements: Vec<&str> = match replacements.len() {
        1 => vec![replacements[0].as_str(); targets.len()],
        n if n == targets.len() => replacements.iter().map(String::as_str).collect(),
        n => {
            return Err(Error::invalid_argument(format!(
                "{} targets but {n} replacements",
                targets.len()
            )));
        }
    };
    map_strings(values, |s| {
        let mut out = String::with_capacity(s.len());
        let mut rest = s;
        'outer: while !rest.is_empty() {
            for (target, repl) in targets.iter().zip(&replacements) {
                if let Some(tail) = rest.strip_prefix(target.as_str()) {
                    out.push_str(repl);
                    rest = tail;
                    continue 'outer;
                }
            }
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
        out
    })
}

fn parse_datetime(s: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, format).ok().or_else(|| {
        NaiveDate::parse_from_str(s, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

/// Whether each row parses with `format`. Nulls stay null.
pub fn is_timestamp(values: &ArrayRef, format: &str) -> Result<BooleanArray> {
    let values = to_utf8(values)?;
    Ok(values
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(|s| parse_datetime(s, format).is_some()))
        .collect())
}

/// Parse every row with `format` into `dtype` (a timestamp or `Date32`).
/// Rows that do not parse become null.
pub fn to_timestamp(values: &ArrayRef, format: &str, dtype: &DataType) -> Result<ArrayRef> {
    let values = to_utf8(values)?;
    let parsed: Vec<Option<NaiveDateTime>> = values
        .as_string::<i32>()
        .iter()
        .map(|v| v.and_then(|s| parse_datetime(s, format)))
        .collect();
    let utc = |dt: &NaiveDateTime| dt.and_utc();
    let out: ArrayRef = match dtype {
        DataType::Date32 => {
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
                .ok_or_else(|| Error::internal("unix epoch out of range"))?;
            Arc::new(Date32Array::from_iter(parsed.iter().map(|v| {
                v.map(|dt| dt.date().signed_duration_since(epoch).num_days() as i32)
            })))
        }
        DataType::Timestamp(unit, tz) => {
            let ticks = |dt: &NaiveDateTime| -> Option<i64> {
                let ts = utc(dt);
                match unit {
                    TimeUnit::Second => Some(ts.timestamp()),
                    TimeUnit::Millisecond => Some(ts.timestamp_millis()),
                    TimeUnit::Microsecond => Some(ts.timestamp_micros()),
                    TimeUnit::Nanosecond => ts.timestamp_nanos_opt(),
                }
            };
            let raw = parsed.iter().map(|v| v.as_ref().and_then(ticks));
            match unit {
                TimeUnit::Second => timestamps::<TimestampSecondType>(raw, tz.clone()),
                TimeUnit::Millisecond => timestamps::<TimestampMillisecondType>(raw, tz.clone()),
                TimeUnit::Microsecond => timestamps::<TimestampMicrosecondType>(raw, tz.clone()),
                TimeUnit::Nanosecond => timestamps::<TimestampNanosecondType>(raw, tz.clone()),
            }
        }
        other => {
            return Err(Error::invalid_argument(format!(
                "cannot parse strings into {other}"
            )));
        }
    };
    Ok(out)
}

fn timestamps<T>(values: impl Iterator<Item = Option<i64>>, tz: Option<Arc<str>>) -> ArrayRef
where
    T: arrow::datatypes::ArrowTimestampType,
{
    Arc::new(PrimitiveArray::<T>::from_iter(values).with_timezone_opt(tz))
}
