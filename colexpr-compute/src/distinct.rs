//! Row-equality based distinctness, membership and grouping.
//!
//! Values are compared through Arrow's row format, so nulls equal each other
//! and the same logic applies to any key type (or tuple of key types).

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, UInt32Array};
use arrow::compute::take;
use arrow::row::{RowConverter, Rows, SortField};
use colexpr_result::{Error, Result};
use rustc_hash::{FxHashMap, FxHashSet};

/// Which member of a set of duplicate rows survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DuplicateKeep {
    First,
    Last,
    /// Drop every row that has a duplicate.
    None,
}

fn encode_rows(arrays: &[ArrayRef]) -> Result<Rows> {
    let fields = arrays
        .iter()
        .map(|a| SortField::new(a.data_type().clone()))
        .collect();
    let converter = RowConverter::new(fields)?;
    Ok(converter.convert_columns(arrays)?)
}

/// Indices (ascending) of the rows retained under `keep`.
pub fn distinct_indices(arrays: &[ArrayRef], keep: DuplicateKeep) -> Result<Vec<u32>> {
    let rows = encode_rows(arrays)?;
    // row -> (first index, last index, occurrences)
    let mut seen: FxHashMap<_, (u32, u32, u32)> = FxHashMap::default();
    for (idx, row) in rows.iter().enumerate() {
        let idx = idx as u32;
        seen.entry(row)
            .and_modify(|(_, last, count)| {
                *last = idx;
                *count += 1;
            })
            .or_insert((idx, idx, 1));
    }
    let mut indices: Vec<u32> = match keep {
        DuplicateKeep::First => seen.values().map(|e| e.0).collect(),
        DuplicateKeep::Last => seen.values().map(|e| e.1).collect(),
        DuplicateKeep::None => seen.values().filter(|e| e.2 == 1).map(|e| e.0).collect(),
    };
    indices.sort_unstable();
    Ok(indices)
}

/// A boolean column of `len` rows set to `value` at `indices` and `!value` elsewhere.
pub fn scatter_flags(len: usize, indices: &[u32], value: bool) -> BooleanArray {
    let mut flags = vec![!value; len];
    for &idx in indices {
        flags[idx as usize] = value;
    }
    BooleanArray::from(flags)
}

/// Number of distinct values, counting null as one value when present.
pub fn count_distinct(values: &ArrayRef) -> Result<usize> {
    let rows = encode_rows(std::slice::from_ref(values))?;
    Ok(rows.iter().collect::<FxHashSet<_>>().len())
}

/// Distinct values of `values`.
///
/// With `maintain_order` the first occurrences are returned in input order,
/// otherwise the result is in key order.
pub fn unique(values: &ArrayRef, maintain_order: bool) -> Result<ArrayRef> {
    let mut indices = distinct_indices(std::slice::from_ref(values), DuplicateKeep::First)?;
    if !maintain_order {
        let rows = encode_rows(std::slice::from_ref(values))?;
        indices.sort_by(|a, b| rows.row(*a as usize).cmp(&rows.row(*b as usize)));
    }
    let indices = UInt32Array::from(indices);
    Ok(take(values.as_ref(), &indices, None)?)
}

/// Elementwise membership of `needles` in `haystack`.
///
/// Null needles produce null; a null in the haystack is never matched.
pub fn is_in(needles: &ArrayRef, haystack: &ArrayRef) -> Result<BooleanArray> {
    if needles.data_type() != haystack.data_type() {
        return Err(Error::invalid_argument(format!(
            "is_in needs matching types, got {} and {}",
            needles.data_type(),
            haystack.data_type()
        )));
    }
    let fields = vec![SortField::new(needles.data_type().clone())];
    let converter = RowConverter::new(fields)?;
    let hay_rows = converter.convert_columns(std::slice::from_ref(haystack))?;
    let needle_rows = converter.convert_columns(std::slice::from_ref(needles))?;
    let set: FxHashSet<_> = hay_rows
        .iter()
        .enumerate()
        .filter(|(idx, _)| haystack.is_valid(*idx))
        .map(|(_, row)| row)
        .collect();
    Ok(needle_rows
        .iter()
        .enumerate()
        .map(|(idx, row)| needles.is_valid(idx).then(|| set.contains(&row)))
        .collect())
}

/// Partition rows into groups of equal keys.
///
/// Groups come out in first-occurrence order, or in key order when `sorted`.
/// Row indices within a group are ascending.
pub fn group_rows(keys: &[ArrayRef], sorted: bool) -> Result<Vec<Vec<u32>>> {
    let num_rows = keys.first().map_or(0, |k| k.len());
    if keys.is_empty() {
        return Ok(vec![(0..num_rows as u32).collect()]);
    }
    let rows = encode_rows(keys)?;
    let mut slot: FxHashMap<_, usize> = FxHashMap::default();
    let mut groups: Vec<Vec<u32>> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        let g = *slot.entry(row).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[g].push(idx as u32);
    }
    if sorted {
        groups.sort_by(|a, b| rows.row(a[0] as usize).cmp(&rows.row(b[0] as usize)));
    }
    Ok(groups)
}

/// First row index of every group, as a gather map.
pub fn group_representatives(groups: &[Vec<u32>]) -> ArrayRef {
    Arc::new(UInt32Array::from_iter_values(
        groups.iter().filter_map(|g| g.first().copied()),
    ))
}
