//! Stable and unstable sorting by one or more keys.

use arrow::array::{Array, ArrayRef, UInt32Array};
use arrow::compute::{SortColumn, SortOptions, lexsort_to_indices, sort_to_indices, take};
use colexpr_result::{Error, Result};
use std::sync::Arc;

/// Per-key sort direction with the physical null placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SortKeyOptions {
    pub descending: bool,
    pub nulls_last: bool,
}

impl From<SortKeyOptions> for SortOptions {
    fn from(opts: SortKeyOptions) -> Self {
        SortOptions {
            descending: opts.descending,
            nulls_first: !opts.nulls_last,
        }
    }
}

/// Permutation that orders the rows of `keys`.
///
/// A stable sort breaks ties by input position.
pub fn sort_indices(keys: &[ArrayRef], options: &[SortKeyOptions], stable: bool) -> Result<UInt32Array> {
    if keys.is_empty() {
        return Err(Error::invalid_argument("sort needs at least one key"));
    }
    if keys.len() != options.len() {
        return Err(Error::invalid_argument(format!(
            "{} sort keys but {} sort options",
            keys.len(),
            options.len()
        )));
    }
    if keys.len() == 1 && !stable {
        return Ok(sort_to_indices(keys[0].as_ref(), Some(options[0].into()), None)?);
    }
    let mut columns: Vec<SortColumn> = keys
        .iter()
        .zip(options)
        .map(|(values, opts)| SortColumn {
            values: values.clone(),
            options: Some((*opts).into()),
        })
        .collect();
    if stable {
        let len = keys[0].len() as u32;
        columns.push(SortColumn {
            values: Arc::new(UInt32Array::from_iter_values(0..len)),
            options: Some(SortOptions::default()),
        });
    }
    Ok(lexsort_to_indices(&columns, None)?)
}

/// Sort a single column.
pub fn sort(values: &ArrayRef, options: SortKeyOptions, stable: bool) -> Result<ArrayRef> {
    let indices = sort_indices(std::slice::from_ref(values), &[options], stable)?;
    Ok(take(values.as_ref(), &indices, None)?)
}

/// Reorder `values` by `keys`.
pub fn sort_by_key(
    values: &ArrayRef,
    keys: &[ArrayRef],
    options: &[SortKeyOptions],
    stable: bool,
) -> Result<ArrayRef> {
    let indices = sort_indices(keys, options, stable)?;
    Ok(take(values.as_ref(), &indices, None)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{AsArray, Int32Array, StringArray};
    use arrow::datatypes::Int32Type;

    #[test]
    fn sort_places_nulls_physically() {
        let values: ArrayRef = Arc::new(Int32Array::from(vec![Some(2), None, Some(1)]));
        let opts = SortKeyOptions {
            descending: false,
            nulls_last: true,
        };
        let out = sort(&values, opts, false).unwrap();
        let out = out.as_primitive::<Int32Type>();
        assert_eq!(out.value(0), 1);
        assert_eq!(out.value(1), 2);
        assert!(out.is_null(2));

        let opts = SortKeyOptions {
            descending: true,
            nulls_last: false,
        };
        let out = sort(&values, opts, true).unwrap();
        let out = out.as_primitive::<Int32Type>();
        assert!(out.is_null(0));
        assert_eq!(out.value(1), 2);
    }

    #[test]
    fn stable_sort_by_keeps_tie_order() {
        let values: ArrayRef = Arc::new(StringArray::from(vec!["a", "b", "c", "d"]));
        let keys: ArrayRef = Arc::new(Int32Array::from(vec![1, 0, 1, 0]));
        let out = sort_by_key(&values, &[keys], &[SortKeyOptions::default()], true).unwrap();
        let out = out.as_string::<i32>();
        assert_eq!(out.iter().flatten().collect::<Vec<_>>(), vec!["b", "d", "a", "c"]);
    }
}
