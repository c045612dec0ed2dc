//! Sortedness metadata carried alongside evaluated columns.
//!
//! Null placement follows the convention of the compute backend: the
//! [`NullOrder`] says whether nulls compare *before* or *after* every valid
//! value, and the physical position of the nulls then depends on the
//! [`Order`]. Ascending + `Before` puts nulls first; descending + `Before`
//! puts them last.

use colexpr_result::{Error, Result};

/// Whether a column is known to be sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sorted {
    Yes,
    #[default]
    No,
}

/// Direction of a sorted column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

/// Relative position of nulls with respect to valid values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NullOrder {
    /// Nulls compare smaller than every valid value.
    #[default]
    Before,
    /// Nulls compare larger than every valid value.
    After,
}

impl NullOrder {
    /// Whether nulls physically come first for a column sorted in `order`.
    #[inline]
    pub fn nulls_first(self, order: Order) -> bool {
        matches!(
            (self, order),
            (NullOrder::Before, Order::Ascending) | (NullOrder::After, Order::Descending)
        )
    }
}

/// Cached claim about the ordering of a column's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sortedness {
    pub is_sorted: Sorted,
    pub order: Order,
    pub null_order: NullOrder,
}

impl Sortedness {
    /// Metadata for a column with no known ordering.
    pub const UNSORTED: Sortedness = Sortedness {
        is_sorted: Sorted::No,
        order: Order::Ascending,
        null_order: NullOrder::Before,
    };
}

/// Translate per-key `descending`/`nulls_last` flags into backend sort orders.
///
/// `nulls_last` describes the physical placement the caller wants. A single
/// flag is broadcast across all `num_keys` keys; any other length mismatch is
/// rejected.
pub fn sort_order(
    descending: &[bool],
    nulls_last: &[bool],
    num_keys: usize,
) -> Result<(Vec<Order>, Vec<NullOrder>)> {
    let descending = broadcast_flags(descending, num_keys, "descending")?;
    let nulls_last = broadcast_flags(nulls_last, num_keys, "nulls_last")?;
    let order = descending
        .iter()
        .map(|&desc| if desc { Order::Descending } else { Order::Ascending })
        .collect();
    let null_order = descending
        .iter()
        .zip(nulls_last.iter())
        .map(|(&desc, &last)| {
            if desc == last {
                NullOrder::Before
            } else {
                NullOrder::After
            }
        })
        .collect();
    Ok((order, null_order))
}

fn broadcast_flags(flags: &[bool], num_keys: usize, what: &str) -> Result<Vec<bool>> {
    match flags.len() {
        n if n == num_keys => Ok(flags.to_vec()),
        1 => Ok(vec![flags[0]; num_keys]),
        n => Err(Error::invalid_argument(format!(
            "expected 1 or {num_keys} {what} flags, got {n}"
        ))),
    }
}
