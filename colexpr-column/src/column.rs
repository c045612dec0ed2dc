use std::sync::OnceLock;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray};
use arrow::compute::nullif;
use arrow::datatypes::{DataType, Float32Type, Float64Type};
use colexpr_result::Result;

use crate::sorting::{NullOrder, Order, Sorted, Sortedness};

/// An evaluated column: an Arrow array plus cached metadata.
///
/// Cloning is cheap; the underlying buffers are shared.
#[derive(Debug, Clone)]
pub struct Column {
    array: ArrayRef,
    sortedness: Sortedness,
    nan_count: OnceLock<usize>,
}

impl Column {
    pub fn new(array: ArrayRef) -> Self {
        Self {
            array,
            sortedness: Sortedness::UNSORTED,
            nan_count: OnceLock::new(),
        }
    }

    #[inline]
    pub fn array(&self) -> &ArrayRef {
        &self.array
    }

    #[inline]
    pub fn into_array(self) -> ArrayRef {
        self.array
    }

    #[inline]
    pub fn data_type(&self) -> &DataType {
        self.array.data_type()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.array.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    #[inline]
    pub fn null_count(&self) -> usize {
        self.array.null_count()
    }

    /// A length-one column can stand in for a scalar and is broadcastable.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.array.len() == 1
    }

    #[inline]
    pub fn sortedness(&self) -> Sortedness {
        self.sortedness
    }

    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.sortedness.is_sorted == Sorted::Yes
    }

    #[inline]
    pub fn order(&self) -> Order {
        self.sortedness.order
    }

    #[inline]
    pub fn null_order(&self) -> NullOrder {
        self.sortedness.null_order
    }

    /// Replace the sortedness metadata.
    #[must_use]
    pub fn set_sorted(mut self, is_sorted: Sorted, order: Order, null_order: NullOrder) -> Self {
        self.sortedness = Sortedness {
            is_sorted,
            order,
            null_order,
        };
        self
    }

    /// Copy the sortedness metadata of `like` onto this column.
    #[must_use]
    pub fn sorted_like(mut self, like: &Column) -> Self {
        self.sortedness = like.sortedness;
        self
    }

    /// Number of NaN entries (valid rows only). Zero for non-float columns.
    pub fn nan_count(&self) -> usize {
        *self.nan_count.get_or_init(|| match self.array.data_type() {
            DataType::Float32 => self
                .array
                .as_primitive::<Float32Type>()
                .iter()
                .filter(|v| v.is_some_and(f32::is_nan))
                .count(),
            DataType::Float64 => self
                .array
                .as_primitive::<Float64Type>()
                .iter()
                .filter(|v| v.is_some_and(f64::is_nan))
                .count(),
            _ => 0,
        })
    }

    /// Boolean mask of NaN positions; `None` for non-float columns.
    pub fn nan_mask(&self) -> Option<BooleanArray> {
        match self.array.data_type() {
            DataType::Float32 => Some(
                self.array
                    .as_primitive::<Float32Type>()
                    .iter()
                    .map(|v| v.map(f32::is_nan))
                    .collect(),
            ),
            DataType::Float64 => Some(
                self.array
                    .as_primitive::<Float64Type>()
                    .iter()
                    .map(|v| v.map(f64::is_nan))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Replace NaN entries with nulls. Non-float columns are returned as is.
    pub fn mask_nans(&self) -> Result<Column> {
        if self.nan_count() == 0 {
            return Ok(self.clone());
        }
        let Some(mask) = self.nan_mask() else {
            return Ok(self.clone());
        };
        let masked = nullif(self.array.as_ref(), &mask)?;
        Ok(Column::new(masked))
    }
}

/// A [`Column`] with an output name attached.
#[derive(Debug, Clone)]
pub struct NamedColumn {
    name: String,
    column: Column,
}

impl NamedColumn {
    pub fn new(name: impl Into<String>, column: Column) -> Self {
        Self {
            name: name.into(),
            column,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn column(&self) -> &Column {
        &self.column
    }

    #[inline]
    pub fn into_column(self) -> Column {
        self.column
    }

    #[must_use]
    pub fn rename(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: self.column,
        }
    }
}

impl std::ops::Deref for NamedColumn {
    type Target = Column;

    fn deref(&self) -> &Column {
        &self.column
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array};
    use std::sync::Arc;

    #[test]
    fn nan_count_ignores_nulls_and_non_floats() {
        let col = Column::new(Arc::new(Float64Array::from(vec![
            Some(1.0),
            Some(f64::NAN),
            None,
            Some(f64::NAN),
        ])));
        assert_eq!(col.nan_count(), 2);

        let ints = Column::new(Arc::new(Int64Array::from(vec![1, 2])));
        assert_eq!(ints.nan_count(), 0);
        assert!(ints.nan_mask().is_none());
    }

    #[test]
    fn mask_nans_turns_nan_into_null() {
        let col = Column::new(Arc::new(Float64Array::from(vec![
            Some(1.0),
            Some(f64::NAN),
            None,
        ])));
        let masked = col.mask_nans().unwrap();
        assert_eq!(masked.null_count(), 2);
        assert_eq!(masked.nan_count(), 0);
        let values = masked.array().as_primitive::<Float64Type>();
        assert_eq!(values.value(0), 1.0);
    }

    #[test]
    fn sorted_like_copies_metadata() {
        let sorted = Column::new(Arc::new(Int64Array::from(vec![1, 2, 3]))).set_sorted(
            Sorted::Yes,
            Order::Descending,
            NullOrder::After,
        );
        let other = Column::new(Arc::new(Int64Array::from(vec![4]))).sorted_like(&sorted);
        assert!(other.is_sorted());
        assert_eq!(other.order(), Order::Descending);
        assert_eq!(other.null_order(), NullOrder::After);
        assert!(other.is_scalar());
    }
}
