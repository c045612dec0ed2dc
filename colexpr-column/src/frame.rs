use std::sync::Arc;

use arrow::array::RecordBatch;
use arrow::datatypes::{Field, Schema};
use colexpr_result::{Error, Result};
use rustc_hash::FxHashMap;

use crate::column::{Column, NamedColumn};

/// An ordered collection of equal-length named columns.
#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    columns: Vec<NamedColumn>,
    lookup: FxHashMap<String, usize>,
    num_rows: usize,
}

impl DataFrame {
    /// Assemble a frame. All columns must share a length and names must be unique.
    pub fn new(columns: Vec<NamedColumn>) -> Result<Self> {
        let num_rows = columns.first().map_or(0, |c| c.len());
        let mut lookup = FxHashMap::with_capacity_and_hasher(columns.len(), Default::default());
        for (idx, col) in columns.iter().enumerate() {
            if col.len() != num_rows {
                return Err(Error::invalid_argument(format!(
                    "column '{}' has {} rows, expected {num_rows}",
                    col.name(),
                    col.len()
                )));
            }
            if lookup.insert(col.name().to_string(), idx).is_some() {
                return Err(Error::invalid_argument(format!(
                    "duplicate column name '{}'",
                    col.name()
                )));
            }
        }
        Ok(Self {
            columns,
            lookup,
            num_rows,
        })
    }

    pub fn from_record_batch(batch: &RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        let columns = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, array)| NamedColumn::new(field.name().clone(), Column::new(array.clone())))
            .collect();
        Self::new(columns)
    }

    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| Field::new(c.name(), c.data_type().clone(), true))
            .collect();
        let arrays = self.columns.iter().map(|c| c.array().clone()).collect();
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.lookup
            .get(name)
            .map(|&idx| self.columns[idx].column())
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[inline]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn columns(&self) -> &[NamedColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name())
    }

    pub fn into_columns(self) -> Vec<NamedColumn> {
        self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, StringArray};

    fn named(name: &str, values: Vec<i32>) -> NamedColumn {
        NamedColumn::new(name, Column::new(Arc::new(Int32Array::from(values))))
    }

    #[test]
    fn lookup_by_name() {
        let df = DataFrame::new(vec![named("a", vec![1, 2]), named("b", vec![3, 4])]).unwrap();
        assert_eq!(df.num_rows(), 2);
        assert_eq!(df.column("b").unwrap().len(), 2);
        assert!(matches!(df.column("c"), Err(Error::ColumnNotFound(name)) if name == "c"));
        assert_eq!(df.column_names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn rejects_ragged_and_duplicate_columns() {
        assert!(DataFrame::new(vec![named("a", vec![1, 2]), named("b", vec![3])]).is_err());
        assert!(DataFrame::new(vec![named("a", vec![1]), named("a", vec![3])]).is_err());
    }

    #[test]
    fn record_batch_conversion() {
        let df = DataFrame::new(vec![
            named("a", vec![1, 2, 3]),
            NamedColumn::new(
                "s",
                Column::new(Arc::new(StringArray::from(vec!["x", "y", "z"]))),
            ),
        ])
        .unwrap();
        let batch = df.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 3);
        let back = DataFrame::from_record_batch(&batch).unwrap();
        assert_eq!(back.num_columns(), 2);
        assert_eq!(back.column("s").unwrap().len(), 3);
    }
}
