//! Column extraction for recoding
//!
//! Survey extracts arrive as Arrow record batches whose numeric columns may
//! be stored as any numeric width (Stata exports vary by year). Recoding
//! only ever reads numeric codes, so extraction normalizes everything to
//! `Float64` up front.

use arrow::array::{Array, Float64Array};
use arrow::compute::kernels::cast::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::error::{HarmonizeError, Result};

/// Extract a column from a record batch as `Float64`.
///
/// Returns `Ok(None)` when the column is absent from this batch. Numeric
/// columns of other widths (and booleans) are cast; a column that cannot be
/// read as numeric codes is an error, since silently skipping it would turn
/// real responses into missing values.
pub fn numeric_column(batch: &RecordBatch, column_name: &str) -> Result<Option<Float64Array>> {
    let Ok(idx) = batch.schema().index_of(column_name) else {
        return Ok(None);
    };

    let column = batch.column(idx);
    let actual_type = column.data_type();

    if actual_type == &DataType::Float64 {
        return downcast(column, column_name).map(Some);
    }

    if actual_type.is_numeric() || actual_type == &DataType::Boolean {
        debug!("Casting column '{column_name}' from {actual_type:?} to Float64");
        let converted = cast(column, &DataType::Float64)?;
        return downcast(&converted, column_name).map(Some);
    }

    Err(HarmonizeError::ColumnType {
        column: column_name.to_string(),
        data_type: format!("{actual_type:?}"),
    })
}

fn downcast(array: &dyn Array, column_name: &str) -> Result<Float64Array> {
    array
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| HarmonizeError::ColumnType {
            column: column_name.to_string(),
            data_type: format!("{:?}", array.data_type()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("FLOATS", DataType::Float64, true),
            Field::new("INTS", DataType::Int32, true),
            Field::new("TEXT", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Float64Array::from(vec![Some(1.0), None])),
                Arc::new(Int32Array::from(vec![Some(2), Some(85)])),
                Arc::new(StringArray::from(vec!["a", "b"])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn float_columns_pass_through_with_nulls() {
        let column = numeric_column(&batch(), "FLOATS").unwrap().unwrap();
        assert_eq!(column.value(0), 1.0);
        assert!(column.is_null(1));
    }

    #[test]
    fn integer_columns_are_cast() {
        let column = numeric_column(&batch(), "INTS").unwrap().unwrap();
        assert_eq!(column.value(0), 2.0);
        assert_eq!(column.value(1), 85.0);
    }

    #[test]
    fn absent_columns_are_none() {
        assert!(numeric_column(&batch(), "NOPE").unwrap().is_none());
    }

    #[test]
    fn non_numeric_columns_are_an_error() {
        let err = numeric_column(&batch(), "TEXT").unwrap_err();
        assert!(matches!(err, HarmonizeError::ColumnType { .. }));
    }
}
