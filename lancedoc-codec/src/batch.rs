//! Arrow `RecordBatch` boundary.
//!
//! Rows are converted column by column. Struct members are looked up by name
//! so the member order of a row does not need to match the schema.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BinaryArray, BooleanArray, FixedSizeListArray, Float32Array,
    Float64Array, Int32Array, Int64Array, RecordBatch, StringArray, StructArray,
    TimestampSecondArray,
};
use arrow::buffer::NullBuffer;
use arrow::datatypes::{
    DataType, Field, Float32Type, Float64Type, Int32Type, Int64Type, SchemaRef, TimeUnit,
    TimestampSecondType,
};
use lancedoc_result::{Error, Result};
use lancedoc_types::{StorageRow, StorageValue, StructValue};
use tracing::debug;

static NULL: StorageValue = StorageValue::Null;

/// Build a batch conforming to `schema` from fully populated rows.
pub fn rows_to_record_batch(schema: &SchemaRef, rows: &[StorageRow]) -> Result<RecordBatch> {
    let mut columns = Vec::with_capacity(schema.fields().len());
    for field in schema.fields().iter() {
        let values = rows
            .iter()
            .map(|row| {
                row.get(field.name()).ok_or_else(|| {
                    Error::validation(format!("row has no value for column '{}'", field.name()))
                })
            })
            .collect::<Result<Vec<&StorageValue>>>()?;
        columns.push(build_array(field, &values)?);
    }
    let batch = RecordBatch::try_new(Arc::clone(schema), columns)?;
    debug!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "built record batch"
    );
    Ok(batch)
}

/// Split a batch back into rows, one [`StorageRow`] per batch row.
///
/// Columns the codec does not own, such as `_distance`, are carried along.
pub fn record_batch_to_rows(batch: &RecordBatch) -> Result<Vec<StorageRow>> {
    let schema = batch.schema();
    (0..batch.num_rows())
        .map(|row| {
            let mut out = StructValue::with_capacity(batch.num_columns());
            for (field, column) in schema.fields().iter().zip(batch.columns()) {
                out.insert(field.name().clone(), array_value(column.as_ref(), row)?);
            }
            Ok(out)
        })
        .collect()
}

fn mismatch(field: &Field, value: &StorageValue) -> Error {
    Error::validation(format!(
        "column '{}' expects {}, found {}",
        field.name(),
        field.data_type(),
        value.type_name()
    ))
}

macro_rules! primitive_array {
    ($field:expr, $values:expr, $array:ty, $variant:ident) => {{
        let data = $values
            .iter()
            .map(|value| match *value {
                StorageValue::Null => Ok(None),
                StorageValue::$variant(v) => Ok(Some(*v)),
                other => Err(mismatch($field, other)),
            })
            .collect::<Result<Vec<_>>>()?;
        Arc::new(<$array>::from(data)) as ArrayRef
    }};
}

fn build_array(field: &Field, values: &[&StorageValue]) -> Result<ArrayRef> {
    let array = match field.data_type() {
        DataType::Boolean => primitive_array!(field, values, BooleanArray, Boolean),
        DataType::Int32 => primitive_array!(field, values, Int32Array, Int32),
        DataType::Int64 => primitive_array!(field, values, Int64Array, Int64),
        DataType::Float32 => primitive_array!(field, values, Float32Array, Float32),
        DataType::Float64 => primitive_array!(field, values, Float64Array, Float64),
        DataType::Timestamp(TimeUnit::Second, tz) => {
            let data = values
                .iter()
                .map(|value| match *value {
                    StorageValue::Null => Ok(None),
                    StorageValue::TimestampSecond(v) => Ok(Some(*v)),
                    other => Err(mismatch(field, other)),
                })
                .collect::<Result<Vec<_>>>()?;
            Arc::new(TimestampSecondArray::from(data).with_timezone_opt(tz.clone())) as ArrayRef
        }
        DataType::Utf8 => {
            let data = values
                .iter()
                .map(|value| match *value {
                    StorageValue::Null => Ok(None),
                    StorageValue::Utf8(s) => Ok(Some(s.as_str())),
                    other => Err(mismatch(field, other)),
                })
                .collect::<Result<Vec<_>>>()?;
            Arc::new(StringArray::from(data)) as ArrayRef
        }
        DataType::Binary => {
            let data = values
                .iter()
                .map(|value| match *value {
                    StorageValue::Null => Ok(None),
                    StorageValue::Binary(b) => Ok(Some(b.as_slice())),
                    other => Err(mismatch(field, other)),
                })
                .collect::<Result<Vec<_>>>()?;
            Arc::new(BinaryArray::from_opt_vec(data)) as ArrayRef
        }
        DataType::FixedSizeList(item, size) => {
            let width = usize::try_from(*size)
                .map_err(|_| Error::Internal(format!("invalid list width {size}")))?;
            let mut flat = Vec::with_capacity(values.len() * width);
            let mut validity = Vec::with_capacity(values.len());
            for value in values {
                match *value {
                    StorageValue::Vector(v) if v.len() == width => {
                        flat.extend_from_slice(v);
                        validity.push(true);
                    }
                    StorageValue::Vector(v) => {
                        return Err(Error::validation(format!(
                            "column '{}' expects vectors of length {width}, found {}",
                            field.name(),
                            v.len()
                        )));
                    }
                    StorageValue::Null => {
                        flat.extend(std::iter::repeat_n(0.0_f32, width));
                        validity.push(false);
                    }
                    other => return Err(mismatch(field, other)),
                }
            }
            let child = Arc::new(Float32Array::from(flat)) as ArrayRef;
            let list =
                FixedSizeListArray::try_new(Arc::clone(item), *size, child, null_buffer(validity))?;
            Arc::new(list) as ArrayRef
        }
        DataType::Struct(children) => {
            let mut validity = Vec::with_capacity(values.len());
            for value in values {
                match *value {
                    StorageValue::Struct(_) => validity.push(true),
                    StorageValue::Null => validity.push(false),
                    other => return Err(mismatch(field, other)),
                }
            }

            let mut columns = Vec::with_capacity(children.len());
            for child in children.iter() {
                let child_values = values
                    .iter()
                    .map(|value| match *value {
                        StorageValue::Struct(inner) => inner.get(child.name()).ok_or_else(|| {
                            Error::validation(format!(
                                "struct column '{}' is missing member '{}'",
                                field.name(),
                                child.name()
                            ))
                        }),
                        _ => Ok(&NULL),
                    })
                    .collect::<Result<Vec<&StorageValue>>>()?;
                columns.push(build_array(child, &child_values)?);
            }

            let nulls = null_buffer(validity);
            let array = if children.is_empty() {
                StructArray::new_empty_fields(values.len(), nulls)
            } else {
                StructArray::try_new(children.clone(), columns, nulls)?
            };
            Arc::new(array) as ArrayRef
        }
        other => {
            return Err(Error::validation(format!(
                "column '{}' has unsupported storage type {other}",
                field.name()
            )));
        }
    };
    Ok(array)
}

fn null_buffer(validity: Vec<bool>) -> Option<NullBuffer> {
    if validity.iter().all(|valid| *valid) {
        None
    } else {
        Some(NullBuffer::from(validity))
    }
}

fn array_value(array: &dyn Array, row: usize) -> Result<StorageValue> {
    if array.is_null(row) {
        return Ok(StorageValue::Null);
    }
    let value = match array.data_type() {
        DataType::Boolean => StorageValue::Boolean(array.as_boolean().value(row)),
        DataType::Int32 => StorageValue::Int32(array.as_primitive::<Int32Type>().value(row)),
        DataType::Int64 => StorageValue::Int64(array.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => StorageValue::Float32(array.as_primitive::<Float32Type>().value(row)),
        DataType::Float64 => StorageValue::Float64(array.as_primitive::<Float64Type>().value(row)),
        DataType::Utf8 => StorageValue::Utf8(array.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => StorageValue::Utf8(array.as_string::<i64>().value(row).to_string()),
        DataType::Binary => StorageValue::Binary(array.as_binary::<i32>().value(row).to_vec()),
        DataType::Timestamp(TimeUnit::Second, _) => StorageValue::TimestampSecond(
            array.as_primitive::<TimestampSecondType>().value(row),
        ),
        DataType::FixedSizeList(item, _) if item.data_type() == &DataType::Float32 => {
            let list = array.as_fixed_size_list().value(row);
            StorageValue::Vector(list.as_primitive::<Float32Type>().values().to_vec())
        }
        DataType::Struct(fields) => {
            let array = array.as_struct();
            let mut out = StructValue::with_capacity(fields.len());
            for (idx, field) in fields.iter().enumerate() {
                out.insert(field.name().clone(), array_value(array.column(idx).as_ref(), row)?);
            }
            StorageValue::Struct(out)
        }
        other => {
            return Err(Error::validation(format!(
                "cannot read stored values of type {other}"
            )));
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::{Fields, Schema};

    use super::*;

    #[test]
    fn null_struct_masks_non_nullable_members() {
        let inner = Fields::from(vec![Field::new("flag", DataType::Boolean, false)]);
        let schema = Arc::new(Schema::new(vec![Field::new(
            "s",
            DataType::Struct(inner),
            true,
        )]));
        let present = StructValue::new().with(
            "s",
            StorageValue::Struct(StructValue::new().with("flag", StorageValue::Boolean(true))),
        );
        let absent = StructValue::new().with("s", StorageValue::Null);

        let batch = rows_to_record_batch(&schema, &[present.clone(), absent.clone()]).unwrap();
        assert_eq!(batch.column(0).null_count(), 1);
        assert_eq!(record_batch_to_rows(&batch).unwrap(), vec![present, absent]);
    }

    #[test]
    fn missing_column_is_reported() {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Utf8, false)]));
        let err = rows_to_record_batch(&schema, &[StructValue::new()]).unwrap_err();
        assert!(err.to_string().contains("'id'"));
    }

    #[test]
    fn mismatched_value_is_reported() {
        let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Int32, true)]));
        let row = StructValue::new().with("n", StorageValue::Utf8("x".into()));
        assert!(matches!(
            rows_to_record_batch(&schema, &[row]),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn empty_batches_are_allowed() {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Utf8, false)]));
        let batch = rows_to_record_batch(&schema, &[]).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert!(record_batch_to_rows(&batch).unwrap().is_empty());
    }
}
