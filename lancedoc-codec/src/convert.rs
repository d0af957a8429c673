//! Conversions between logical metadata values and physical storage values.

use arrow::datatypes::{DataType, Field, Fields, TimeUnit};
use lancedoc_result::{Error, Result};
use lancedoc_types::timestamp::{format_iso8601, parse_iso8601, to_epoch_seconds};
use lancedoc_types::{MetaValue, StorageValue};

/// Zero value written for an absent non-nullable leaf.
pub(crate) fn zero_value(data_type: &DataType, path: &str) -> Result<StorageValue> {
    let value = match data_type {
        DataType::Utf8 => StorageValue::Utf8(String::new()),
        DataType::Int32 => StorageValue::Int32(0),
        DataType::Int64 => StorageValue::Int64(0),
        DataType::Float32 => StorageValue::Float32(0.0),
        DataType::Float64 => StorageValue::Float64(0.0),
        DataType::Boolean => StorageValue::Boolean(false),
        DataType::Binary => StorageValue::Binary(Vec::new()),
        DataType::Timestamp(TimeUnit::Second, _) => StorageValue::TimestampSecond(0),
        DataType::FixedSizeList(_, size) => {
            StorageValue::Vector(vec![0.0; usize::try_from(*size).unwrap_or_default()])
        }
        other => {
            return Err(Error::Internal(format!(
                "no zero value for '{path}' of type {other}"
            )));
        }
    };
    Ok(value)
}

/// Placeholder for an absent leaf: null when the column allows it.
pub(crate) fn leaf_placeholder(field: &Field, path: &str) -> Result<StorageValue> {
    if field.is_nullable() {
        Ok(StorageValue::Null)
    } else {
        zero_value(field.data_type(), path)
    }
}

/// Convert a present metadata leaf to the storage type declared by `field`.
///
/// Integers widen into float columns. Timestamps accept either a native
/// instant or an ISO-8601 string. Anything else that does not match the
/// declared type is rejected.
pub(crate) fn leaf_to_storage(value: &MetaValue, field: &Field, path: &str) -> Result<StorageValue> {
    let mismatch = || {
        Error::validation(format!(
            "'{path}' is declared as {}, cannot store a {} value",
            field.data_type(),
            value.type_name()
        ))
    };

    let stored = match (field.data_type(), value) {
        (_, MetaValue::Null) => {
            if !field.is_nullable() {
                return Err(Error::validation(format!(
                    "'{path}' is not nullable, cannot store null"
                )));
            }
            StorageValue::Null
        }
        (DataType::Utf8, MetaValue::String(s)) => StorageValue::Utf8(s.clone()),
        (DataType::Int32, MetaValue::Int(v)) => {
            let narrowed = i32::try_from(*v).map_err(|_| {
                Error::validation(format!("'{path}' value {v} does not fit in int32"))
            })?;
            StorageValue::Int32(narrowed)
        }
        (DataType::Int64, MetaValue::Int(v)) => StorageValue::Int64(*v),
        (DataType::Float32, MetaValue::Float(v)) => StorageValue::Float32(*v as f32),
        (DataType::Float32, MetaValue::Int(v)) => StorageValue::Float32(*v as f32),
        (DataType::Float64, MetaValue::Float(v)) => StorageValue::Float64(*v),
        (DataType::Float64, MetaValue::Int(v)) => StorageValue::Float64(*v as f64),
        (DataType::Boolean, MetaValue::Bool(b)) => StorageValue::Boolean(*b),
        (DataType::Binary, MetaValue::Bytes(b)) => StorageValue::Binary(b.clone()),
        (DataType::Timestamp(TimeUnit::Second, _), MetaValue::Timestamp(t)) => {
            StorageValue::TimestampSecond(to_epoch_seconds(t))
        }
        (DataType::Timestamp(TimeUnit::Second, _), MetaValue::String(s)) => {
            let parsed = parse_iso8601(s)
                .map_err(|err| Error::validation(format!("'{path}': {err}")))?;
            StorageValue::TimestampSecond(to_epoch_seconds(&parsed))
        }
        _ => return Err(mismatch()),
    };
    Ok(stored)
}

/// Convert a stored leaf back to its logical value.
///
/// Timestamps come back as `YYYY-MM-DDTHH:MM:SS` strings in UTC.
pub(crate) fn leaf_from_storage(value: &StorageValue, path: &str) -> Result<MetaValue> {
    let logical = match value {
        StorageValue::Null => MetaValue::Null,
        StorageValue::Boolean(b) => MetaValue::Bool(*b),
        StorageValue::Int32(v) => MetaValue::Int(i64::from(*v)),
        StorageValue::Int64(v) => MetaValue::Int(*v),
        StorageValue::Float32(v) => MetaValue::Float(f64::from(*v)),
        StorageValue::Float64(v) => MetaValue::Float(*v),
        StorageValue::Utf8(s) => MetaValue::String(s.clone()),
        StorageValue::Binary(b) => MetaValue::Bytes(b.clone()),
        StorageValue::TimestampSecond(seconds) => MetaValue::String(format_iso8601(*seconds)?),
        StorageValue::Vector(_) | StorageValue::Struct(_) => {
            return Err(Error::validation(format!(
                "'{path}' holds a {} where a scalar was expected",
                value.type_name()
            )));
        }
    };
    Ok(logical)
}

/// Member fields of a struct-typed field, `None` for leaves.
pub(crate) fn struct_children(field: &Field) -> Option<&Fields> {
    match field.data_type() {
        DataType::Struct(children) => Some(children),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_range_checked_for_int32() {
        let field = Field::new("n", DataType::Int32, true);
        assert_eq!(
            leaf_to_storage(&MetaValue::Int(7), &field, "meta.n").unwrap(),
            StorageValue::Int32(7)
        );
        let err = leaf_to_storage(&MetaValue::Int(i64::from(i32::MAX) + 1), &field, "meta.n")
            .unwrap_err();
        assert!(err.to_string().contains("int32"));
    }

    #[test]
    fn integers_widen_into_float_columns() {
        let field = Field::new("r", DataType::Float64, true);
        assert_eq!(
            leaf_to_storage(&MetaValue::Int(3), &field, "meta.r").unwrap(),
            StorageValue::Float64(3.0)
        );
        let field = Field::new("w", DataType::Float32, true);
        assert_eq!(
            leaf_to_storage(&MetaValue::Float(0.5), &field, "meta.w").unwrap(),
            StorageValue::Float32(0.5)
        );
    }

    #[test]
    fn timestamp_strings_are_parsed() {
        let field = Field::new("d", DataType::Timestamp(TimeUnit::Second, None), true);
        let stored =
            leaf_to_storage(&MetaValue::from("2024-01-02T03:04:05"), &field, "meta.d").unwrap();
        assert_eq!(stored, StorageValue::TimestampSecond(1_704_164_645));
        assert_eq!(
            leaf_from_storage(&stored, "meta.d").unwrap(),
            MetaValue::from("2024-01-02T03:04:05")
        );

        let err = leaf_to_storage(&MetaValue::from("yesterday"), &field, "meta.d").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn type_mismatches_are_rejected() {
        let field = Field::new("flag", DataType::Boolean, true);
        let err = leaf_to_storage(&MetaValue::from("yes"), &field, "meta.flag").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("meta.flag"));
    }

    #[test]
    fn null_requires_a_nullable_field() {
        let nullable = Field::new("a", DataType::Utf8, true);
        assert_eq!(
            leaf_to_storage(&MetaValue::Null, &nullable, "meta.a").unwrap(),
            StorageValue::Null
        );
        let required = Field::new("a", DataType::Utf8, false);
        assert!(leaf_to_storage(&MetaValue::Null, &required, "meta.a").is_err());
    }

    #[test]
    fn placeholders_follow_nullability() {
        let nullable = Field::new("a", DataType::Int64, true);
        assert_eq!(leaf_placeholder(&nullable, "a").unwrap(), StorageValue::Null);
        let required = Field::new("a", DataType::Int64, false);
        assert_eq!(leaf_placeholder(&required, "a").unwrap(), StorageValue::Int64(0));
    }
}
