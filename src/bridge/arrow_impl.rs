//! Conversion between Arrow `RecordBatch`es and copybin [`Table`]s.
//!
//! | Arrow                                  | copybin                    |
//! |----------------------------------------|----------------------------|
//! | Boolean, Int8..Int64, Float32/64       | same                       |
//! | Decimal128(p, s)                       | Decimal { p, s }           |
//! | Date32                                 | Date                       |
//! | Time32(s/ms), Time64(us/ns)            | Time                       |
//! | Timestamp(any unit, tz)                | Datetime (tz kept in meta) |
//! | Utf8 / LargeUtf8                       | Text                       |
//! | Utf8 tagged `arrow.json`               | Json (text)                |
//! | Binary / LargeBinary                   | Blob                       |
//! | Struct                                 | Json (struct)              |

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BinaryArray, BooleanArray, Date32Array, Decimal128Array,
    Float32Array, Float64Array, Int16Array, Int32Array, Int64Array, Int8Array, StringArray,
    Time32MillisecondArray, TimestampMillisecondArray,
};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Date32Type, Decimal128Type, Field, Float32Type, Float64Type,
    Int16Type, Int32Type, Int64Type, Int8Type, Schema, Time32MillisecondType, Time32SecondType,
    Time64MicrosecondType, Time64NanosecondType, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType,
};
use arrow::record_batch::RecordBatch;
use arrow::temporal_conversions::{as_date, as_datetime, as_time};
use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::error::CopybinError;
use crate::types::{
    ColumnMeta, FieldSpec, JsonColumn, SchemaDescriptor, Table, TypedColumn,
};

/// Field metadata key naming an Arrow extension type.
pub const EXTENSION_NAME_KEY: &str = "ARROW:extension:name";
/// The canonical extension name for JSON stored as UTF-8.
pub const JSON_EXTENSION_NAME: &str = "arrow.json";

//==================================================================================
// 1. Arrow -> Table
//==================================================================================

pub fn record_batch_to_table(batch: &RecordBatch) -> Result<Table, CopybinError> {
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut columns = Vec::with_capacity(batch.num_columns());
    for (field, array) in batch.schema().fields().iter().zip(batch.columns()) {
        let (column, meta) = array_to_column(field, array.as_ref())?;
        fields.push(FieldSpec::new(field.name().clone(), column.logical_type()).with_meta(meta));
        columns.push(column);
    }
    Table::try_new(SchemaDescriptor::try_from_fields(fields)?, columns)
}

fn is_json_field(field: &Field) -> bool {
    field
        .metadata()
        .get(EXTENSION_NAME_KEY)
        .is_some_and(|name| name == JSON_EXTENSION_NAME)
}

fn primitive<T: ArrowPrimitiveType>(array: &dyn Array) -> Vec<Option<T::Native>> {
    array.as_primitive::<T>().iter().collect()
}

/// Converts an integer-backed temporal array through one of arrow's conversions.
fn temporal<T, U, F>(
    array: &dyn Array,
    convert: F,
    what: &str,
) -> Result<Vec<Option<U>>, CopybinError>
where
    T: ArrowPrimitiveType,
    T::Native: Into<i64>,
    F: Fn(i64) -> Option<U>,
{
    array
        .as_primitive::<T>()
        .iter()
        .map(|v| match v {
            None => Ok(None),
            Some(raw) => {
                let raw: i64 = raw.into();
                convert(raw).map(Some).ok_or_else(|| {
                    CopybinError::InvalidValue(format!("{} value {} is out of range", what, raw))
                })
            }
        })
        .collect()
}

fn array_to_column(
    field: &Field,
    array: &dyn Array,
) -> Result<(TypedColumn, ColumnMeta), CopybinError> {
    let mut meta = ColumnMeta::default();
    let column = match array.data_type() {
        DataType::Boolean => TypedColumn::Boolean(array.as_boolean().iter().collect()),
        DataType::Int8 => TypedColumn::Int8(primitive::<Int8Type>(array)),
        DataType::Int16 => TypedColumn::Int16(primitive::<Int16Type>(array)),
        DataType::Int32 => TypedColumn::Int32(primitive::<Int32Type>(array)),
        DataType::Int64 => TypedColumn::Int64(primitive::<Int64Type>(array)),
        DataType::Float32 => TypedColumn::Float32(primitive::<Float32Type>(array)),
        DataType::Float64 => TypedColumn::Float64(primitive::<Float64Type>(array)),
        DataType::Decimal128(precision, scale) => {
            let scale = u8::try_from(*scale).map_err(|_| {
                CopybinError::UnsupportedType(format!(
                    "column '{}': negative decimal scale {}",
                    field.name(),
                    scale
                ))
            })?;
            TypedColumn::decimal(*precision, scale, primitive::<Decimal128Type>(array))
        }
        DataType::Date32 => {
            TypedColumn::Date(temporal::<Date32Type, _, _>(array, as_date::<Date32Type>, "date")?)
        }
        DataType::Time32(TimeUnit::Second) => {
            TypedColumn::Time(temporal::<Time32SecondType, _, _>(
                array,
                as_time::<Time32SecondType>,
                "time",
            )?)
        }
        DataType::Time32(TimeUnit::Millisecond) => {
            TypedColumn::Time(temporal::<Time32MillisecondType, _, _>(
                array,
                as_time::<Time32MillisecondType>,
                "time",
            )?)
        }
        DataType::Time64(TimeUnit::Microsecond) => {
            TypedColumn::Time(temporal::<Time64MicrosecondType, _, _>(
                array,
                as_time::<Time64MicrosecondType>,
                "time",
            )?)
        }
        DataType::Time64(TimeUnit::Nanosecond) => {
            TypedColumn::Time(temporal::<Time64NanosecondType, _, _>(
                array,
                as_time::<Time64NanosecondType>,
                "time",
            )?)
        }
        DataType::Timestamp(unit, tz) => {
            meta.tz = tz.as_ref().map(|tz| tz.to_string());
            let values = match unit {
                TimeUnit::Second => temporal::<TimestampSecondType, _, _>(
                    array,
                    as_datetime::<TimestampSecondType>,
                    "timestamp",
                )?,
                TimeUnit::Millisecond => temporal::<TimestampMillisecondType, _, _>(
                    array,
                    as_datetime::<TimestampMillisecondType>,
                    "timestamp",
                )?,
                TimeUnit::Microsecond => temporal::<TimestampMicrosecondType, _, _>(
                    array,
                    as_datetime::<TimestampMicrosecondType>,
                    "timestamp",
                )?,
                TimeUnit::Nanosecond => temporal::<TimestampNanosecondType, _, _>(
                    array,
                    as_datetime::<TimestampNanosecondType>,
                    "timestamp",
                )?,
            };
            TypedColumn::Datetime(values)
        }
        DataType::Utf8 | DataType::LargeUtf8 => {
            let values: Vec<Option<String>> = match array.data_type() {
                DataType::Utf8 => array
                    .as_string::<i32>()
                    .iter()
                    .map(|v| v.map(str::to_string))
                    .collect(),
                _ => array.as_string::<i64>().iter().map(|v| v.map(str::to_string)).collect(),
            };
            if is_json_field(field) {
                TypedColumn::Json(JsonColumn::Text(values))
            } else {
                TypedColumn::Text(values)
            }
        }
        DataType::Binary => {
            TypedColumn::Blob(
                array
                    .as_binary::<i32>()
                    .iter()
                    .map(|v| v.map(<[u8]>::to_vec))
                    .collect(),
            )
        }
        DataType::LargeBinary => {
            TypedColumn::Blob(
                array
                    .as_binary::<i64>()
                    .iter()
                    .map(|v| v.map(<[u8]>::to_vec))
                    .collect(),
            )
        }
        DataType::Struct(_) => TypedColumn::Json(JsonColumn::Struct(array.as_struct().clone())),
        other => {
            return Err(CopybinError::UnsupportedType(format!(
                "column '{}': Arrow type {} has no binary transfer mapping",
                field.name(),
                other
            )))
        }
    };
    Ok((column, meta))
}

//==================================================================================
// 2. Table -> Arrow
//==================================================================================

pub fn table_to_record_batch(table: &Table) -> Result<RecordBatch, CopybinError> {
    let mut fields = Vec::with_capacity(table.num_columns());
    let mut arrays = Vec::with_capacity(table.num_columns());
    for (spec, column) in table.schema().iter().zip(table.columns()) {
        let (field, array) = column_to_array(spec, column)?;
        fields.push(field);
        arrays.push(array);
    }
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

fn date_to_days(date: &NaiveDate) -> i32 {
    Date32Type::from_naive_date(*date)
}

fn time_to_millis(time: &NaiveTime) -> Result<i32, CopybinError> {
    let ms = time.nanosecond() / 1_000_000;
    if ms >= 1000 {
        return Err(CopybinError::InvalidValue(format!(
            "leap second {} has no Time32(ms) representation",
            time
        )));
    }
    // At most 86_399_999, well inside i32.
    Ok((time.num_seconds_from_midnight() * 1000 + ms) as i32)
}

fn json_field(name: &str) -> Field {
    Field::new(name, DataType::Utf8, true).with_metadata(HashMap::from([(
        EXTENSION_NAME_KEY.to_string(),
        JSON_EXTENSION_NAME.to_string(),
    )]))
}

fn column_to_array(
    spec: &FieldSpec,
    column: &TypedColumn,
) -> Result<(Field, ArrayRef), CopybinError> {
    let name = spec.name.as_str();
    let array: ArrayRef = match column {
        TypedColumn::Boolean(v) => Arc::new(BooleanArray::from(v.clone())),
        TypedColumn::Int8(v) => Arc::new(Int8Array::from(v.clone())),
        TypedColumn::Int16(v) => Arc::new(Int16Array::from(v.clone())),
        TypedColumn::Int32(v) => Arc::new(Int32Array::from(v.clone())),
        TypedColumn::Int64(v) => Arc::new(Int64Array::from(v.clone())),
        TypedColumn::Float32(v) => Arc::new(Float32Array::from(v.clone())),
        TypedColumn::Float64(v) => Arc::new(Float64Array::from(v.clone())),
        TypedColumn::Decimal {
            precision,
            scale,
            values,
        } => {
            let scale = i8::try_from(*scale).map_err(|_| {
                CopybinError::UnsupportedType(format!(
                    "column '{}': decimal scale {} too large",
                    name, scale
                ))
            })?;
            Arc::new(
                Decimal128Array::from(values.clone())
                    .with_precision_and_scale(*precision, scale)?,
            )
        }
        TypedColumn::Date(v) => Arc::new(Date32Array::from(
            v.iter().map(|d| d.as_ref().map(date_to_days)).collect::<Vec<_>>(),
        )),
        TypedColumn::Time(v) => {
            let millis = v
                .iter()
                .map(|t| t.as_ref().map(time_to_millis).transpose())
                .collect::<Result<Vec<_>, _>>()?;
            Arc::new(Time32MillisecondArray::from(millis))
        }
        TypedColumn::Datetime(v) => {
            let millis: Vec<Option<i64>> = v
                .iter()
                .map(|dt| dt.map(|dt| dt.and_utc().timestamp_millis()))
                .collect();
            let array = TimestampMillisecondArray::from(millis);
            match &spec.meta.tz {
                Some(tz) => Arc::new(array.with_timezone(tz.as_str())),
                None => Arc::new(array),
            }
        }
        TypedColumn::Text(v) => Arc::new(StringArray::from(v.clone())),
        TypedColumn::Blob(v) => Arc::new(BinaryArray::from_iter(v.iter().map(|b| b.as_deref()))),
        TypedColumn::Json(JsonColumn::Text(v)) => {
            return Ok((json_field(name), Arc::new(StringArray::from(v.clone()))));
        }
        TypedColumn::Json(JsonColumn::Value(v)) => {
            let docs = v
                .iter()
                .map(|doc| doc.as_ref().map(serde_json::to_string).transpose())
                .collect::<Result<Vec<_>, _>>()?;
            return Ok((json_field(name), Arc::new(StringArray::from(docs))));
        }
        TypedColumn::Json(JsonColumn::Struct(s)) => Arc::new(s.clone()),
    };
    let field = Field::new(name, array.data_type().clone(), true);
    Ok((field, array))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::StructArray;
    use chrono::NaiveDateTime;

    fn datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.3f").unwrap()
    }

    #[test]
    fn test_table_roundtrips_through_record_batch() {
        let table = Table::from_columns([
            ("flag", TypedColumn::Boolean(vec![Some(true), None])),
            ("n", TypedColumn::Int64(vec![None, Some(-9)])),
            ("price", TypedColumn::decimal(9, 2, vec![Some(12345), None])),
            (
                "day",
                TypedColumn::Date(vec![NaiveDate::from_ymd_opt(1969, 12, 31), None]),
            ),
            (
                "at",
                TypedColumn::Time(vec![NaiveTime::from_hms_milli_opt(1, 2, 3, 4), None]),
            ),
            (
                "ts",
                TypedColumn::Datetime(vec![Some(datetime("2001-02-03 04:05:06.789")), None]),
            ),
            ("s", TypedColumn::Text(vec![Some("a".to_string()), None])),
            ("b", TypedColumn::Blob(vec![None, Some(vec![1, 2])])),
        ])
        .unwrap();

        let batch = table_to_record_batch(&table).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(2).data_type(), &DataType::Decimal128(9, 2));
        assert_eq!(record_batch_to_table(&batch).unwrap(), table);
    }

    #[test]
    fn test_json_text_is_tagged_with_extension_name() {
        let table = Table::from_columns([(
            "doc",
            TypedColumn::Json(JsonColumn::Text(vec![Some("{}".to_string()), None])),
        )])
        .unwrap();
        let batch = table_to_record_batch(&table).unwrap();
        let field = batch.schema().field(0).clone();
        assert!(is_json_field(&field));
        assert_eq!(record_batch_to_table(&batch).unwrap(), table);
    }

    #[test]
    fn test_timestamp_units_and_timezone() {
        let array = arrow::array::TimestampMicrosecondArray::from(vec![Some(1_500_000i64), None])
            .with_timezone("+01:00");
        let schema = Schema::new(vec![Field::new("ts", array.data_type().clone(), true)]);
        let batch = RecordBatch::try_new(Arc::new(schema), vec![Arc::new(array)]).unwrap();

        let table = record_batch_to_table(&batch).unwrap();
        assert_eq!(table.schema().field(0).unwrap().meta.tz.as_deref(), Some("+01:00"));
        assert_eq!(
            table.columns()[0],
            TypedColumn::Datetime(vec![Some(datetime("1970-01-01 00:00:01.500")), None])
        );
    }

    #[test]
    fn test_struct_column_maps_to_json_struct() {
        let ids: ArrayRef = Arc::new(Int64Array::from(vec![Some(1), Some(2)]));
        let array = StructArray::from(vec![(
            Arc::new(Field::new("id", DataType::Int64, true)),
            ids,
        )]);
        let schema = Schema::new(vec![Field::new("doc", array.data_type().clone(), true)]);
        let batch = RecordBatch::try_new(Arc::new(schema), vec![Arc::new(array.clone())]).unwrap();

        let table = record_batch_to_table(&batch).unwrap();
        assert_eq!(table.columns()[0], TypedColumn::Json(JsonColumn::Struct(array)));
    }

    #[test]
    fn test_unsupported_arrow_type() {
        let array = arrow::array::UInt32Array::from(vec![1u32]);
        let schema = Schema::new(vec![Field::new("u", DataType::UInt32, false)]);
        let batch = RecordBatch::try_new(Arc::new(schema), vec![Arc::new(array)]).unwrap();
        assert!(matches!(
            record_batch_to_table(&batch),
            Err(CopybinError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_leap_second_time_is_rejected() {
        let leap = NaiveTime::from_hms_milli_opt(23, 59, 59, 1500).unwrap();
        let table = Table::from_columns([("t", TypedColumn::Time(vec![Some(leap)]))]).unwrap();
        assert!(matches!(
            table_to_record_batch(&table),
            Err(CopybinError::InvalidValue(_))
        ));
    }
}
