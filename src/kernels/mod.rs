//! This module serves as the public API and dispatcher for the collection of all
//! pure, stateless record codecs.
//!
//! It declares all kernel sub-modules and provides the two unified dispatchers,
//! `encode_column` and `decode_column`, which select the codec for a column from its
//! logical type. These dispatchers are the sole entry point used by the transfer
//! orchestrator and the bridge.

use crate::error::CopybinError;
use crate::types::{FieldSpec, LogicalType, TypedColumn};

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Fixed-width records: integers, floats, booleans.
pub mod fixed_width;
pub mod decimal;
pub mod temporal;

/// Variable-length records.
pub mod text;
pub mod blob;
pub mod json;

//==================================================================================
// 2. Public API (Unified Dispatchers)
//==================================================================================

/// Encodes one column into the bytes of its binary column file, written as `target`.
pub fn encode_column(column: &TypedColumn, target: &LogicalType) -> Result<Vec<u8>, CopybinError> {
    if !column.is_compatible_with(target) {
        return Err(CopybinError::SchemaMismatch(format!(
            "cannot write a {} column as {}",
            column.logical_type(),
            target
        )));
    }

    let bytes = match column {
        TypedColumn::Boolean(v) => Ok(fixed_width::encode_boolean(v)),
        TypedColumn::Int8(v) => fixed_width::encode(v),
        TypedColumn::Int16(v) => fixed_width::encode(v),
        TypedColumn::Int32(v) => fixed_width::encode(v),
        TypedColumn::Int64(v) => fixed_width::encode(v),
        TypedColumn::Float32(v) => fixed_width::encode(v),
        TypedColumn::Float64(v) => fixed_width::encode(v),
        TypedColumn::Decimal { scale, values, .. } => match target {
            LogicalType::Decimal {
                precision: p,
                scale: s,
            } => decimal::encode(values, *scale, *p, *s),
            _ => Err(CopybinError::InternalError(
                "decimal column passed the compatibility check for a non-decimal type".to_string(),
            )),
        },
        TypedColumn::Date(v) => temporal::encode_date(v),
        TypedColumn::Time(v) => temporal::encode_time(v),
        TypedColumn::Datetime(v) => temporal::encode_datetime(v),
        TypedColumn::Text(v) => text::encode(v),
        TypedColumn::Blob(v) => Ok(blob::encode(v)),
        TypedColumn::Json(j) => json::encode(j),
    }?;

    log::debug!(
        "Encoded {} column: {} rows, {} nulls -> {} bytes",
        target,
        column.len(),
        column.null_count(),
        bytes.len()
    );
    Ok(bytes)
}

/// Decodes the bytes of one binary column file as the field's logical type.
pub fn decode_column(bytes: &[u8], field: &FieldSpec) -> Result<TypedColumn, CopybinError> {
    let column = match field.logical_type {
        LogicalType::Boolean => TypedColumn::Boolean(fixed_width::decode_boolean(bytes)?),
        LogicalType::Int8 => TypedColumn::Int8(fixed_width::decode(bytes)?),
        LogicalType::Int16 => TypedColumn::Int16(fixed_width::decode(bytes)?),
        LogicalType::Int32 => TypedColumn::Int32(fixed_width::decode(bytes)?),
        LogicalType::Int64 => TypedColumn::Int64(fixed_width::decode(bytes)?),
        LogicalType::Float32 => TypedColumn::Float32(fixed_width::decode(bytes)?),
        LogicalType::Float64 => TypedColumn::Float64(fixed_width::decode(bytes)?),
        LogicalType::Decimal { precision, scale } => {
            TypedColumn::decimal(precision, scale, decimal::decode(bytes, precision, scale)?)
        }
        LogicalType::Date => TypedColumn::Date(temporal::decode_date(bytes)?),
        LogicalType::Time => TypedColumn::Time(temporal::decode_time(bytes)?),
        LogicalType::Datetime => TypedColumn::Datetime(temporal::decode_datetime(bytes)?),
        LogicalType::Text => {
            let mut values = text::decode(bytes)?;
            if let Some(max) = field.meta.size {
                let shortened = text::truncate_to(&mut values, max);
                if shortened > 0 {
                    log::warn!(
                        "Column '{}': truncated {} value(s) to the reported size of {} bytes",
                        field.name,
                        shortened,
                        max
                    );
                }
            }
            TypedColumn::Text(values)
        }
        LogicalType::Blob => TypedColumn::Blob(blob::decode(bytes)?),
        LogicalType::Json(repr) => TypedColumn::Json(json::decode(bytes, repr)?),
    };

    log::debug!(
        "Decoded column '{}' ({}): {} bytes -> {} rows",
        field.name,
        field.logical_type,
        bytes.len(),
        column.len()
    );
    Ok(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn roundtrip(column: TypedColumn) {
        let field = FieldSpec::new("c", column.logical_type());
        let bytes = encode_column(&column, &field.logical_type).unwrap();
        assert_eq!(decode_column(&bytes, &field).unwrap(), column);
    }

    #[test]
    fn test_dispatch_roundtrips_every_kind() {
        roundtrip(TypedColumn::Boolean(vec![Some(true), None]));
        roundtrip(TypedColumn::Int16(vec![Some(-3), None]));
        roundtrip(TypedColumn::Float32(vec![Some(2.5), None]));
        roundtrip(TypedColumn::decimal(9, 2, vec![Some(-1050), None]));
        roundtrip(TypedColumn::Date(vec![NaiveDate::from_ymd_opt(2020, 1, 2), None]));
        roundtrip(TypedColumn::Text(vec![Some("x".to_string()), None]));
        roundtrip(TypedColumn::Blob(vec![Some(vec![0, 1]), None]));
    }

    #[test]
    fn test_encode_rejects_incompatible_target() {
        let column = TypedColumn::Int32(vec![Some(1)]);
        assert!(matches!(
            encode_column(&column, &LogicalType::Int64),
            Err(CopybinError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_decimal_is_rescaled_to_target() {
        // 1.239 held at scale 3, written as decimal(4, 2).
        let column = TypedColumn::decimal(10, 3, vec![Some(1239)]);
        let target = LogicalType::Decimal {
            precision: 4,
            scale: 2,
        };
        let bytes = encode_column(&column, &target).unwrap();
        let decoded = decode_column(&bytes, &FieldSpec::new("d", target)).unwrap();
        assert_eq!(decoded, TypedColumn::decimal(4, 2, vec![Some(123)]));
    }

    #[test]
    fn test_text_is_cut_to_reported_size() {
        let column = TypedColumn::Text(vec![Some("abcdef".to_string()), None]);
        let bytes = encode_column(&column, &LogicalType::Text).unwrap();
        let field = FieldSpec::new("t", LogicalType::Text).with_meta(crate::types::ColumnMeta {
            size: Some(3),
            ..Default::default()
        });
        assert_eq!(
            decode_column(&bytes, &field).unwrap(),
            TypedColumn::Text(vec![Some("abc".to_string()), None])
        );
    }
}
