//! The bidirectional mapping between logical column types and the database's wire
//! type tags. Pure lookup, no I/O.

use crate::error::CopybinError;
use crate::types::logical_type::{DEFAULT_DECIMAL_PRECISION, DEFAULT_DECIMAL_SCALE};
use crate::types::{ColumnMeta, JsonRepr, LogicalType};

/// Timezone recorded for `*tz` wire types; the binary data itself carries none.
const UTC: &str = "UTC";

/// Wire tags that map to a single logical type without parameters.
///
/// NOTE: the order matters for `logical_to_wire`, the first tag listed for a logical
/// type is the one used when naming that type.
const WIRE_TYPE_TABLE: &[(&str, LogicalType)] = &[
    ("boolean", LogicalType::Boolean),
    ("tinyint", LogicalType::Int8),
    ("smallint", LogicalType::Int16),
    ("int", LogicalType::Int32),
    ("bigint", LogicalType::Int64),
    ("real", LogicalType::Float32),
    ("double", LogicalType::Float64),
    ("date", LogicalType::Date),
    ("time", LogicalType::Time),
    ("timestamp", LogicalType::Datetime),
    ("varchar", LogicalType::Text),
    ("char", LogicalType::Text),
    ("clob", LogicalType::Text),
    ("blob", LogicalType::Blob),
    // Interval types are exported as plain integers: milliseconds for the
    // second/day intervals, a month count for month intervals.
    ("sec_interval", LogicalType::Int64),
    ("day_interval", LogicalType::Int64),
    ("month_interval", LogicalType::Int32),
];

/// Returns the database type name for a logical type, ready to be used in DDL.
pub fn logical_to_wire(logical_type: &LogicalType) -> Result<String, CopybinError> {
    match logical_type {
        LogicalType::Decimal { precision, scale } => {
            // Validates the precision against what the codec can store.
            logical_type.record_shape()?;
            Ok(format!("decimal({},{})", precision, scale))
        }
        LogicalType::Json(_) => Ok("json".to_string()),
        other => WIRE_TYPE_TABLE
            .iter()
            .find(|(_, lt)| lt == other)
            .map(|(tag, _)| tag.to_string())
            .ok_or_else(|| {
                CopybinError::InternalError(format!("no wire type registered for {}", other))
            }),
    }
}

/// Resolves a driver-reported wire type tag into a logical type and its metadata.
///
/// `json` columns take the caller-selected representation `json_repr`. Unknown tags,
/// and tags the codec deliberately does not support (`hugeint`), fail with
/// `UnsupportedType` instead of falling back to a generic type.
pub fn wire_to_logical(
    tag: &str,
    precision: Option<u32>,
    scale: Option<u32>,
    json_repr: JsonRepr,
) -> Result<(LogicalType, ColumnMeta), CopybinError> {
    let tag = tag.trim().to_lowercase();
    let mut meta = ColumnMeta {
        precision,
        scale,
        ..ColumnMeta::default()
    };

    let logical_type = match tag.as_str() {
        "decimal" => {
            let precision =
                narrow_decimal_param(precision, DEFAULT_DECIMAL_PRECISION, "precision")?;
            let scale = narrow_decimal_param(scale, DEFAULT_DECIMAL_SCALE, "scale")?;
            LogicalType::Decimal { precision, scale }
        }
        "json" => LogicalType::Json(json_repr),
        "timestamptz" => {
            meta.tz = Some(UTC.to_string());
            LogicalType::Datetime
        }
        "timetz" => {
            meta.tz = Some(UTC.to_string());
            LogicalType::Time
        }
        "hugeint" => {
            return Err(CopybinError::UnsupportedType(
                "hugeint (128-bit integer) columns are not supported".to_string(),
            ))
        }
        other => WIRE_TYPE_TABLE
            .iter()
            .find(|(t, _)| *t == other)
            .map(|(_, lt)| *lt)
            .ok_or_else(|| {
                CopybinError::UnsupportedType(format!("unknown wire type code '{}'", other))
            })?,
    };

    Ok((logical_type, meta))
}

fn narrow_decimal_param(value: Option<u32>, default: u8, what: &str) -> Result<u8, CopybinError> {
    match value {
        None => Ok(default),
        Some(v) => u8::try_from(v).map_err(|_| {
            CopybinError::UnsupportedType(format!("decimal {} {} out of range", what, v))
        }),
    }
}
