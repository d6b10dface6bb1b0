//! This module defines the canonical, type-safe representation of the logical column
//! types the binary codec understands.

use crate::error::CopybinError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The largest decimal precision that fits a 64-bit scaled integer.
pub const MAX_DECIMAL_PRECISION: u8 = 18;
/// Precision used when the database reports a decimal without one.
pub const DEFAULT_DECIMAL_PRECISION: u8 = 18;
/// Scale used when the database reports a decimal without one.
pub const DEFAULT_DECIMAL_SCALE: u8 = 3;

/// How structured (JSON) values are represented in memory.
///
/// This is chosen by the caller; it is never auto-detected from the data.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JsonRepr {
    /// **Default:** dynamic `serde_json::Value`s.
    #[default]
    Value,
    /// The raw JSON text, unparsed.
    Text,
    /// An Arrow `StructArray` whose fields are inferred from the decoded objects.
    Struct,
}

impl FromStr for JsonRepr {
    type Err = CopybinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "value" | "object" => Ok(Self::Value),
            "text" | "string" => Ok(Self::Text),
            "struct" => Ok(Self::Struct),
            other => Err(CopybinError::Config(format!(
                "invalid json representation '{}', expected 'value', 'text' or 'struct'",
                other
            ))),
        }
    }
}

/// The logical type of one column.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LogicalType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal { precision: u8, scale: u8 },
    Date,
    Time,
    /// Millisecond resolution, no timezone.
    Datetime,
    Text,
    Blob,
    Json(JsonRepr),
}

/// The shape of one record in a binary column file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    /// Every record is exactly this many bytes.
    Fixed(usize),
    /// UTF-8 bytes followed by a single 0x00 terminator.
    NulTerminated,
    /// An 8-byte little-endian length followed by that many bytes.
    LengthPrefixed,
}

impl LogicalType {
    /// Returns the record layout this type uses on the wire.
    ///
    /// Fails for decimals whose precision cannot be stored in a 64-bit integer.
    pub fn record_shape(&self) -> Result<RecordShape, CopybinError> {
        let shape = match self {
            Self::Boolean | Self::Int8 => RecordShape::Fixed(1),
            Self::Int16 => RecordShape::Fixed(2),
            Self::Int32 | Self::Float32 | Self::Date => RecordShape::Fixed(4),
            Self::Int64 | Self::Float64 | Self::Time => RecordShape::Fixed(8),
            Self::Datetime => RecordShape::Fixed(12),
            Self::Decimal { precision, scale } => {
                RecordShape::Fixed(DecimalWidth::for_decimal(*precision, *scale)?.bytes())
            }
            Self::Text | Self::Json(_) => RecordShape::NulTerminated,
            Self::Blob => RecordShape::LengthPrefixed,
        };
        Ok(shape)
    }

    /// Returns `true` if the data type is a signed integer.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// Returns `true` if the data type is a floating-point number.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decimal { precision, scale } => write!(f, "Decimal({}, {})", precision, scale),
            Self::Json(repr) => write!(f, "Json({:?})", repr),
            other => write!(f, "{:?}", other),
        }
    }
}

/// The signed integer width that stores a scaled decimal of a given precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalWidth {
    I8,
    I16,
    I32,
    I64,
}

impl DecimalWidth {
    /// Picks the smallest width holding `precision` digits: 1–2 -> 8-bit, 3–4 -> 16-bit,
    /// 5–9 -> 32-bit, 10–18 -> 64-bit. Anything wider would need 128-bit storage,
    /// which the wire format does not accept through this codec.
    pub fn for_precision(precision: u8) -> Result<Self, CopybinError> {
        match precision {
            1..=2 => Ok(Self::I8),
            3..=4 => Ok(Self::I16),
            5..=9 => Ok(Self::I32),
            10..=18 => Ok(Self::I64),
            0 => Err(CopybinError::UnsupportedType(
                "decimal precision must be at least 1".to_string(),
            )),
            p => Err(CopybinError::UnsupportedType(format!(
                "decimal precision {} too large for integer-based encoding (max {}, needs 16 bytes)",
                p, MAX_DECIMAL_PRECISION
            ))),
        }
    }

    /// Like [`DecimalWidth::for_precision`], also rejecting a scale above the precision.
    pub fn for_decimal(precision: u8, scale: u8) -> Result<Self, CopybinError> {
        let width = Self::for_precision(precision)?;
        if scale > precision {
            return Err(CopybinError::UnsupportedType(format!(
                "decimal scale {} exceeds precision {}",
                scale, precision
            )));
        }
        Ok(width)
    }

    pub fn bytes(&self) -> usize {
        match self {
            Self::I8 => 1,
            Self::I16 => 2,
            Self::I32 => 4,
            Self::I64 => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_width_boundaries() {
        assert_eq!(DecimalWidth::for_precision(1).unwrap(), DecimalWidth::I8);
        assert_eq!(DecimalWidth::for_precision(2).unwrap(), DecimalWidth::I8);
        assert_eq!(DecimalWidth::for_precision(3).unwrap(), DecimalWidth::I16);
        assert_eq!(DecimalWidth::for_precision(4).unwrap(), DecimalWidth::I16);
        assert_eq!(DecimalWidth::for_precision(5).unwrap(), DecimalWidth::I32);
        assert_eq!(DecimalWidth::for_precision(9).unwrap(), DecimalWidth::I32);
        assert_eq!(DecimalWidth::for_precision(10).unwrap(), DecimalWidth::I64);
        assert_eq!(DecimalWidth::for_precision(18).unwrap(), DecimalWidth::I64);
        assert!(matches!(
            DecimalWidth::for_precision(19),
            Err(CopybinError::UnsupportedType(_))
        ));
        assert!(DecimalWidth::for_precision(0).is_err());
    }

    #[test]
    fn test_record_shapes() {
        assert_eq!(LogicalType::Date.record_shape().unwrap(), RecordShape::Fixed(4));
        assert_eq!(LogicalType::Time.record_shape().unwrap(), RecordShape::Fixed(8));
        assert_eq!(LogicalType::Datetime.record_shape().unwrap(), RecordShape::Fixed(12));
        assert_eq!(
            LogicalType::Decimal { precision: 7, scale: 2 }.record_shape().unwrap(),
            RecordShape::Fixed(4)
        );
        assert_eq!(
            LogicalType::Json(JsonRepr::Struct).record_shape().unwrap(),
            RecordShape::NulTerminated
        );
        assert_eq!(LogicalType::Blob.record_shape().unwrap(), RecordShape::LengthPrefixed);
    }

    #[test]
    fn test_json_repr_from_str() {
        assert_eq!("Struct".parse::<JsonRepr>().unwrap(), JsonRepr::Struct);
        assert_eq!("object".parse::<JsonRepr>().unwrap(), JsonRepr::Value);
        assert!("yaml".parse::<JsonRepr>().is_err());
    }
}
