//! This module contains the pure, stateless kernels for fixed-width scalar columns:
//! signed integers, floats and booleans.
//!
//! Every record is the little-endian value itself; nulls are written in-band as the
//! type's sentinel (minimum value for integers, NaN for floats, 128 for booleans).
//! This module is panic-free and relies on `bytemuck` for the byte casting.

use crate::error::CopybinError;
use crate::traits::WireScalar;

/// Boolean records: 0 = false, 1 = true, 128 = null.
pub const BOOLEAN_FALSE: u8 = 0;
pub const BOOLEAN_TRUE: u8 = 1;
pub const BOOLEAN_NULL: u8 = 128;

//==================================================================================
// 1. Shared Helpers
//==================================================================================

/// Ensures `bytes` holds a whole number of `width`-byte records and returns the count.
pub(crate) fn record_count(bytes: &[u8], width: usize, what: &str) -> Result<usize, CopybinError> {
    if width == 0 || bytes.len() % width != 0 {
        return Err(CopybinError::CorruptData(format!(
            "{} column file is {} bytes, not a multiple of the {}-byte record size",
            what,
            bytes.len(),
            width
        )));
    }
    Ok(bytes.len() / width)
}

//==================================================================================
// 2. Integers & Floats
//==================================================================================

/// Encodes optional scalars into little-endian records, nulls as the sentinel.
///
/// A non-null integer equal to the sentinel is rejected: it would read back as null.
/// A float `Some(NaN)` is written as-is and therefore reads back as null.
pub fn encode<T: WireScalar>(values: &[Option<T>]) -> Result<Vec<u8>, CopybinError> {
    let mut records: Vec<T> = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        let native = match value {
            None => T::null_sentinel(),
            Some(v) => {
                // NaN never compares equal, so only integers can trip this.
                if *v == T::null_sentinel() {
                    return Err(CopybinError::InvalidValue(format!(
                        "row {}: {} value equals the null sentinel",
                        idx,
                        T::NAME
                    )));
                }
                *v
            }
        };
        records.push(native.to_wire());
    }
    Ok(bytemuck::cast_slice::<T, u8>(&records).to_vec())
}

/// Decodes little-endian records back into optional scalars.
pub fn decode<T: WireScalar>(bytes: &[u8]) -> Result<Vec<Option<T>>, CopybinError> {
    let width = std::mem::size_of::<T>();
    let count = record_count(bytes, width, T::NAME)?;
    let mut values = Vec::with_capacity(count);
    // File buffers carry no alignment guarantee, so each record is read unaligned.
    for chunk in bytes.chunks_exact(width) {
        let value = bytemuck::pod_read_unaligned::<T>(chunk).to_native();
        values.push(if value.is_null_sentinel() {
            None
        } else {
            Some(value)
        });
    }
    Ok(values)
}

//==================================================================================
// 3. Booleans
//==================================================================================

pub fn encode_boolean(values: &[Option<bool>]) -> Vec<u8> {
    values
        .iter()
        .map(|v| match v {
            None => BOOLEAN_NULL,
            Some(true) => BOOLEAN_TRUE,
            Some(false) => BOOLEAN_FALSE,
        })
        .collect()
}

pub fn decode_boolean(bytes: &[u8]) -> Result<Vec<Option<bool>>, CopybinError> {
    bytes
        .iter()
        .enumerate()
        .map(|(idx, b)| match *b {
            BOOLEAN_FALSE => Ok(Some(false)),
            BOOLEAN_TRUE => Ok(Some(true)),
            BOOLEAN_NULL => Ok(None),
            other => Err(CopybinError::CorruptData(format!(
                "row {}: invalid boolean byte 0x{:02x}",
                idx, other
            ))),
        })
        .collect()
}

//==================================================================================
// 4. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int8_layout_with_null() {
        let values = vec![Some(1i8), None, Some(-5)];
        let bytes = encode(&values).unwrap();
        assert_eq!(bytes, vec![0x01, 0x80, 0xFB]);
        assert_eq!(decode::<i8>(&bytes).unwrap(), values);
    }

    #[test]
    fn test_int32_layout_is_little_endian() {
        let bytes = encode(&[Some(0x0A0B_0C0Di32), None]).unwrap();
        assert_eq!(bytes, vec![0x0D, 0x0C, 0x0B, 0x0A, 0x00, 0x00, 0x00, 0x80]);
    }

    #[test]
    fn test_int64_roundtrip_extremes() {
        let values = vec![Some(i64::MAX), Some(i64::MIN + 1), None, Some(0)];
        let bytes = encode(&values).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(decode::<i64>(&bytes).unwrap(), values);
    }

    #[test]
    fn test_integer_equal_to_sentinel_is_rejected() {
        let result = encode(&[Some(i16::MIN)]);
        assert!(matches!(result, Err(CopybinError::InvalidValue(_))));
    }

    #[test]
    fn test_float_null_is_nan() {
        let bytes = encode(&[Some(1.5f64), None]).unwrap();
        let second = f64::from_le_bytes(bytes[8..16].try_into().unwrap());
        assert!(second.is_nan());
        assert_eq!(decode::<f64>(&bytes).unwrap(), vec![Some(1.5), None]);
    }

    #[test]
    fn test_float_nan_value_reads_back_as_null() {
        let bytes = encode(&[Some(f32::NAN), Some(-0.25f32)]).unwrap();
        assert_eq!(decode::<f32>(&bytes).unwrap(), vec![None, Some(-0.25)]);
    }

    #[test]
    fn test_decode_rejects_partial_record() {
        let result = decode::<i32>(&[1, 2, 3, 4, 5]);
        assert!(matches!(result, Err(CopybinError::CorruptData(_))));
    }

    #[test]
    fn test_decode_empty_file_is_empty_column() {
        assert_eq!(decode::<i64>(&[]).unwrap(), Vec::<Option<i64>>::new());
    }

    #[test]
    fn test_boolean_roundtrip() {
        let values = vec![Some(true), None, Some(false)];
        let bytes = encode_boolean(&values);
        assert_eq!(bytes, vec![1, 128, 0]);
        assert_eq!(decode_boolean(&bytes).unwrap(), values);
    }

    #[test]
    fn test_boolean_rejects_unknown_byte() {
        assert!(matches!(
            decode_boolean(&[0, 7]),
            Err(CopybinError::CorruptData(_))
        ));
    }
}
