//! This module contains the kernel for fixed-point decimal columns.
//!
//! A `Decimal(p, s)` value is stored as the integer `trunc(value * 10^s)` in the
//! smallest signed width holding `p` digits, using that width's null sentinel. All
//! arithmetic is done on `i128` unscaled integers, never in binary floating point.

use crate::error::CopybinError;
use crate::kernels::fixed_width;
use crate::traits::WireScalar;
use crate::types::DecimalWidth;

/// Returns `10^exp`, failing if it does not fit an `i128`.
fn pow10(exp: u32) -> Result<i128, CopybinError> {
    10i128.checked_pow(exp).ok_or_else(|| {
        CopybinError::InvalidValue(format!("decimal scale factor 10^{} overflows", exp))
    })
}

/// Moves an unscaled value from `from_scale` to `to_scale`, truncating toward zero
/// when digits are dropped.
pub fn rescale(value: i128, from_scale: u8, to_scale: u8) -> Result<i128, CopybinError> {
    if to_scale >= from_scale {
        let factor = pow10(u32::from(to_scale - from_scale))?;
        value.checked_mul(factor).ok_or_else(|| {
            CopybinError::InvalidValue(format!(
                "decimal {} overflows when rescaled from {} to {} digits",
                value, from_scale, to_scale
            ))
        })
    } else {
        // Integer division truncates toward zero, which is the rounding we want.
        Ok(value / pow10(u32::from(from_scale - to_scale))?)
    }
}

fn narrow<T>(scaled: &[Option<i128>]) -> Result<Vec<Option<T>>, CopybinError>
where
    T: WireScalar + num_traits::NumCast,
{
    scaled
        .iter()
        .map(|v| match v {
            None => Ok(None),
            Some(x) => num_traits::cast::<i128, T>(*x).map(Some).ok_or_else(|| {
                CopybinError::InvalidValue(format!("scaled decimal {} does not fit {}", x, T::NAME))
            }),
        })
        .collect()
}

fn widen<T>(values: Vec<Option<T>>) -> Vec<Option<i128>>
where
    T: WireScalar + Into<i128>,
{
    values.into_iter().map(|v| v.map(Into::into)).collect()
}

/// Encodes unscaled decimals held at `from_scale` as a `Decimal(precision, scale)` column.
///
/// Fails with `UnsupportedType` for precisions above 18, and with `InvalidValue` for
/// values that need more than `precision` digits once scaled.
pub fn encode(
    values: &[Option<i128>],
    from_scale: u8,
    precision: u8,
    scale: u8,
) -> Result<Vec<u8>, CopybinError> {
    let width = DecimalWidth::for_decimal(precision, scale)?;
    let limit = pow10(u32::from(precision))?;

    let mut scaled = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        let Some(v) = value else {
            scaled.push(None);
            continue;
        };
        let s = rescale(*v, from_scale, scale)?;
        if s.unsigned_abs() >= limit.unsigned_abs() {
            return Err(CopybinError::InvalidValue(format!(
                "row {}: decimal value with unscaled digits {} exceeds precision {}",
                idx, s, precision
            )));
        }
        scaled.push(Some(s));
    }

    match width {
        DecimalWidth::I8 => fixed_width::encode(&narrow::<i8>(&scaled)?),
        DecimalWidth::I16 => fixed_width::encode(&narrow::<i16>(&scaled)?),
        DecimalWidth::I32 => fixed_width::encode(&narrow::<i32>(&scaled)?),
        DecimalWidth::I64 => fixed_width::encode(&narrow::<i64>(&scaled)?),
    }
}

/// Decodes a `Decimal(precision, scale)` column into unscaled `i128` values at `scale`.
pub fn decode(bytes: &[u8], precision: u8, scale: u8) -> Result<Vec<Option<i128>>, CopybinError> {
    let values = match DecimalWidth::for_decimal(precision, scale)? {
        DecimalWidth::I8 => widen(fixed_width::decode::<i8>(bytes)?),
        DecimalWidth::I16 => widen(fixed_width::decode::<i16>(bytes)?),
        DecimalWidth::I32 => widen(fixed_width::decode::<i32>(bytes)?),
        DecimalWidth::I64 => widen(fixed_width::decode::<i64>(bytes)?),
    };
    Ok(values)
}

/// Renders an unscaled decimal as text, e.g. `(-12345, 2)` -> `"-123.45"`.
pub fn format_decimal(value: i128, scale: u8) -> String {
    let digits = value.unsigned_abs().to_string();
    let sign = if value < 0 { "-" } else { "" };
    let scale = usize::from(scale);
    if scale == 0 {
        return format!("{}{}", sign, digits);
    }
    let padded = format!("{:0>width$}", digits, width = scale + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    format!("{}{}.{}", sign, int_part, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_follows_precision() {
        let values = vec![Some(12i128), None];
        assert_eq!(encode(&values, 0, 2, 0).unwrap().len(), 2);
        assert_eq!(encode(&values, 0, 4, 0).unwrap().len(), 4);
        assert_eq!(encode(&values, 0, 9, 0).unwrap().len(), 8);
        assert_eq!(encode(&values, 0, 18, 0).unwrap().len(), 16);
    }

    #[test]
    fn test_null_uses_width_sentinel() {
        let bytes = encode(&[None], 2, 4, 2).unwrap();
        assert_eq!(bytes, i16::MIN.to_le_bytes().to_vec());
    }

    #[test]
    fn test_roundtrip_at_declared_scale() {
        // 123.45, -0.07, null, 0
        let values = vec![Some(12345i128), Some(-7), None, Some(0)];
        let bytes = encode(&values, 2, 7, 2).unwrap();
        assert_eq!(decode(&bytes, 7, 2).unwrap(), values);
    }

    #[test]
    fn test_extra_source_digits_are_truncated_not_rounded() {
        // 1.2399 and -1.2399 at scale 4, written at scale 2.
        let bytes = encode(&[Some(12399i128), Some(-12399)], 4, 5, 2).unwrap();
        assert_eq!(decode(&bytes, 5, 2).unwrap(), vec![Some(123), Some(-123)]);
    }

    #[test]
    fn test_upscaling_pads_zeros() {
        let bytes = encode(&[Some(15i128)], 1, 6, 3).unwrap();
        assert_eq!(decode(&bytes, 6, 3).unwrap(), vec![Some(1500)]);
    }

    #[test]
    fn test_precision_18_is_supported() {
        let max = 999_999_999_999_999_999i128;
        let values = vec![Some(max), Some(-max), None];
        let bytes = encode(&values, 3, 18, 3).unwrap();
        assert_eq!(decode(&bytes, 18, 3).unwrap(), values);
    }

    #[test]
    fn test_precision_19_is_unsupported() {
        let result = encode(&[Some(1i128)], 3, 19, 3);
        assert!(matches!(result, Err(CopybinError::UnsupportedType(_))));
        assert!(matches!(decode(&[], 19, 3), Err(CopybinError::UnsupportedType(_))));
    }

    #[test]
    fn test_value_exceeding_precision_is_rejected() {
        // 100.00 needs 5 digits at scale 2.
        let result = encode(&[Some(10000i128)], 2, 4, 2);
        assert!(matches!(result, Err(CopybinError::InvalidValue(_))));
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(-12345, 2), "-123.45");
        assert_eq!(format_decimal(7, 3), "0.007");
        assert_eq!(format_decimal(42, 0), "42");
        assert_eq!(format_decimal(-5, 1), "-0.5");
    }

    #[test]
    fn test_rescale_in_both_directions() {
        assert_eq!(rescale(-15, 1, 4).unwrap(), -15000);
        assert_eq!(rescale(-15999, 4, 2).unwrap(), -159);
        assert_eq!(rescale(7, 2, 2).unwrap(), 7);
        assert!(matches!(rescale(i128::MAX, 0, 1), Err(CopybinError::InvalidValue(_))));
    }
}
