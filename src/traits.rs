//! This module defines shared traits used across different kernels.

use bytemuck::Pod;
use num_traits::{Bounded, PrimInt};

/// A plain-old-data scalar stored as one little-endian fixed-width record, with an
/// in-band bit pattern reserved for null.
pub trait WireScalar: Pod + PartialEq + Send + Sync {
    /// The type name used in error messages.
    const NAME: &'static str;

    /// The value written in place of a null element.
    fn null_sentinel() -> Self;

    /// Returns `true` if this decoded value is the null marker.
    fn is_null_sentinel(&self) -> bool;

    /// Converts a native value into its little-endian in-memory representation.
    fn to_wire(self) -> Self;

    /// Converts a little-endian in-memory representation back into a native value.
    fn to_native(self) -> Self;
}

// Signed integers reserve their minimum value for null.
macro_rules! impl_wire_int {
    ($($T:ty),+) => {
        $(
            impl WireScalar for $T {
                const NAME: &'static str = stringify!($T);

                fn null_sentinel() -> Self {
                    <$T as Bounded>::min_value()
                }

                fn is_null_sentinel(&self) -> bool {
                    *self == Self::null_sentinel()
                }

                fn to_wire(self) -> Self {
                    PrimInt::to_le(self)
                }

                fn to_native(self) -> Self {
                    <$T as PrimInt>::from_le(self)
                }
            }
        )+
    };
}

// Floats use NaN; every NaN payload reads back as null.
macro_rules! impl_wire_float {
    ($($T:ty),+) => {
        $(
            impl WireScalar for $T {
                const NAME: &'static str = stringify!($T);

                fn null_sentinel() -> Self {
                    <$T>::NAN
                }

                fn is_null_sentinel(&self) -> bool {
                    self.is_nan()
                }

                fn to_wire(self) -> Self {
                    <$T>::from_bits(self.to_bits().to_le())
                }

                fn to_native(self) -> Self {
                    <$T>::from_bits(self.to_bits().to_le())
                }
            }
        )+
    };
}

impl_wire_int!(i8, i16, i32, i64);
impl_wire_float!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_sentinels_are_type_minimums() {
        assert_eq!(i8::null_sentinel(), -128);
        assert_eq!(i16::null_sentinel(), i16::MIN);
        assert_eq!(i32::null_sentinel(), i32::MIN);
        assert_eq!(i64::null_sentinel(), i64::MIN);
        assert!(!0i32.is_null_sentinel());
    }

    #[test]
    fn test_float_sentinel_is_any_nan() {
        assert!(f32::null_sentinel().is_nan());
        assert!(f64::from_bits(0x7ff8_0000_0000_0001).is_null_sentinel());
        assert!(!1.5f64.is_null_sentinel());
    }

    #[test]
    fn test_wire_conversion_is_little_endian() {
        let wire = 0x0102_0304i32.to_wire();
        assert_eq!(bytemuck::bytes_of(&wire), &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(wire.to_native(), 0x0102_0304);
    }
}
