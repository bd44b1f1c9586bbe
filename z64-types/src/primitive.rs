//! # Primitive Types
//!
//! Fixed-width big-endian scalars. Native integer widths map onto Rust's
//! integers; the 24-bit widths used by sample sizes get their own newtypes
//! with manual byte packing.
//!
//! Construction wraps (two's-complement truncation to the declared width),
//! while the write path rejects values outside `[MIN, MAX]`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::{slot, take, Codec};
use crate::error::{Result, Z64Error};

/// An integer scalar of fixed width and signedness.
pub trait Primitive: Codec + Copy + PartialEq + PartialOrd + Default + fmt::Debug {
    const BITS: u32;
    const SIGNED: bool;
    const MIN: i128;
    const MAX: i128;

    /// Truncate to the declared width, wrapping like a C cast.
    fn wrapping_from(value: i128) -> Self;

    fn to_i128(self) -> i128;

    /// Convert without wrapping, failing with `OutOfRange`.
    fn checked_from(value: i128) -> Result<Self> {
        if value < Self::MIN || value > Self::MAX {
            return Err(Z64Error::OutOfRange { type_name: Self::NAME, value });
        }
        Ok(Self::wrapping_from(value))
    }
}

macro_rules! native_int {
    ($($t:ty => $name:literal),+ $(,)?) => {$(
        impl Codec for $t {
            const SIZE: usize = std::mem::size_of::<$t>();
            const ALIGN: usize = std::mem::size_of::<$t>();
            const NAME: &'static str = $name;

            fn read(buf: &[u8], offset: usize) -> Result<Self> {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(take(buf, offset, Self::SIZE, Self::NAME)?);
                Ok(<$t>::from_be_bytes(raw))
            }

            fn write(&self, out: &mut [u8]) -> Result<()> {
                slot(out, 0, Self::SIZE, Self::NAME)?.copy_from_slice(&self.to_be_bytes());
                Ok(())
            }
        }

        impl Primitive for $t {
            const BITS: u32 = <$t>::BITS;
            const SIGNED: bool = <$t>::MIN != 0;
            const MIN: i128 = <$t>::MIN as i128;
            const MAX: i128 = <$t>::MAX as i128;

            #[inline]
            fn wrapping_from(value: i128) -> Self {
                value as $t
            }

            #[inline]
            fn to_i128(self) -> i128 {
                self as i128
            }
        }
    )+};
}

native_int! {
    u8 => "u8",
    i8 => "s8",
    u16 => "u16",
    i16 => "s16",
    u32 => "u32",
    i32 => "s32",
    u64 => "u64",
    i64 => "s64",
}

macro_rules! native_float {
    ($($t:ty => $name:literal),+ $(,)?) => {$(
        impl Codec for $t {
            const SIZE: usize = std::mem::size_of::<$t>();
            const ALIGN: usize = std::mem::size_of::<$t>();
            const NAME: &'static str = $name;

            fn read(buf: &[u8], offset: usize) -> Result<Self> {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(take(buf, offset, Self::SIZE, Self::NAME)?);
                Ok(<$t>::from_be_bytes(raw))
            }

            fn write(&self, out: &mut [u8]) -> Result<()> {
                slot(out, 0, Self::SIZE, Self::NAME)?.copy_from_slice(&self.to_be_bytes());
                Ok(())
            }
        }
    )+};
}

native_float! {
    f32 => "f32",
    f64 => "f64",
}

/// Single-byte boolean; any non-zero byte reads as `true`.
impl Codec for bool {
    const SIZE: usize = 1;
    const ALIGN: usize = 1;
    const NAME: &'static str = "bool";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        Ok(take(buf, offset, 1, Self::NAME)?[0] != 0)
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        slot(out, 0, 1, Self::NAME)?[0] = u8::from(*self);
        Ok(())
    }
}

// ============================================================================
// 24-bit integers
// ============================================================================

/// Unsigned 24-bit integer, stored as three big-endian bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct U24(u32);

impl U24 {
    pub const MIN: u32 = 0;
    pub const MAX: u32 = 0xFF_FFFF;

    /// Wraps to 24 bits.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value & Self::MAX)
    }

    /// Raw value, which may exceed 24 bits only if built with [`U24::new_unchecked`].
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Stores the value as-is; `write` reports it if it does not fit.
    #[inline]
    pub const fn new_unchecked(value: u32) -> Self {
        Self(value)
    }
}

impl Codec for U24 {
    const SIZE: usize = 3;
    // No machine word matches, so the triple is byte-aligned like `u8[3]`.
    const ALIGN: usize = 1;
    const NAME: &'static str = "u24";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let b = take(buf, offset, 3, Self::NAME)?;
        Ok(Self((b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32))
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        if self.0 > Self::MAX {
            return Err(Z64Error::OutOfRange { type_name: Self::NAME, value: self.0 as i128 });
        }
        let v = self.0;
        slot(out, 0, 3, Self::NAME)?.copy_from_slice(&[(v >> 16) as u8, (v >> 8) as u8, v as u8]);
        Ok(())
    }
}

impl Primitive for U24 {
    const BITS: u32 = 24;
    const SIGNED: bool = false;
    const MIN: i128 = U24::MIN as i128;
    const MAX: i128 = U24::MAX as i128;

    fn wrapping_from(value: i128) -> Self {
        Self::new(value as u32)
    }

    fn to_i128(self) -> i128 {
        self.0 as i128
    }
}

/// Signed 24-bit integer, stored as three big-endian bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct S24(i32);

impl S24 {
    pub const MIN: i32 = -0x80_0000;
    pub const MAX: i32 = 0x7F_FFFF;

    /// Wraps to 24 bits with sign extension.
    #[inline]
    pub const fn new(value: i32) -> Self {
        Self((value << 8) >> 8)
    }

    #[inline]
    pub const fn get(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn new_unchecked(value: i32) -> Self {
        Self(value)
    }
}

impl Codec for S24 {
    const SIZE: usize = 3;
    const ALIGN: usize = 1;
    const NAME: &'static str = "s24";

    fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let b = take(buf, offset, 3, Self::NAME)?;
        let raw = (b[0] as i32) << 16 | (b[1] as i32) << 8 | b[2] as i32;
        Ok(Self::new(raw))
    }

    fn write(&self, out: &mut [u8]) -> Result<()> {
        if self.0 < Self::MIN || self.0 > Self::MAX {
            return Err(Z64Error::OutOfRange { type_name: Self::NAME, value: self.0 as i128 });
        }
        let v = self.0 as u32;
        slot(out, 0, 3, Self::NAME)?.copy_from_slice(&[(v >> 16) as u8, (v >> 8) as u8, v as u8]);
        Ok(())
    }
}

impl Primitive for S24 {
    const BITS: u32 = 24;
    const SIGNED: bool = true;
    const MIN: i128 = S24::MIN as i128;
    const MAX: i128 = S24::MAX as i128;

    fn wrapping_from(value: i128) -> Self {
        Self::new(value as i32)
    }

    fn to_i128(self) -> i128 {
        self.0 as i128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_big_endian() {
        let buf = [0x12, 0x34, 0x56, 0x78, 0x9A];
        assert_eq!(u16::read(&buf, 0).unwrap(), 0x1234);
        assert_eq!(u32::read(&buf, 1).unwrap(), 0x3456_789A);
        assert_eq!(i8::read(&buf, 4).unwrap(), -102);
        assert_eq!(0xBEEFu16.to_bytes().unwrap(), vec![0xBE, 0xEF]);
        assert_eq!((-2i16).to_bytes().unwrap(), vec![0xFF, 0xFE]);
    }

    #[test]
    fn test_truncated_read() {
        let buf = [0u8; 3];
        let err = u32::read(&buf, 0).unwrap_err();
        assert!(matches!(err, Z64Error::Truncated { type_name: "u32", needed: 4, available: 3, .. }));
        assert!(u8::read(&buf, 3).is_err());
    }

    #[test]
    fn test_construction_wraps() {
        assert_eq!(u8::wrapping_from(0x1FF), 0xFF);
        assert_eq!(i8::wrapping_from(200), -56);
        assert_eq!(u16::wrapping_from(-1), 0xFFFF);
        assert_eq!(U24::new(0x1234_5678).get(), 0x34_5678);
        assert_eq!(S24::new(0x80_0000).get(), -0x80_0000);
        assert_eq!(S24::wrapping_from(0xFF_FFFF).get(), -1);
    }

    #[test]
    fn test_checked_from() {
        assert_eq!(u8::checked_from(255).unwrap(), 255);
        assert!(matches!(
            u8::checked_from(256),
            Err(Z64Error::OutOfRange { type_name: "u8", value: 256 })
        ));
        assert!(i16::checked_from(-32769).is_err());
        assert!(U24::checked_from(0x100_0000).is_err());
    }

    #[test]
    fn test_u24_codec() {
        let buf = [0xAB, 0xCD, 0xEF];
        let v = U24::read(&buf, 0).unwrap();
        assert_eq!(v.get(), 0xAB_CDEF);
        assert_eq!(v.to_bytes().unwrap(), buf.to_vec());
        assert_eq!(U24::SIZE, 3);
    }

    #[test]
    fn test_s24_sign_extension() {
        let buf = [0xFF, 0xFF, 0xFE];
        assert_eq!(S24::read(&buf, 0).unwrap().get(), -2);
        assert_eq!(S24::new(-2).to_bytes().unwrap(), buf.to_vec());
        assert_eq!(S24::new(0x7F_FFFF).to_bytes().unwrap(), vec![0x7F, 0xFF, 0xFF]);
    }

    #[test]
    fn test_write_rejects_out_of_range() {
        let err = U24::new_unchecked(0x100_0000).to_bytes().unwrap_err();
        assert!(matches!(err, Z64Error::OutOfRange { type_name: "u24", .. }));
        assert!(S24::new_unchecked(0x80_0000).to_bytes().is_err());
        assert!(S24::new_unchecked(-0x80_0001).to_bytes().is_err());
    }

    #[test]
    fn test_bool_coercion() {
        assert!(bool::read(&[2], 0).unwrap());
        assert!(!bool::read(&[0], 0).unwrap());
        assert_eq!(true.to_bytes().unwrap(), vec![1]);
    }

    #[test]
    fn test_float() {
        let bytes = 1.5f32.to_bytes().unwrap();
        assert_eq!(bytes, vec![0x3F, 0xC0, 0x00, 0x00]);
        assert_eq!(f32::read(&bytes, 0).unwrap(), 1.5);
    }

    #[test]
    fn test_primitive_constants() {
        assert!(!u32::SIGNED);
        assert!(i32::SIGNED);
        assert_eq!(i8::MIN, -128);
        assert_eq!(<i8 as Primitive>::MAX, 127);
        assert_eq!(<u16 as Primitive>::BITS, 16);
        assert_eq!(<U24 as Primitive>::MAX, 0xFF_FFFF);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_u8_wraps_like_cast(v in any::<i64>()) {
                prop_assert_eq!(u8::wrapping_from(v as i128), v as u8);
            }

            #[test]
            fn prop_s8_wraps_like_cast(v in any::<i64>()) {
                prop_assert_eq!(i8::wrapping_from(v as i128), v as i8);
            }

            #[test]
            fn prop_u32_roundtrip(v in any::<u32>()) {
                let bytes = v.to_bytes().unwrap();
                prop_assert_eq!(bytes.len(), 4);
                prop_assert_eq!(u32::read(&bytes, 0).unwrap(), v);
            }

            #[test]
            fn prop_s24_roundtrip(v in S24::MIN..=S24::MAX) {
                let value = S24::new(v);
                prop_assert_eq!(value.get(), v);
                let bytes = value.to_bytes().unwrap();
                prop_assert_eq!(S24::read(&bytes, 0).unwrap(), value);
            }

            #[test]
            fn prop_u24_wraps_to_24_bits(v in any::<u32>()) {
                prop_assert_eq!(U24::new(v).get(), v & 0xFF_FFFF);
            }
        }
    }
}
