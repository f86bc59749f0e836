//! Hash mixing of inserted values into uniformly distributed 64-bit hashes.
//!
//! Two families are used:
//! - fixed-width numbers are widened to `u64` and passed through a single
//!   round of an avalanche finalizer (multiply / xor / shift),
//! - variable-length text and bytes are hashed with 64-bit FNV-1a, folding
//!   UTF-16 code units for text and single bytes for byte sequences.
//!
//! The family is part of an estimator's identity: estimators are only
//! meaningfully merged when their values went through the same mixer.

use byteorder::{ByteOrder, LittleEndian};

const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;
const K: u64 = 0xff51_afd7_ed55_8ccd;

/// FNV-1a 64-bit offset basis
pub const FNV1A_64_INIT: u64 = 14_695_981_039_346_656_037;
/// FNV-1a 64-bit prime
pub const FNV1A_64_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Avalanche mix of a 64-bit pattern
#[inline]
pub fn mix64(mut h: u64) -> u64 {
    h = h.wrapping_mul(C1);
    h ^= h.rotate_left(31).wrapping_mul(C2);
    h = (h ^ (h >> 33)).wrapping_mul(K);
    h ^ (h >> 33)
}

/// FNV-1a hash of a byte sequence. Empty input hashes to [`FNV1A_64_INIT`].
#[inline]
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    fnv1a64_units(bytes.iter().copied())
}

/// FNV-1a hash of text, one UTF-16 code unit per step.
/// Agrees with [`fnv1a64`] on ASCII text.
#[inline]
pub fn fnv1a64_utf16(text: &str) -> u64 {
    fnv1a64_units(text.encode_utf16())
}

#[inline]
fn fnv1a64_units<U: Into<u64>>(units: impl Iterator<Item = U>) -> u64 {
    units.fold(FNV1A_64_INIT, |hash, unit| {
        (hash ^ unit.into()).wrapping_mul(FNV1A_64_PRIME)
    })
}

/// Value which can be mixed into a 64-bit hash and inserted into an estimator.
pub trait Mix {
    fn mix(&self) -> u64;
}

/// Fixed-width number which can also be decoded from little-endian bytes.
pub trait LeNumeric: Mix + Copy {
    /// Encoded width in bytes
    const WIDTH: usize;
    /// Decode from the first `WIDTH` bytes of `buf`
    fn read_le(buf: &[u8]) -> Self;
}

macro_rules! impl_mix_unsigned {
    ($($t:ty),*) => {$(
        impl Mix for $t {
            #[inline]
            fn mix(&self) -> u64 {
                mix64(u64::from(*self))
            }
        }
    )*};
}

macro_rules! impl_mix_signed {
    ($($t:ty),*) => {$(
        impl Mix for $t {
            #[inline]
            fn mix(&self) -> u64 {
                // sign-extend, then reinterpret
                mix64(i64::from(*self) as u64)
            }
        }
    )*};
}

impl_mix_unsigned!(u8, u16, u32, u64);
impl_mix_signed!(i8, i16, i32, i64);

impl Mix for usize {
    #[inline]
    fn mix(&self) -> u64 {
        mix64(*self as u64)
    }
}

impl Mix for isize {
    #[inline]
    fn mix(&self) -> u64 {
        mix64(*self as i64 as u64)
    }
}

impl Mix for f32 {
    #[inline]
    fn mix(&self) -> u64 {
        mix64(u64::from(self.to_bits()))
    }
}

impl Mix for f64 {
    #[inline]
    fn mix(&self) -> u64 {
        mix64(self.to_bits())
    }
}

impl Mix for str {
    #[inline]
    fn mix(&self) -> u64 {
        fnv1a64_utf16(self)
    }
}

impl Mix for String {
    #[inline]
    fn mix(&self) -> u64 {
        fnv1a64_utf16(self)
    }
}

impl Mix for [u8] {
    #[inline]
    fn mix(&self) -> u64 {
        fnv1a64(self)
    }
}

impl Mix for Vec<u8> {
    #[inline]
    fn mix(&self) -> u64 {
        fnv1a64(self)
    }
}

impl<T: Mix + ?Sized> Mix for &T {
    #[inline]
    fn mix(&self) -> u64 {
        (**self).mix()
    }
}

macro_rules! impl_le_numeric {
    ($($t:ty => $width:expr, $read:expr;)*) => {$(
        impl LeNumeric for $t {
            const WIDTH: usize = $width;
            #[inline]
            fn read_le(buf: &[u8]) -> Self {
                $read(buf)
            }
        }
    )*};
}

impl_le_numeric! {
    u32 => 4, LittleEndian::read_u32;
    i32 => 4, LittleEndian::read_i32;
    u64 => 8, LittleEndian::read_u64;
    i64 => 8, LittleEndian::read_i64;
    f32 => 4, LittleEndian::read_f32;
    f64 => 8, LittleEndian::read_f64;
}
