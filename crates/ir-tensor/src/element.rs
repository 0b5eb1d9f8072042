//! Compile-time mapping between Rust scalar types and [`DType`].
//!
//! Kernels are written once, generic over [`Numeric`], and instantiated per
//! element type by the op that dispatches to them.

use std::fmt::Debug;

use half::{bf16, f16};

use crate::dtype::DType;
use crate::storage::CpuStorage;

/// A scalar type that can live in a [`CpuStorage`].
pub trait Element: Copy + Debug + PartialEq + PartialOrd + Send + Sync + 'static {
    /// The element type tag for this scalar.
    const DTYPE: DType;

    /// Wrap a vector in the matching storage variant.
    fn into_storage(data: Vec<Self>) -> CpuStorage;

    /// Borrow the storage as a typed slice, or `None` on a dtype mismatch.
    fn slice(storage: &CpuStorage) -> Option<&[Self]>;

    /// Borrow the storage as a mutable typed slice, or `None` on a dtype mismatch.
    fn slice_mut(storage: &mut CpuStorage) -> Option<&mut [Self]>;
}

/// Arithmetic needed by the reference kernels.
///
/// Integer operations wrap on overflow. Half-precision operations round back
/// to the element type after every step.
pub trait Numeric: Element {
    fn zero() -> Self;
    fn one() -> Self;
    /// Smallest representable value (`-inf` for floats).
    fn lowest() -> Self;
    /// Largest representable value (`+inf` for floats).
    fn highest() -> Self;
    fn abs(self) -> Self;
    fn add(self, other: Self) -> Self;
    fn mul(self, other: Self) -> Self;
    fn sqrt(self) -> Self;
    /// Divide by an element count; integer types truncate.
    fn div_count(self, count: usize) -> Self;
    fn to_f32(self) -> f32;
    fn from_f32(value: f32) -> Self;
    fn from_i64(value: i64) -> Self;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const DTYPE: DType = DType::$variant;

            fn into_storage(data: Vec<Self>) -> CpuStorage {
                CpuStorage::$variant(data)
            }

            fn slice(storage: &CpuStorage) -> Option<&[Self]> {
                match storage {
                    CpuStorage::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn slice_mut(storage: &mut CpuStorage) -> Option<&mut [Self]> {
                match storage {
                    CpuStorage::$variant(v) => Some(v.as_mut_slice()),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(bool, Boolean);
impl_element!(i32, I32);
impl_element!(i64, I64);
impl_element!(bf16, BF16);
impl_element!(f16, F16);
impl_element!(f32, F32);

impl Numeric for i32 {
    fn zero() -> Self {
        0
    }
    fn one() -> Self {
        1
    }
    fn lowest() -> Self {
        i32::MIN
    }
    fn highest() -> Self {
        i32::MAX
    }
    fn abs(self) -> Self {
        self.wrapping_abs()
    }
    fn add(self, other: Self) -> Self {
        self.wrapping_add(other)
    }
    fn mul(self, other: Self) -> Self {
        self.wrapping_mul(other)
    }
    fn sqrt(self) -> Self {
        (self as f64).sqrt() as i32
    }
    fn div_count(self, count: usize) -> Self {
        if count == 0 {
            return self;
        }
        (self as i64 / count as i64) as i32
    }
    fn to_f32(self) -> f32 {
        self as f32
    }
    fn from_f32(value: f32) -> Self {
        value as i32
    }
    fn from_i64(value: i64) -> Self {
        value as i32
    }
}

impl Numeric for i64 {
    fn zero() -> Self {
        0
    }
    fn one() -> Self {
        1
    }
    fn lowest() -> Self {
        i64::MIN
    }
    fn highest() -> Self {
        i64::MAX
    }
    fn abs(self) -> Self {
        self.wrapping_abs()
    }
    fn add(self, other: Self) -> Self {
        self.wrapping_add(other)
    }
    fn mul(self, other: Self) -> Self {
        self.wrapping_mul(other)
    }
    fn sqrt(self) -> Self {
        (self as f64).sqrt() as i64
    }
    fn div_count(self, count: usize) -> Self {
        if count == 0 {
            return self;
        }
        self / count as i64
    }
    fn to_f32(self) -> f32 {
        self as f32
    }
    fn from_f32(value: f32) -> Self {
        value as i64
    }
    fn from_i64(value: i64) -> Self {
        value
    }
}

impl Numeric for f32 {
    fn zero() -> Self {
        0.0
    }
    fn one() -> Self {
        1.0
    }
    fn lowest() -> Self {
        f32::NEG_INFINITY
    }
    fn highest() -> Self {
        f32::INFINITY
    }
    fn abs(self) -> Self {
        f32::abs(self)
    }
    fn add(self, other: Self) -> Self {
        self + other
    }
    fn mul(self, other: Self) -> Self {
        self * other
    }
    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }
    fn div_count(self, count: usize) -> Self {
        self / count as f32
    }
    fn to_f32(self) -> f32 {
        self
    }
    fn from_f32(value: f32) -> Self {
        value
    }
    fn from_i64(value: i64) -> Self {
        value as f32
    }
}

// Half types compute in f32 and round after every operation.
macro_rules! impl_half_numeric {
    ($ty:ty) => {
        impl Numeric for $ty {
            fn zero() -> Self {
                <$ty>::ZERO
            }
            fn one() -> Self {
                <$ty>::ONE
            }
            fn lowest() -> Self {
                <$ty>::NEG_INFINITY
            }
            fn highest() -> Self {
                <$ty>::INFINITY
            }
            fn abs(self) -> Self {
                <$ty>::from_f32(self.to_f32().abs())
            }
            fn add(self, other: Self) -> Self {
                <$ty>::from_f32(self.to_f32() + other.to_f32())
            }
            fn mul(self, other: Self) -> Self {
                <$ty>::from_f32(self.to_f32() * other.to_f32())
            }
            fn sqrt(self) -> Self {
                <$ty>::from_f32(self.to_f32().sqrt())
            }
            fn div_count(self, count: usize) -> Self {
                <$ty>::from_f32(self.to_f32() / count as f32)
            }
            fn to_f32(self) -> f32 {
                <$ty>::to_f32(self)
            }
            fn from_f32(value: f32) -> Self {
                <$ty>::from_f32(value)
            }
            fn from_i64(value: i64) -> Self {
                <$ty>::from_f32(value as f32)
            }
        }
    };
}

impl_half_numeric!(bf16);
impl_half_numeric!(f16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_constants() {
        assert_eq!(<bool as Element>::DTYPE, DType::Boolean);
        assert_eq!(<i32 as Element>::DTYPE, DType::I32);
        assert_eq!(<bf16 as Element>::DTYPE, DType::BF16);
        assert_eq!(<f32 as Element>::DTYPE, DType::F32);
    }

    #[test]
    fn test_slice_matches_variant() {
        let mut storage = i64::into_storage(vec![1, 2, 3]);
        assert_eq!(i64::slice(&storage), Some(&[1i64, 2, 3][..]));
        assert!(i32::slice(&storage).is_none());
        i64::slice_mut(&mut storage).unwrap()[0] = 9;
        assert_eq!(storage, CpuStorage::I64(vec![9, 2, 3]));
    }

    #[test]
    fn test_integer_wraps() {
        assert_eq!(Numeric::add(i32::MAX, 1), i32::MIN);
        assert_eq!(Numeric::abs(i32::MIN), i32::MIN);
        assert_eq!(7i32.div_count(2), 3);
        assert_eq!((-7i64).div_count(2), -3);
    }

    #[test]
    fn test_half_rounds_each_step() {
        // 2048 + 1 is not representable in f16 and rounds back to 2048.
        let big = f16::from_f32(2048.0);
        assert_eq!(Numeric::add(big, f16::ONE), big);
        assert_eq!(Numeric::abs(f16::from_f32(-1.5)), f16::from_f32(1.5));
        assert_eq!(Numeric::sqrt(bf16::from_f32(4.0)), bf16::from_f32(2.0));
    }

    #[test]
    fn test_bounds() {
        assert_eq!(<f32 as Numeric>::lowest(), f32::NEG_INFINITY);
        assert_eq!(<i64 as Numeric>::highest(), i64::MAX);
        assert_eq!(<f16 as Numeric>::one().to_f32(), 1.0);
    }
}
