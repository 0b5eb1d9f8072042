use std::fmt;

/// Element types a tensor buffer can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DType {
    /// Boolean, one byte per element.
    Boolean,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// Brain floating point (8-bit exponent, 7-bit mantissa, via `half::bf16`).
    BF16,
    /// 16-bit floating point (IEEE 754 half-precision, via `half::f16`).
    F16,
    /// 32-bit floating point.
    F32,
}

impl DType {
    /// Every element type, in tag order.
    pub const ALL: [DType; 6] = [
        DType::Boolean,
        DType::I32,
        DType::I64,
        DType::BF16,
        DType::F16,
        DType::F32,
    ];

    /// Returns the size in bytes of a single element.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::Boolean => 1,
            DType::I32 => 4,
            DType::I64 => 8,
            DType::BF16 | DType::F16 => 2,
            DType::F32 => 4,
        }
    }

    /// Converts a stable numeric tag to a `DType`.
    ///
    /// Tags:
    /// - 0 => boolean
    /// - 1 => i32
    /// - 2 => i64
    /// - 3 => bf16
    /// - 4 => f16
    /// - 5 => f32
    pub fn from_tag(tag: u32) -> Option<DType> {
        match tag {
            0 => Some(DType::Boolean),
            1 => Some(DType::I32),
            2 => Some(DType::I64),
            3 => Some(DType::BF16),
            4 => Some(DType::F16),
            5 => Some(DType::F32),
            _ => None,
        }
    }

    /// Returns the numeric tag for this `DType`.
    pub fn to_tag(&self) -> u32 {
        match self {
            DType::Boolean => 0,
            DType::I32 => 1,
            DType::I64 => 2,
            DType::BF16 => 3,
            DType::F16 => 4,
            DType::F32 => 5,
        }
    }

    /// Returns true for floating point types.
    pub fn is_real(&self) -> bool {
        matches!(self, DType::BF16 | DType::F16 | DType::F32)
    }

    /// Returns true for integer types.
    pub fn is_integral(&self) -> bool {
        matches!(self, DType::I32 | DType::I64)
    }

    /// Returns true for every type that supports arithmetic.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, DType::Boolean)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Boolean => write!(f, "boolean"),
            DType::I32 => write!(f, "i32"),
            DType::I64 => write!(f, "i64"),
            DType::BF16 => write!(f, "bf16"),
            DType::F16 => write!(f, "f16"),
            DType::F32 => write!(f, "f32"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_in_bytes() {
        assert_eq!(DType::Boolean.size_in_bytes(), 1);
        assert_eq!(DType::I32.size_in_bytes(), 4);
        assert_eq!(DType::I64.size_in_bytes(), 8);
        assert_eq!(DType::BF16.size_in_bytes(), 2);
        assert_eq!(DType::F16.size_in_bytes(), 2);
        assert_eq!(DType::F32.size_in_bytes(), 4);
    }

    #[test]
    fn test_tag_roundtrip() {
        for dtype in DType::ALL {
            assert_eq!(DType::from_tag(dtype.to_tag()), Some(dtype));
        }
    }

    #[test]
    fn test_tag_unknown() {
        assert!(DType::from_tag(999).is_none());
    }

    #[test]
    fn test_classification() {
        assert!(DType::F16.is_real());
        assert!(!DType::I64.is_real());
        assert!(DType::I64.is_integral());
        assert!(!DType::Boolean.is_numeric());
        assert!(DType::BF16.is_numeric());
    }
}
