use half::{bf16, f16};

use crate::dtype::DType;
use crate::error::{Result, TensorError};

/// CPU-side tensor storage, one variant per element type.
#[derive(Debug, Clone, PartialEq)]
pub enum CpuStorage {
    Boolean(Vec<bool>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    BF16(Vec<bf16>),
    F16(Vec<f16>),
    F32(Vec<f32>),
}

impl CpuStorage {
    /// Number of elements in this storage.
    pub fn len(&self) -> usize {
        match self {
            CpuStorage::Boolean(v) => v.len(),
            CpuStorage::I32(v) => v.len(),
            CpuStorage::I64(v) => v.len(),
            CpuStorage::BF16(v) => v.len(),
            CpuStorage::F16(v) => v.len(),
            CpuStorage::F32(v) => v.len(),
        }
    }

    /// Returns true if the storage contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the dtype of this storage.
    pub fn dtype(&self) -> DType {
        match self {
            CpuStorage::Boolean(_) => DType::Boolean,
            CpuStorage::I32(_) => DType::I32,
            CpuStorage::I64(_) => DType::I64,
            CpuStorage::BF16(_) => DType::BF16,
            CpuStorage::F16(_) => DType::F16,
            CpuStorage::F32(_) => DType::F32,
        }
    }

    /// Create zero-filled storage for the given dtype and element count.
    pub fn zeros(dtype: DType, n: usize) -> Self {
        match dtype {
            DType::Boolean => CpuStorage::Boolean(vec![false; n]),
            DType::I32 => CpuStorage::I32(vec![0; n]),
            DType::I64 => CpuStorage::I64(vec![0; n]),
            DType::BF16 => CpuStorage::BF16(vec![bf16::ZERO; n]),
            DType::F16 => CpuStorage::F16(vec![f16::ZERO; n]),
            DType::F32 => CpuStorage::F32(vec![0.0; n]),
        }
    }

    /// Decode native-endian bytes into storage of `dtype`.
    ///
    /// Booleans are one byte each; any non-zero byte is `true`.
    ///
    /// # Errors
    /// Returns an error if `bytes` is not a whole number of elements.
    pub fn from_bytes(dtype: DType, bytes: &[u8]) -> Result<Self> {
        let size = dtype.size_in_bytes();
        if bytes.len() % size != 0 {
            return Err(TensorError::Other(format!(
                "{} bytes is not a multiple of the {} element size {}",
                bytes.len(),
                dtype,
                size
            )));
        }
        let chunks = bytes.chunks_exact(size);
        let storage = match dtype {
            DType::Boolean => CpuStorage::Boolean(bytes.iter().map(|&b| b != 0).collect()),
            DType::I32 => CpuStorage::I32(
                chunks
                    .map(|c| i32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            DType::I64 => CpuStorage::I64(
                chunks
                    .map(|c| {
                        i64::from_ne_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])
                    })
                    .collect(),
            ),
            DType::BF16 => {
                CpuStorage::BF16(chunks.map(|c| bf16::from_ne_bytes([c[0], c[1]])).collect())
            }
            DType::F16 => {
                CpuStorage::F16(chunks.map(|c| f16::from_ne_bytes([c[0], c[1]])).collect())
            }
            DType::F32 => CpuStorage::F32(
                chunks
                    .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
        };
        Ok(storage)
    }

    /// Encode the storage as native-endian bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            CpuStorage::Boolean(v) => v.iter().map(|&b| b as u8).collect(),
            CpuStorage::I32(v) => v.iter().flat_map(|x| x.to_ne_bytes()).collect(),
            CpuStorage::I64(v) => v.iter().flat_map(|x| x.to_ne_bytes()).collect(),
            CpuStorage::BF16(v) => v.iter().flat_map(|x| x.to_ne_bytes()).collect(),
            CpuStorage::F16(v) => v.iter().flat_map(|x| x.to_ne_bytes()).collect(),
            CpuStorage::F32(v) => v.iter().flat_map(|x| x.to_ne_bytes()).collect(),
        }
    }

    /// Read every element widened to `i64`.
    ///
    /// # Errors
    /// Returns an error for non-integral storage.
    pub fn to_i64_vec(&self) -> Result<Vec<i64>> {
        match self {
            CpuStorage::I32(v) => Ok(v.iter().map(|&x| x as i64).collect()),
            CpuStorage::I64(v) => Ok(v.clone()),
            other => Err(TensorError::UnsupportedDType(format!(
                "expected integral storage, got {}",
                other.dtype()
            ))),
        }
    }

    /// Read every element converted to `f32`.
    ///
    /// # Errors
    /// Returns an error for boolean storage.
    pub fn to_f32_vec(&self) -> Result<Vec<f32>> {
        match self {
            CpuStorage::I32(v) => Ok(v.iter().map(|&x| x as f32).collect()),
            CpuStorage::I64(v) => Ok(v.iter().map(|&x| x as f32).collect()),
            CpuStorage::BF16(v) => Ok(v.iter().map(|x| x.to_f32()).collect()),
            CpuStorage::F16(v) => Ok(v.iter().map(|x| x.to_f32()).collect()),
            CpuStorage::F32(v) => Ok(v.clone()),
            CpuStorage::Boolean(_) => Err(TensorError::UnsupportedDType(
                "boolean storage has no numeric value".to_string(),
            )),
        }
    }
}
