use crate::dtype::DType;
use crate::element::Element;
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::storage::CpuStorage;

/// A host tensor: element type, shape and a typed CPU buffer.
///
/// A tensor created with [`Tensor::new`] knows its element type but has no
/// shape yet. Kernels call [`Tensor::set_shape`] to size the buffer before
/// writing their result, so callers can hand over empty output tensors.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    storage: CpuStorage,
    shape: Option<Shape>,
    dtype: DType,
}

impl Tensor {
    /// Create an output tensor of `dtype` with no shape and no data.
    pub fn new(dtype: DType) -> Self {
        Tensor {
            storage: CpuStorage::zeros(dtype, 0),
            shape: None,
            dtype,
        }
    }

    /// Create a tensor from typed data and a shape.
    ///
    /// # Errors
    /// Returns an error if `data.len() != shape.numel()`.
    pub fn from_vec<T: Element>(data: Vec<T>, shape: Shape) -> Result<Self> {
        if data.len() != shape.numel() {
            return Err(TensorError::LengthMismatch {
                expected: shape.numel(),
                got: data.len(),
            });
        }
        Ok(Tensor {
            storage: T::into_storage(data),
            shape: Some(shape),
            dtype: T::DTYPE,
        })
    }

    /// Create a rank-0 tensor holding `value`.
    pub fn scalar<T: Element>(value: T) -> Self {
        Tensor {
            storage: T::into_storage(vec![value]),
            shape: Some(Shape::scalar()),
            dtype: T::DTYPE,
        }
    }

    /// Create a zero-filled tensor with the given dtype and shape.
    pub fn zeros(dtype: DType, shape: Shape) -> Self {
        Tensor {
            storage: CpuStorage::zeros(dtype, shape.numel()),
            shape: Some(shape),
            dtype,
        }
    }

    /// Create a tensor with every element set to `value`.
    pub fn filled<T: Element>(value: T, shape: Shape) -> Self {
        Tensor {
            storage: T::into_storage(vec![value; shape.numel()]),
            shape: Some(shape),
            dtype: T::DTYPE,
        }
    }

    /// Decode native-endian bytes into a tensor of `dtype` and `shape`.
    ///
    /// # Errors
    /// Returns an error if the byte count does not match the shape.
    pub fn from_bytes(dtype: DType, shape: Shape, bytes: &[u8]) -> Result<Self> {
        let expected = shape.numel() * dtype.size_in_bytes();
        if bytes.len() != expected {
            return Err(TensorError::LengthMismatch {
                expected,
                got: bytes.len(),
            });
        }
        Ok(Tensor {
            storage: CpuStorage::from_bytes(dtype, bytes)?,
            shape: Some(shape),
            dtype,
        })
    }

    /// Returns the tensor's shape, or `None` if it has not been set.
    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    /// Returns the tensor's shape.
    ///
    /// # Errors
    /// Returns [`TensorError::ShapeUnset`] for a tensor without a shape.
    pub fn static_shape(&self) -> Result<&Shape> {
        self.shape.as_ref().ok_or(TensorError::ShapeUnset)
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Number of elements currently held.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns true if the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Set the shape, reallocating a zero-filled buffer when the element
    /// count changes.
    pub fn set_shape(&mut self, shape: Shape) {
        if self.storage.len() != shape.numel() {
            self.storage = CpuStorage::zeros(self.dtype, shape.numel());
        }
        self.shape = Some(shape);
    }

    /// Borrow the data as a typed slice.
    ///
    /// # Errors
    /// Returns an error if `T` does not match the tensor's dtype.
    pub fn data<T: Element>(&self) -> Result<&[T]> {
        T::slice(&self.storage).ok_or(TensorError::DTypeMismatch {
            expected: T::DTYPE,
            got: self.dtype,
        })
    }

    /// Borrow the data as a mutable typed slice.
    ///
    /// # Errors
    /// Returns an error if `T` does not match the tensor's dtype.
    pub fn data_mut<T: Element>(&mut self) -> Result<&mut [T]> {
        let got = self.dtype;
        T::slice_mut(&mut self.storage).ok_or(TensorError::DTypeMismatch {
            expected: T::DTYPE,
            got,
        })
    }

    /// Returns the underlying data as an f32 slice.
    pub fn data_f32(&self) -> Result<&[f32]> {
        self.data::<f32>()
    }

    /// Returns the underlying storage reference.
    pub fn storage(&self) -> &CpuStorage {
        &self.storage
    }

    /// Native-endian bytes of the buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.storage.to_bytes()
    }

    /// Integral contents widened to `i64`.
    pub fn to_i64_vec(&self) -> Result<Vec<i64>> {
        self.storage.to_i64_vec()
    }

    /// Numeric contents converted to `f32`.
    pub fn to_f32_vec(&self) -> Result<Vec<f32>> {
        self.storage.to_f32_vec()
    }

    /// Read a single-element tensor as `i64`.
    ///
    /// # Errors
    /// Returns an error unless the tensor is integral and holds exactly one element.
    pub fn scalar_i64(&self) -> Result<i64> {
        match self.to_i64_vec()?.as_slice() {
            [v] => Ok(*v),
            other => Err(TensorError::LengthMismatch {
                expected: 1,
                got: other.len(),
            }),
        }
    }

    /// Read a single-element tensor as `f32`.
    ///
    /// # Errors
    /// Returns an error unless the tensor is numeric and holds exactly one element.
    pub fn scalar_f32(&self) -> Result<f32> {
        match self.to_f32_vec()?.as_slice() {
            [v] => Ok(*v),
            other => Err(TensorError::LengthMismatch {
                expected: 1,
                got: other.len(),
            }),
        }
    }
}
