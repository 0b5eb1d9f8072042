//! `ir-tensor` - Host tensors and reference kernels for the graph IR.
//!
//! This crate provides:
//! - Element type definitions (boolean, i32, i64, bf16, f16, f32)
//! - `Shape` and `AxisSet` utilities
//! - A `Tensor` type backed by typed CPU storage
//! - `Element`/`Numeric` traits mapping Rust scalars to element types
//! - The portable reference kernel library (`cpu`)

pub mod axes;
pub mod cpu;
pub mod dtype;
pub mod element;
pub mod error;
pub mod shape;
pub mod storage;
pub mod tensor;

// Re-export primary types at the crate root for convenience.
pub use axes::AxisSet;
pub use dtype::DType;
pub use element::{Element, Numeric};
pub use error::{Result, TensorError};
pub use half::{bf16, f16};
pub use shape::Shape;
pub use storage::CpuStorage;
pub use tensor::Tensor;
