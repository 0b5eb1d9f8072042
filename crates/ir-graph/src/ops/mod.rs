//! Op implementations.
//!
//! Each op carries a `TYPE_INFO` constant, a static kernel table for the
//! element types it evaluates, and its inline tests.

pub mod constant;
pub mod non_max_suppression;
pub mod parameter;
pub mod reduce_l1;
pub mod reduce_l2;
pub mod reduce_logical;
pub mod reduce_max;
pub mod reduce_mean;
pub mod reduce_min;
pub mod reduce_prod;
pub mod reduce_sum;
pub mod reduction;

pub use constant::Constant;
pub use non_max_suppression::NonMaxSuppression;
pub use parameter::Parameter;
pub use reduce_l1::ReduceL1;
pub use reduce_l2::ReduceL2;
pub use reduce_logical::{ReduceLogicalAnd, ReduceLogicalOr};
pub use reduce_max::ReduceMax;
pub use reduce_mean::ReduceMean;
pub use reduce_min::ReduceMin;
pub use reduce_prod::ReduceProd;
pub use reduce_sum::ReduceSum;
pub use reduction::{ReduceKernel, ReductionKeepDims};
