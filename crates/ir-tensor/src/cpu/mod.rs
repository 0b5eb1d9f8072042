//! Portable reference kernels.
//!
//! Straightforward loops written for correctness rather than peak
//! performance. They define the numeric semantics every backend must match
//! and serve as the fallback when no backend claims an op.

pub mod nms;
pub mod reduce;

pub use nms::{non_max_suppression, BoxEncoding, NmsParams, SelectedBox};
pub use reduce::{
    reduce_l1, reduce_l2, reduce_logical_and, reduce_logical_or, reduce_max, reduce_mean,
    reduce_min, reduce_prod, reduce_sum,
};
