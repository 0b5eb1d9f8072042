use half::f16;

use crate::ops::reduction::{numeric_reduction, Neutral};

numeric_reduction! {
    /// Largest element over the reduction axes.
    ReduceMax {
        type_name: "ReduceMax",
        version: 1,
        span: "op::v1::ReduceMax::evaluate",
        kernel: reduce_max,
        types: [I32 => i32, I64 => i64, F16 => f16, F32 => f32],
        default: Some(Neutral::Lowest),
    }
}
