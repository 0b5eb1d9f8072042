use half::f16;

use crate::ops::reduction::{numeric_reduction, Neutral};

numeric_reduction! {
    /// Sum over the reduction axes.
    ReduceSum {
        type_name: "ReduceSum",
        version: 1,
        span: "op::v1::ReduceSum::evaluate",
        kernel: reduce_sum,
        types: [I32 => i32, I64 => i64, F16 => f16, F32 => f32],
        default: Some(Neutral::Zero),
    }
}
