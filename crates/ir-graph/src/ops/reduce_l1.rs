use half::{bf16, f16};

use crate::ops::reduction::{numeric_reduction, Neutral};

numeric_reduction! {
    /// Sum of absolute values over the reduction axes.
    ReduceL1 {
        type_name: "ReduceL1",
        version: 4,
        span: "op::v4::ReduceL1::evaluate",
        kernel: reduce_l1,
        types: [I32 => i32, I64 => i64, BF16 => bf16, F16 => f16, F32 => f32],
        default: Some(Neutral::Zero),
    }
}
