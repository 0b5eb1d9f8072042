use half::f16;

use crate::ops::reduction::numeric_reduction;

numeric_reduction! {
    /// Arithmetic mean over the reduction axes. Integer inputs truncate.
    /// Has no default value; the mean of an empty float slice is NaN.
    ReduceMean {
        type_name: "ReduceMean",
        version: 1,
        span: "op::v1::ReduceMean::evaluate",
        kernel: reduce_mean,
        types: [I32 => i32, I64 => i64, F16 => f16, F32 => f32],
        default: None,
    }
}
