use half::f16;

use crate::ops::reduction::{numeric_reduction, Neutral};

numeric_reduction! {
    /// Smallest element over the reduction axes.
    ReduceMin {
        type_name: "ReduceMin",
        version: 1,
        span: "op::v1::ReduceMin::evaluate",
        kernel: reduce_min,
        types: [I32 => i32, I64 => i64, F16 => f16, F32 => f32],
        default: Some(Neutral::Highest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_support::validated;
    use crate::Op;
    use ir_tensor::{DType, Shape, Tensor};

    #[test]
    fn test_min_negative_axis() {
        let op = validated(ReduceMin::new(true), &[2, 3], vec![-1]);
        let input = Tensor::from_vec(vec![1i64, 9, -3, 4, -9, 0], Shape::new(vec![2, 3])).unwrap();
        let mut outputs = vec![Tensor::new(DType::I64)];
        assert!(op.evaluate(&mut outputs, &[&input]));
        assert_eq!(outputs[0].shape(), Some(&Shape::new(vec![2, 1])));
        assert_eq!(outputs[0].data::<i64>().unwrap(), &[-3, -9]);
    }
}
