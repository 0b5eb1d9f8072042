use half::{bf16, f16};

use crate::ops::reduction::{numeric_reduction, Neutral};

numeric_reduction! {
    /// Euclidean norm over the reduction axes.
    ReduceL2 {
        type_name: "ReduceL2",
        version: 4,
        span: "op::v4::ReduceL2::evaluate",
        kernel: reduce_l2,
        types: [BF16 => bf16, F16 => f16, F32 => f32],
        default: Some(Neutral::Zero),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_support::validated;
    use crate::Op;
    use ir_tensor::{DType, Shape, Tensor};

    #[test]
    fn test_l2_rows() {
        let op = validated(ReduceL2::new(false), &[2, 2], vec![1]);
        let input = Tensor::from_vec(vec![3.0f32, 4.0, 5.0, 12.0], Shape::new(vec![2, 2])).unwrap();
        let mut outputs = vec![Tensor::new(DType::F32)];
        assert!(op.evaluate(&mut outputs, &[&input]));
        assert_eq!(outputs[0].data_f32().unwrap(), &[5.0, 13.0]);
    }

    #[test]
    fn test_integer_input_has_no_kernel() {
        let op = validated(ReduceL2::new(false), &[2, 2], vec![1]);
        let input = Tensor::from_vec(vec![3i32, 4, 5, 12], Shape::new(vec![2, 2])).unwrap();
        let mut outputs = vec![Tensor::new(DType::I32)];
        assert!(!op.evaluate(&mut outputs, &[&input]));
        assert!(outputs[0].shape().is_none());
    }
}
