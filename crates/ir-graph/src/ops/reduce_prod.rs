use half::f16;

use crate::ops::reduction::{numeric_reduction, Neutral};

numeric_reduction! {
    /// Product over the reduction axes.
    ReduceProd {
        type_name: "ReduceProd",
        version: 1,
        span: "op::v1::ReduceProd::evaluate",
        kernel: reduce_prod,
        types: [I32 => i32, I64 => i64, F16 => f16, F32 => f32],
        default: Some(Neutral::One),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_support::validated;
    use crate::node::TensorDesc;
    use crate::Op;
    use ir_tensor::{DType, Shape, Tensor};

    #[test]
    fn test_prod() {
        let op = validated(ReduceProd::new(false), &[2, 3], vec![1]);
        let input = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, -1.0, 0.5, 4.0], Shape::new(vec![2, 3]))
            .unwrap();
        let mut outputs = vec![Tensor::new(DType::F32)];
        assert!(op.evaluate(&mut outputs, &[&input]));
        assert_eq!(outputs[0].data_f32().unwrap(), &[6.0, -2.0]);
    }

    #[test]
    fn test_default_value_is_one() {
        let desc = TensorDesc::new(DType::I64, Shape::new(vec![3]));
        let value = ReduceProd::new(false).default_value(&desc).unwrap();
        assert_eq!(value.data::<i64>().unwrap(), &[1, 1, 1]);
    }
}
